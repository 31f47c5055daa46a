//! Finality oracle: the commit gate for record transitions
//!
//! The oracle decides whether a candidate transition becomes the durable
//! current version. It enforces version discipline only: no prior version
//! for creations, compare-and-set on the consumed version otherwise, and
//! uniqueness of trade bindings. Business invariants are validated upstream,
//! before submission.
//!
//! Implementations may be a real distributed-ledger client, the single-node
//! transactional store provided here, or a mock in unit tests.

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::{CandidateTransition, CommittedTransition, RecordKind},
};
use std::sync::Arc;

/// Commit gate for candidate transitions
///
/// `submit` either durably commits the candidate and returns the committed
/// transition, or rejects it leaving the prior version current. There are no
/// partial commits.
pub trait FinalityOracle: Send + Sync {
    /// Submit a candidate transition for final commitment
    fn submit(&self, candidate: CandidateTransition) -> Result<CommittedTransition>;
}

/// Single-node transactional oracle backed by local storage
///
/// Safe only behind a single writer: the store actor serializes all submits,
/// which is what makes check-then-write here a true compare-and-set.
pub struct LocalOracle {
    storage: Arc<Storage>,
}

impl LocalOracle {
    /// Create an oracle over the given storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl FinalityOracle for LocalOracle {
    fn submit(&self, candidate: CandidateTransition) -> Result<CommittedTransition> {
        match candidate {
            CandidateTransition::Dcr { input, output, .. } => {
                let linear_id = output.linear_id;

                match input {
                    None => {
                        if self
                            .storage
                            .current_version(RecordKind::Dcr, &linear_id)?
                            .is_some()
                        {
                            return Err(Error::Rejected(format!(
                                "Record {} already exists",
                                linear_id
                            )));
                        }
                        if output.version != 1 {
                            return Err(Error::Rejected(
                                "A creation must commit version one".to_string(),
                            ));
                        }

                        self.check_trade_binding(
                            RecordKind::Dcr,
                            output.trade_id.as_ref(),
                            &output,
                        )?;

                        self.storage.commit_dcr(&output)?;
                        Ok(CommittedTransition::Dcr {
                            record: output,
                            superseded: None,
                        })
                    }
                    Some(prev) => {
                        if prev.linear_id != linear_id {
                            return Err(Error::Rejected(
                                "Linear ID must be preserved across versions".to_string(),
                            ));
                        }

                        let actual = self
                            .storage
                            .current_version(RecordKind::Dcr, &linear_id)?
                            .ok_or_else(|| {
                                Error::RecordNotFound(format!("DCR {}", linear_id))
                            })?;

                        if actual != prev.version {
                            return Err(Error::VersionConflict {
                                linear_id,
                                expected: prev.version,
                                actual,
                            });
                        }
                        if output.version != prev.version + 1 {
                            return Err(Error::Rejected(
                                "Version must increment by exactly one".to_string(),
                            ));
                        }

                        self.check_trade_binding(
                            RecordKind::Dcr,
                            output.trade_id.as_ref(),
                            &output,
                        )?;

                        self.storage.commit_dcr(&output)?;
                        Ok(CommittedTransition::Dcr {
                            record: output,
                            superseded: Some(prev.version),
                        })
                    }
                }
            }
            CandidateTransition::Xvp { input, output, .. } => {
                let linear_id = output.linear_id;

                match input {
                    None => {
                        if self
                            .storage
                            .current_version(RecordKind::Xvp, &linear_id)?
                            .is_some()
                        {
                            return Err(Error::Rejected(format!(
                                "Record {} already exists",
                                linear_id
                            )));
                        }
                        if output.version != 1 {
                            return Err(Error::Rejected(
                                "A creation must commit version one".to_string(),
                            ));
                        }

                        if let Some(existing) = self
                            .storage
                            .trade_binding(RecordKind::Xvp, &output.trade_id)?
                        {
                            if existing != linear_id {
                                return Err(Error::Rejected(format!(
                                    "Trade {} is already backed by another record",
                                    output.trade_id
                                )));
                            }
                        }

                        self.storage.commit_xvp(&output)?;
                        Ok(CommittedTransition::Xvp {
                            record: output,
                            superseded: None,
                        })
                    }
                    Some(prev) => {
                        if prev.linear_id != linear_id {
                            return Err(Error::Rejected(
                                "Linear ID must be preserved across versions".to_string(),
                            ));
                        }

                        let actual = self
                            .storage
                            .current_version(RecordKind::Xvp, &linear_id)?
                            .ok_or_else(|| {
                                Error::RecordNotFound(format!("XVP {}", linear_id))
                            })?;

                        if actual != prev.version {
                            return Err(Error::VersionConflict {
                                linear_id,
                                expected: prev.version,
                                actual,
                            });
                        }
                        if output.version != prev.version + 1 {
                            return Err(Error::Rejected(
                                "Version must increment by exactly one".to_string(),
                            ));
                        }

                        self.storage.commit_xvp(&output)?;
                        Ok(CommittedTransition::Xvp {
                            record: output,
                            superseded: Some(prev.version),
                        })
                    }
                }
            }
        }
    }
}

impl LocalOracle {
    /// A trade may back at most one reservation; re-binding a trade to a
    /// different record is rejected at commit time.
    fn check_trade_binding(
        &self,
        kind: RecordKind,
        trade_id: Option<&crate::types::TradeId>,
        output: &crate::types::DcrRecord,
    ) -> Result<()> {
        if let Some(trade_id) = trade_id {
            if let Some(existing) = self.storage.trade_binding(kind, trade_id)? {
                if existing != output.linear_id {
                    return Err(Error::Rejected(format!(
                        "Trade {} is already backed by another record",
                        trade_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, DcrRecord, DcrStatus, LinearId, PartyId, TradeId};
    use crate::Config;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn test_oracle() -> (LocalOracle, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let storage = Arc::new(Storage::open(&config).unwrap());
        (LocalOracle::new(storage), temp_dir)
    }

    fn test_dcr() -> DcrRecord {
        DcrRecord {
            linear_id: LinearId::generate(),
            version: 1,
            owner: PartyId::new("BankA"),
            issuer: PartyId::new("CentralBank"),
            value: Decimal::new(500, 2),
            currency: Currency::GBP,
            trade_id: None,
            proof: None,
            status: DcrStatus::Available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn signers() -> BTreeSet<PartyId> {
        [PartyId::new("BankA"), PartyId::new("CentralBank")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_create_commits_version_one() {
        let (oracle, _temp) = test_oracle();
        let record = test_dcr();

        let committed = oracle
            .submit(CandidateTransition::Dcr {
                input: None,
                output: record.clone(),
                signers: signers(),
            })
            .unwrap();

        match committed {
            CommittedTransition::Dcr { record: r, superseded } => {
                assert_eq!(r.version, 1);
                assert!(superseded.is_none());
            }
            _ => panic!("expected DCR commit"),
        }
    }

    #[test]
    fn test_double_create_rejected() {
        let (oracle, _temp) = test_oracle();
        let record = test_dcr();

        oracle
            .submit(CandidateTransition::Dcr {
                input: None,
                output: record.clone(),
                signers: signers(),
            })
            .unwrap();

        let result = oracle.submit(CandidateTransition::Dcr {
            input: None,
            output: record,
            signers: signers(),
        });
        assert!(matches!(result, Err(Error::Rejected(_))));
    }

    #[test]
    fn test_stale_input_is_version_conflict() {
        let (oracle, _temp) = test_oracle();
        let v1 = test_dcr();

        oracle
            .submit(CandidateTransition::Dcr {
                input: None,
                output: v1.clone(),
                signers: signers(),
            })
            .unwrap();

        let mut earmark_a = v1.supersede();
        earmark_a.status = DcrStatus::Earmarked;
        earmark_a.trade_id = Some(TradeId::new("123"));

        oracle
            .submit(CandidateTransition::Dcr {
                input: Some(v1.clone()),
                output: earmark_a,
                signers: signers(),
            })
            .unwrap();

        // A second earmark still consuming version 1 loses the race
        let mut earmark_b = v1.supersede();
        earmark_b.status = DcrStatus::Earmarked;
        earmark_b.trade_id = Some(TradeId::new("999"));

        let result = oracle.submit(CandidateTransition::Dcr {
            input: Some(v1),
            output: earmark_b,
            signers: signers(),
        });
        assert!(matches!(
            result,
            Err(Error::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_trade_rebinding_rejected() {
        let (oracle, _temp) = test_oracle();

        let mut first = test_dcr();
        first.trade_id = Some(TradeId::new("shared-trade"));
        oracle
            .submit(CandidateTransition::Dcr {
                input: None,
                output: first,
                signers: signers(),
            })
            .unwrap();

        // A different record claiming the same trade is rejected
        let mut second = test_dcr();
        second.trade_id = Some(TradeId::new("shared-trade"));
        let result = oracle.submit(CandidateTransition::Dcr {
            input: None,
            output: second,
            signers: signers(),
        });
        assert!(matches!(result, Err(Error::Rejected(_))));
    }

    #[test]
    fn test_version_skip_rejected() {
        let (oracle, _temp) = test_oracle();
        let v1 = test_dcr();

        oracle
            .submit(CandidateTransition::Dcr {
                input: None,
                output: v1.clone(),
                signers: signers(),
            })
            .unwrap();

        let mut skipped = v1.supersede();
        skipped.version = 5;
        skipped.status = DcrStatus::Earmarked;
        skipped.trade_id = Some(TradeId::new("123"));

        let result = oracle.submit(CandidateTransition::Dcr {
            input: Some(v1),
            output: skipped,
            signers: signers(),
        });
        assert!(matches!(result, Err(Error::Rejected(_))));
    }
}
