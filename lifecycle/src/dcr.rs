//! DCR lifecycle manager
//!
//! Owns every mutation of reservation records. The state machine is
//! AVAILABLE -> EARMARKED -> {CONFIRMED | CANCELLED}; earmark is the lock
//! step of the cross-ledger protocol, and confirm/cancel are compare-and-set
//! against the current EARMARKED version. No operation holds a lock across a
//! network round trip: proof verification happens locally before the commit
//! is submitted.

use crate::{policy::SignerPolicy, validator, Config, Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use crossnet::{DcrStatusReport, NetRequest, NetResponse, ReportedDcrStatus, RequestHandler};
use record_store::{
    crypto::{attestation_digest, AttestorRegistry},
    Attestation, CandidateTransition, CommittedTransition, Currency, DcrRecord, DcrStatus,
    LinearId, PartyId, RecordStore, Signature, TradeId,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Manager for reservation records
pub struct DcrManager {
    store: Arc<RecordStore>,
    attestors: Arc<AttestorRegistry>,
    policy: Arc<dyn SignerPolicy>,
    config: Config,
}

impl DcrManager {
    /// Create new manager
    pub fn new(
        store: Arc<RecordStore>,
        attestors: Arc<AttestorRegistry>,
        policy: Arc<dyn SignerPolicy>,
        config: Config,
    ) -> Self {
        Self {
            store,
            attestors,
            policy,
            config,
        }
    }

    /// Create a reservation in the AVAILABLE state
    ///
    /// Requires counter-signature from both owner and issuer; the record is
    /// final only once the oracle commits it.
    pub async fn create(
        &self,
        owner: PartyId,
        issuer: PartyId,
        value: Decimal,
        currency: Currency,
        trade_id: Option<TradeId>,
        signers: &BTreeSet<PartyId>,
    ) -> Result<DcrRecord> {
        let now = Utc::now();
        let output = DcrRecord {
            linear_id: LinearId::generate(),
            version: 1,
            owner,
            issuer,
            value,
            currency,
            trade_id,
            proof: None,
            status: DcrStatus::Available,
            created_at: now,
            updated_at: now,
        };

        let candidate = CandidateTransition::Dcr {
            input: None,
            output,
            signers: signers.clone(),
        };
        validator::validate(
            &candidate,
            self.policy.as_ref(),
            self.config.allow_single_party_trades,
        )?;

        let record = self.commit_dcr(candidate).await?;
        tracing::info!(
            linear_id = %record.linear_id,
            owner = %record.owner,
            issuer = %record.issuer,
            value = %record.value,
            "Reservation created"
        );
        Ok(record)
    }

    /// Lock an AVAILABLE reservation against a trade
    ///
    /// This is the lock step of the atomic protocol: only one concurrent
    /// caller can win the compare-and-set on the current version, so a
    /// reservation can never back two trades.
    pub async fn earmark(
        &self,
        linear_id: &LinearId,
        party: &PartyId,
        trade_id: TradeId,
    ) -> Result<DcrRecord> {
        let current = self.store.current_dcr(linear_id)?;

        match current.status {
            DcrStatus::Available => {}
            DcrStatus::Earmarked => {
                return Err(Error::Conflict(format!(
                    "Reservation {} is already earmarked",
                    linear_id
                )));
            }
            status => {
                return Err(Error::AlreadyFinal(format!(
                    "Reservation {} is already {}",
                    linear_id, status
                )));
            }
        }

        let mut output = current.supersede();
        output.status = DcrStatus::Earmarked;
        output.trade_id = Some(trade_id.clone());

        let candidate = CandidateTransition::Dcr {
            input: Some(current),
            output,
            signers: [party.clone()].into_iter().collect(),
        };
        validator::validate(
            &candidate,
            self.policy.as_ref(),
            self.config.allow_single_party_trades,
        )?;

        let record = self.commit_dcr(candidate).await?;
        tracing::info!(
            linear_id = %record.linear_id,
            trade_id = %trade_id,
            "Reservation earmarked"
        );
        Ok(record)
    }

    /// Settle an EARMARKED reservation against a counterpart attestation
    ///
    /// The proof must verify against the key registered for
    /// `source_system_id`; on a bad proof the record stays EARMARKED and the
    /// call is retryable once a valid proof is obtainable.
    pub async fn confirm(
        &self,
        trade_id: &TradeId,
        system_id: &str,
        source_system_id: &str,
        encoded_info: &str,
        signature: Signature,
    ) -> Result<DcrRecord> {
        if system_id != self.config.system_id {
            return Err(Error::Misrouted(format!(
                "Request addressed to {}, this is {}",
                system_id, self.config.system_id
            )));
        }

        let current = self.current_earmarked(trade_id)?;

        let digest = attestation_digest(trade_id.as_str(), encoded_info);
        self.attestors
            .verify(source_system_id, &digest, &signature)
            .map_err(|e| Error::Proof(e.to_string()))?;

        let mut output = current.supersede();
        output.status = DcrStatus::Confirmed;
        output.proof = Some(Attestation {
            attestor: source_system_id.to_string(),
            digest,
            signature,
        });

        let issuer = current.issuer.clone();
        let candidate = CandidateTransition::Dcr {
            input: Some(current),
            output,
            signers: [issuer].into_iter().collect(),
        };
        validator::validate(
            &candidate,
            self.policy.as_ref(),
            self.config.allow_single_party_trades,
        )?;

        let record = self.commit_dcr(candidate).await?;
        tracing::info!(
            linear_id = %record.linear_id,
            trade_id = %trade_id,
            attestor = source_system_id,
            "Reservation confirmed"
        );
        Ok(record)
    }

    /// Release an EARMARKED reservation
    ///
    /// Rejected once the reservation is CONFIRMED: cancellation after
    /// settlement would let a party renege.
    pub async fn cancel(
        &self,
        trade_id: &TradeId,
        encoded_info: &str,
        signature: Signature,
    ) -> Result<DcrRecord> {
        let current = self.current_earmarked(trade_id)?;

        // The release proof is recorded as submitted, attributed to the
        // issuer. Byte verification of release signatures belongs to the
        // finality layer.
        let mut output = current.supersede();
        output.status = DcrStatus::Cancelled;
        output.proof = Some(Attestation {
            attestor: current.issuer.to_string(),
            digest: attestation_digest(trade_id.as_str(), encoded_info),
            signature,
        });

        let issuer = current.issuer.clone();
        let candidate = CandidateTransition::Dcr {
            input: Some(current),
            output,
            signers: [issuer].into_iter().collect(),
        };
        validator::validate(
            &candidate,
            self.policy.as_ref(),
            self.config.allow_single_party_trades,
        )?;

        let record = self.commit_dcr(candidate).await?;
        tracing::info!(
            linear_id = %record.linear_id,
            trade_id = %trade_id,
            "Reservation cancelled"
        );
        Ok(record)
    }

    /// Current reservation for a trade, which must be EARMARKED
    fn current_earmarked(&self, trade_id: &TradeId) -> Result<DcrRecord> {
        let current = self.store.dcr_by_trade(trade_id)?;

        match current.status {
            DcrStatus::Earmarked => {}
            DcrStatus::Confirmed => {
                return Err(Error::AlreadyFinal(format!(
                    "Reservation for trade {} is already confirmed",
                    trade_id
                )));
            }
            DcrStatus::Cancelled => {
                return Err(Error::AlreadyFinal(format!(
                    "Reservation for trade {} is already cancelled",
                    trade_id
                )));
            }
            DcrStatus::Available => {
                return Err(Error::Conflict(format!(
                    "Reservation for trade {} is not earmarked",
                    trade_id
                )));
            }
        }

        // The index guarantees this, but a mismatch here would mean a
        // corrupted binding; fail loudly rather than settle the wrong trade.
        if current.trade_id.as_ref() != Some(trade_id) {
            return Err(Error::TradeMismatch(format!(
                "Reservation {} is bound to {:?}, not {}",
                current.linear_id, current.trade_id, trade_id
            )));
        }

        Ok(current)
    }

    async fn commit_dcr(&self, candidate: CandidateTransition) -> Result<DcrRecord> {
        match self.store.submit(candidate).await? {
            CommittedTransition::Dcr { record, .. } => Ok(record),
            CommittedTransition::Xvp { .. } => {
                Err(Error::Internal("Oracle committed the wrong record kind".to_string()))
            }
        }
    }
}

/// Serves reservation status to counterpart ledgers
///
/// The report derives from the current committed version only; an absent
/// binding is reported as such, never guessed.
pub struct DcrStatusService {
    store: Arc<RecordStore>,
}

impl DcrStatusService {
    /// Create new service over a store
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler for DcrStatusService {
    async fn handle(&self, request: NetRequest) -> crossnet::Result<NetResponse> {
        let NetRequest::DcrStatus { trade_id } = request;

        let status = match self.store.dcr_by_trade(&TradeId::new(trade_id.clone())) {
            Ok(record) => Some(report_status(record.status)),
            Err(record_store::Error::RecordNotFound(_)) => None,
            Err(e) => return Err(crossnet::Error::Transport(e.to_string())),
        };

        Ok(NetResponse::DcrStatus(DcrStatusReport { trade_id, status }))
    }
}

fn report_status(status: DcrStatus) -> ReportedDcrStatus {
    match status {
        DcrStatus::Available => ReportedDcrStatus::Available,
        DcrStatus::Earmarked => ReportedDcrStatus::Earmarked,
        DcrStatus::Confirmed => ReportedDcrStatus::Confirmed,
        DcrStatus::Cancelled => ReportedDcrStatus::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DefaultSignerPolicy;
    use crate::validator::Violation;
    use record_store::crypto::KeyPair;

    async fn test_manager() -> (DcrManager, Arc<RecordStore>, KeyPair, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store_config = record_store::Config::default();
        store_config.data_dir = temp_dir.path().to_path_buf();
        let store = Arc::new(RecordStore::open(store_config).await.unwrap());

        let keypair = KeyPair::generate();
        let attestors = Arc::new(AttestorRegistry::new());
        attestors.register("ledger-b", keypair.public_key()).unwrap();

        let manager = DcrManager::new(
            store.clone(),
            attestors,
            Arc::new(DefaultSignerPolicy),
            Config::default(),
        );
        (manager, store, keypair, temp_dir)
    }

    fn both_signers() -> BTreeSet<PartyId> {
        [PartyId::new("BankA"), PartyId::new("CentralBank")]
            .into_iter()
            .collect()
    }

    async fn create_available(manager: &DcrManager) -> DcrRecord {
        manager
            .create(
                PartyId::new("BankA"),
                PartyId::new("CentralBank"),
                Decimal::ONE,
                Currency::GBP,
                None,
                &both_signers(),
            )
            .await
            .unwrap()
    }

    fn sign_confirmation(keypair: &KeyPair, trade_id: &str, encoded_info: &str) -> Signature {
        keypair.sign(&attestation_digest(trade_id, encoded_info))
    }

    #[tokio::test]
    async fn test_create_rejects_negative_value() {
        let (manager, _store, _keypair, _temp) = test_manager().await;

        let result = manager
            .create(
                PartyId::new("BankA"),
                PartyId::new("CentralBank"),
                Decimal::NEGATIVE_ONE,
                Currency::GBP,
                None,
                &both_signers(),
            )
            .await;

        match result {
            Err(Error::Validation(v)) => {
                assert_eq!(v.to_string(), "value must be non-negative")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_owner_as_issuer() {
        let (manager, _store, _keypair, _temp) = test_manager().await;

        let result = manager
            .create(
                PartyId::new("BankA"),
                PartyId::new("BankA"),
                Decimal::ONE,
                Currency::GBP,
                None,
                &both_signers(),
            )
            .await;

        match result {
            Err(Error::Validation(v)) => assert_eq!(
                v.to_string(),
                "owner and issuer cannot be the same entity"
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_requires_both_signatures() {
        let (manager, _store, _keypair, _temp) = test_manager().await;
        let only_owner: BTreeSet<PartyId> = [PartyId::new("BankA")].into_iter().collect();

        let result = manager
            .create(
                PartyId::new("BankA"),
                PartyId::new("CentralBank"),
                Decimal::ONE,
                Currency::GBP,
                None,
                &only_owner,
            )
            .await;

        match result {
            Err(Error::Validation(v)) => {
                assert_eq!(v.to_string(), "all participants must be signers")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_accepted_is_available() {
        let (manager, _store, _keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;

        assert_eq!(record.status, DcrStatus::Available);
        assert_eq!(record.version, 1);
        assert!(record.proof.is_none());
    }

    #[tokio::test]
    async fn test_earmark_then_second_earmark_fails() {
        let (manager, _store, _keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;

        let earmarked = manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();
        assert_eq!(earmarked.status, DcrStatus::Earmarked);
        assert_eq!(earmarked.trade_id, Some(TradeId::new("123")));

        // A second earmark with a different trade observes a conflict
        let result = manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("999"))
            .await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_earmark_requires_owner() {
        let (manager, _store, _keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;

        let result = manager
            .earmark(&record.linear_id, &PartyId::new("Mallory"), TradeId::new("123"))
            .await;
        assert!(matches!(result, Err(Error::Validation(Violation::MissingSigners))));
    }

    #[tokio::test]
    async fn test_confirm_with_valid_proof() {
        let (manager, _store, keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;
        manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();

        let signature = sign_confirmation(&keypair, "123", "leg-settled");
        let confirmed = manager
            .confirm(&TradeId::new("123"), "ledger-local", "ledger-b", "leg-settled", signature)
            .await
            .unwrap();

        assert_eq!(confirmed.status, DcrStatus::Confirmed);
        assert_eq!(confirmed.proof.as_ref().unwrap().attestor, "ledger-b");
    }

    #[tokio::test]
    async fn test_confirm_with_bad_proof_stays_earmarked() {
        let (manager, store, keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;
        manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();

        // Signature over the wrong trade digest must not verify
        let signature = sign_confirmation(&keypair, "999", "leg-settled");
        let result = manager
            .confirm(&TradeId::new("123"), "ledger-local", "ledger-b", "leg-settled", signature)
            .await;
        assert!(matches!(result, Err(Error::Proof(_))));

        // Local state unchanged; the call is retryable
        let current = store.current_dcr(&record.linear_id).unwrap();
        assert_eq!(current.status, DcrStatus::Earmarked);

        let signature = sign_confirmation(&keypair, "123", "leg-settled");
        let confirmed = manager
            .confirm(&TradeId::new("123"), "ledger-local", "ledger-b", "leg-settled", signature)
            .await
            .unwrap();
        assert_eq!(confirmed.status, DcrStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_confirm_misrouted_system() {
        let (manager, _store, keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;
        manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();

        let signature = sign_confirmation(&keypair, "123", "leg-settled");
        let result = manager
            .confirm(&TradeId::new("123"), "some-other-system", "ledger-b", "leg-settled", signature)
            .await;
        assert!(matches!(result, Err(Error::Misrouted(_))));
    }

    #[tokio::test]
    async fn test_cancel_releases_earmark() {
        let (manager, _store, keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;
        manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();

        let signature = keypair.sign(&attestation_digest("123", "leg-failed"));
        let cancelled = manager
            .cancel(&TradeId::new("123"), "leg-failed", signature)
            .await
            .unwrap();
        assert_eq!(cancelled.status, DcrStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_terminal_states_are_sticky() {
        let (manager, _store, keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;
        manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();

        let signature = sign_confirmation(&keypair, "123", "leg-settled");
        manager
            .confirm(&TradeId::new("123"), "ledger-local", "ledger-b", "leg-settled", signature.clone())
            .await
            .unwrap();

        // Cancel after confirm is rejected
        let result = manager
            .cancel(&TradeId::new("123"), "leg-settled", signature.clone())
            .await;
        assert!(matches!(result, Err(Error::AlreadyFinal(_))));

        // Replayed confirm is rejected distinctly, not silently absorbed
        let result = manager
            .confirm(&TradeId::new("123"), "ledger-local", "ledger-b", "leg-settled", signature)
            .await;
        assert!(matches!(result, Err(Error::AlreadyFinal(_))));
    }

    #[tokio::test]
    async fn test_confirm_unknown_trade_is_fatal() {
        let (manager, _store, keypair, _temp) = test_manager().await;

        let signature = sign_confirmation(&keypair, "123", "leg-settled");
        let result = manager
            .confirm(&TradeId::new("123"), "ledger-local", "ledger-b", "leg-settled", signature)
            .await;
        assert!(matches!(result, Err(Error::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn test_status_service_reports_current_state() {
        let (manager, store, _keypair, _temp) = test_manager().await;
        let record = create_available(&manager).await;
        manager
            .earmark(&record.linear_id, &PartyId::new("BankA"), TradeId::new("123"))
            .await
            .unwrap();

        let service = DcrStatusService::new(store);

        let response = service
            .handle(NetRequest::DcrStatus {
                trade_id: "123".to_string(),
            })
            .await
            .unwrap();
        let NetResponse::DcrStatus(report) = response;
        assert_eq!(report.status, Some(ReportedDcrStatus::Earmarked));

        let response = service
            .handle(NetRequest::DcrStatus {
                trade_id: "unknown".to_string(),
            })
            .await
            .unwrap();
        let NetResponse::DcrStatus(report) = response;
        assert_eq!(report.status, None);
    }
}
