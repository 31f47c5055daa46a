//! XVP trade coordinator
//!
//! Owns every mutation of trade records. Resolution bridges two ledgers
//! with no shared state: the reservation's finality on the source ledger is
//! the single source of truth for the trade's outcome here. The coordinator
//! never busy-waits on the counterpart: a query either answers within its
//! budget or the caller gets a retryable not-yet-final error. Resolving an
//! already-resolved trade returns the recorded outcome without touching the
//! network.

use crate::{
    policy::{SignerPolicy, TransitionKind},
    validator, Config, Error, Result,
};
use chrono::Utc;
use crossnet::{NetworkClient, ReportedDcrStatus};
use record_store::{
    CandidateTransition, CommittedTransition, LinearId, PartyId, RecordStore, TradeId, XvpRecord,
    XvpStatus,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Coordinator for cross-ledger trade records
pub struct XvpCoordinator {
    store: Arc<RecordStore>,
    net: Arc<NetworkClient>,
    policy: Arc<dyn SignerPolicy>,
    config: Config,
}

impl XvpCoordinator {
    /// Create new coordinator
    pub fn new(
        store: Arc<RecordStore>,
        net: Arc<NetworkClient>,
        policy: Arc<dyn SignerPolicy>,
        config: Config,
    ) -> Self {
        Self {
            store,
            net,
            policy,
            config,
        }
    }

    /// Create a PENDING trade
    ///
    /// Single-party trades (sender == receiver) are permitted or rejected
    /// per configuration. Reusing a trade ID is fatal.
    pub async fn create_trade(
        &self,
        trade_id: TradeId,
        asset_id: String,
        sender: PartyId,
        receiver: PartyId,
        signers: &BTreeSet<PartyId>,
    ) -> Result<XvpRecord> {
        if self.store.xvp_by_trade(&trade_id).is_ok() {
            return Err(Error::DuplicateTrade(trade_id.to_string()));
        }

        let now = Utc::now();
        let output = XvpRecord {
            linear_id: LinearId::generate(),
            version: 1,
            trade_id: trade_id.clone(),
            asset_id,
            sender,
            receiver,
            status: XvpStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let candidate = CandidateTransition::Xvp {
            input: None,
            output,
            signers: signers.clone(),
        };
        validator::validate(
            &candidate,
            self.policy.as_ref(),
            self.config.allow_single_party_trades,
        )?;

        let record = self.commit_xvp(candidate).await?;
        tracing::info!(
            linear_id = %record.linear_id,
            trade_id = %trade_id,
            asset_id = %record.asset_id,
            "Trade created"
        );
        Ok(record)
    }

    /// Resolve a trade against the counterpart ledger's reservation state
    ///
    /// Re-entrant by design: a terminal trade is returned as-is, and losing
    /// the commit race to a concurrent resolution converges on whatever
    /// outcome was committed first.
    pub async fn resolve_trade(
        &self,
        trade_id: &TradeId,
        source_network_id: &str,
    ) -> Result<XvpRecord> {
        let current = self.store.xvp_by_trade(trade_id)?;

        if current.is_terminal() {
            tracing::debug!(
                trade_id = %trade_id,
                status = %current.status,
                "Trade already resolved"
            );
            return Ok(current);
        }

        let report = match self.net.dcr_status(source_network_id, trade_id.as_str()).await {
            Ok(report) => report,
            Err(crossnet::Error::UnknownNetwork(network)) => {
                return Err(Error::Misrouted(format!(
                    "Unknown counterpart network: {}",
                    network
                )));
            }
            Err(e) => {
                // Status unknown after the bounded wait; legitimate
                // transient condition, caller retries on backoff
                return Err(Error::NotYetFinal(format!(
                    "Counterpart {} did not answer: {}",
                    source_network_id, e
                )));
            }
        };

        if report.trade_id != trade_id.as_str() {
            return Err(Error::TradeMismatch(format!(
                "Counterpart reported trade {}, asked about {}",
                report.trade_id, trade_id
            )));
        }

        let outcome = match report.status {
            None => {
                return Err(Error::UnknownBinding(format!(
                    "No reservation bound to trade {} on {}",
                    trade_id, source_network_id
                )));
            }
            Some(ReportedDcrStatus::Available) => {
                return Err(Error::UnknownBinding(format!(
                    "Reservation for trade {} on {} was never earmarked",
                    trade_id, source_network_id
                )));
            }
            Some(ReportedDcrStatus::Earmarked) => {
                return Err(Error::NotYetFinal(format!(
                    "Reservation for trade {} on {} is not yet final",
                    trade_id, source_network_id
                )));
            }
            Some(ReportedDcrStatus::Confirmed) => XvpStatus::ResolvedSuccess,
            Some(ReportedDcrStatus::Cancelled) => XvpStatus::ResolvedFailed,
        };

        let mut output = current.supersede();
        output.status = outcome;

        let signers = self.policy.xvp_signers(&current, TransitionKind::Resolve);
        let candidate = CandidateTransition::Xvp {
            input: Some(current),
            output,
            signers,
        };
        validator::validate(
            &candidate,
            self.policy.as_ref(),
            self.config.allow_single_party_trades,
        )?;

        match self.store.submit(candidate).await {
            Ok(CommittedTransition::Xvp { record, .. }) => {
                tracing::info!(
                    trade_id = %trade_id,
                    status = %record.status,
                    "Trade resolved"
                );
                Ok(record)
            }
            Ok(CommittedTransition::Dcr { .. }) => {
                Err(Error::Internal("Oracle committed the wrong record kind".to_string()))
            }
            Err(record_store::Error::VersionConflict { .. }) => {
                // A concurrent resolution won the race; converge on its
                // outcome instead of flipping anything
                let latest = self.store.xvp_by_trade(trade_id)?;
                if latest.is_terminal() {
                    Ok(latest)
                } else {
                    Err(Error::Conflict(format!(
                        "Trade {} moved while resolving; retry",
                        trade_id
                    )))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit_xvp(&self, candidate: CandidateTransition) -> Result<XvpRecord> {
        match self.store.submit(candidate).await? {
            CommittedTransition::Xvp { record, .. } => Ok(record),
            CommittedTransition::Dcr { .. } => {
                Err(Error::Internal("Oracle committed the wrong record kind".to_string()))
            }
        }
    }
}
