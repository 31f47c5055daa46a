//! Main record store orchestration layer
//!
//! This module ties together storage, the finality oracle, and the
//! single-writer actor into a high-level API for record transitions.
//!
//! # Example
//!
//! ```no_run
//! use record_store::{Config, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> record_store::Result<()> {
//!     let config = Config::default();
//!     let store = RecordStore::open(config).await?;
//!
//!     // Submit transitions via store.submit(..), read via store.current_dcr(..)
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_store_actor, StoreHandle},
    metrics::Metrics,
    oracle::{FinalityOracle, LocalOracle},
    storage::{Storage, StorageStats},
    types::{
        CandidateTransition, CommittedTransition, DcrRecord, LinearId, TradeId, XvpRecord,
    },
    Config, Result,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Main record store interface
pub struct RecordStore {
    /// Actor handle for submissions
    handle: StoreHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Committed-transition fan-out
    events: broadcast::Sender<CommittedTransition>,

    /// Metrics collector
    metrics: Metrics,
}

impl RecordStore {
    /// Open a store with the single-node transactional oracle
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let oracle = Arc::new(LocalOracle::new(storage.clone()));
        Self::open_with_oracle(config, storage, oracle).await
    }

    /// Open a store with an injected finality oracle
    ///
    /// The oracle decides commitment; local storage still serves reads and
    /// must observe the oracle's committed state.
    pub async fn open_with_oracle(
        config: Config,
        storage: Arc<Storage>,
        oracle: Arc<dyn FinalityOracle>,
    ) -> Result<Self> {
        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("Failed to create metrics: {}", e)))?;
        let (events, _) = broadcast::channel(config.channels.broadcast_capacity);

        let handle = spawn_store_actor(
            oracle,
            events.clone(),
            metrics.clone(),
            config.channels.mailbox_capacity,
        );

        Ok(Self {
            handle,
            storage,
            events,
            metrics,
        })
    }

    /// Submit a candidate transition for final commitment
    ///
    /// Either the transition commits a new durable current version, or it is
    /// rejected and the prior version remains current.
    pub async fn submit(&self, candidate: CandidateTransition) -> Result<CommittedTransition> {
        self.handle.submit(candidate).await
    }

    /// Current version of a reservation
    pub fn current_dcr(&self, linear_id: &LinearId) -> Result<DcrRecord> {
        self.storage.current_dcr(linear_id)
    }

    /// Current reservation bound to a trade
    pub fn dcr_by_trade(&self, trade_id: &TradeId) -> Result<DcrRecord> {
        self.storage.dcr_by_trade(trade_id)
    }

    /// Full version history of a reservation, oldest first
    pub fn dcr_history(&self, linear_id: &LinearId) -> Result<Vec<DcrRecord>> {
        self.storage.dcr_history(linear_id)
    }

    /// Current version of a trade record
    pub fn current_xvp(&self, linear_id: &LinearId) -> Result<XvpRecord> {
        self.storage.current_xvp(linear_id)
    }

    /// Current trade record for a trade ID
    pub fn xvp_by_trade(&self, trade_id: &TradeId) -> Result<XvpRecord> {
        self.storage.xvp_by_trade(trade_id)
    }

    /// Full version history of a trade record, oldest first
    pub fn xvp_history(&self, linear_id: &LinearId) -> Result<Vec<XvpRecord>> {
        self.storage.xvp_history(linear_id)
    }

    /// Subscribe to committed transitions (for projections)
    pub fn subscribe(&self) -> broadcast::Receiver<CommittedTransition> {
        self.events.subscribe()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Storage statistics
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }

    /// Shutdown store
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, DcrStatus, PartyId};
    use crate::Error;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;

    async fn create_test_store() -> (RecordStore, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (RecordStore::open(config).await.unwrap(), temp_dir)
    }

    fn test_dcr() -> DcrRecord {
        DcrRecord {
            linear_id: LinearId::generate(),
            version: 1,
            owner: PartyId::new("BankA"),
            issuer: PartyId::new("CentralBank"),
            value: Decimal::new(100, 2),
            currency: Currency::GBP,
            trade_id: None,
            proof: None,
            status: DcrStatus::Available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_open_and_shutdown() {
        let (store, _temp) = create_test_store().await;
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_then_read() {
        let (store, _temp) = create_test_store().await;

        let record = test_dcr();
        store
            .submit(CandidateTransition::Dcr {
                input: None,
                output: record.clone(),
                signers: BTreeSet::new(),
            })
            .await
            .unwrap();

        let current = store.current_dcr(&record.linear_id).unwrap();
        assert_eq!(current.version, 1);
        assert_eq!(current.status, DcrStatus::Available);

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_rejecting_oracle() {
        struct RejectAll;

        impl FinalityOracle for RejectAll {
            fn submit(&self, _candidate: CandidateTransition) -> Result<CommittedTransition> {
                Err(Error::Rejected("Notary unavailable".to_string()))
            }
        }

        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let storage = Arc::new(Storage::open(&config).unwrap());

        let store = RecordStore::open_with_oracle(config, storage, Arc::new(RejectAll))
            .await
            .unwrap();

        let record = test_dcr();
        let result = store
            .submit(CandidateTransition::Dcr {
                input: None,
                output: record.clone(),
                signers: BTreeSet::new(),
            })
            .await;
        assert!(matches!(result, Err(Error::Rejected(_))));

        // Nothing was committed
        assert!(store.current_dcr(&record.linear_id).is_err());

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_track_commits() {
        let (store, _temp) = create_test_store().await;

        store
            .submit(CandidateTransition::Dcr {
                input: None,
                output: test_dcr(),
                signers: BTreeSet::new(),
            })
            .await
            .unwrap();

        assert_eq!(store.metrics().transitions_total.get(), 1);

        store.shutdown().await.unwrap();
    }
}
