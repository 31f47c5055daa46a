//! Actor-based concurrency for the record store
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One logical writer task serializes all submits, which is what turns the
//!   oracle's check-then-write into single-writer-wins compare-and-set
//! - Async message passing with backpressure (bounded mailbox)
//! - Committed transitions fan out on a broadcast channel for projections
//!
//! Reads never pass through the actor; they go straight to storage.

use crate::{
    metrics::Metrics,
    oracle::FinalityOracle,
    types::{CandidateTransition, CommittedTransition},
    Error, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Message sent to the store actor
pub enum StoreMessage {
    /// Submit a candidate transition to the oracle
    Submit {
        /// The candidate transition
        candidate: CandidateTransition,
        /// Response channel
        response: oneshot::Sender<Result<CommittedTransition>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that serializes submissions to the finality oracle
pub struct StoreActor {
    /// Commit gate
    oracle: Arc<dyn FinalityOracle>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<StoreMessage>,

    /// Fan-out for committed transitions
    events: broadcast::Sender<CommittedTransition>,

    /// Metrics collector
    metrics: Metrics,
}

impl StoreActor {
    /// Create new actor
    pub fn new(
        oracle: Arc<dyn FinalityOracle>,
        mailbox: mpsc::Receiver<StoreMessage>,
        events: broadcast::Sender<CommittedTransition>,
        metrics: Metrics,
    ) -> Self {
        Self {
            oracle,
            mailbox,
            events,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                StoreMessage::Shutdown => break,
                StoreMessage::Submit {
                    candidate,
                    response,
                } => {
                    let result = self.handle_submit(candidate);
                    let _ = response.send(result);
                }
            }
        }

        tracing::debug!("Store actor stopped");
    }

    fn handle_submit(
        &mut self,
        candidate: CandidateTransition,
    ) -> Result<CommittedTransition> {
        let start = Instant::now();
        let result = self.oracle.submit(candidate);

        match &result {
            Ok(committed) => {
                self.metrics.record_commit(start.elapsed().as_secs_f64());
                // No receivers is fine; projections are optional
                let _ = self.events.send(committed.clone());
            }
            Err(Error::VersionConflict { .. }) => {
                self.metrics.record_conflict();
            }
            Err(Error::Rejected(_)) => {
                self.metrics.record_rejection();
            }
            Err(_) => {}
        }

        result
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreMessage>,
}

impl StoreHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<StoreMessage>) -> Self {
        Self { sender }
    }

    /// Submit a candidate transition
    pub async fn submit(&self, candidate: CandidateTransition) -> Result<CommittedTransition> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreMessage::Submit {
                candidate,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(StoreMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the store actor
pub fn spawn_store_actor(
    oracle: Arc<dyn FinalityOracle>,
    events: broadcast::Sender<CommittedTransition>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> StoreHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = StoreActor::new(oracle, rx, events, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    StoreHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LocalOracle;
    use crate::storage::Storage;
    use crate::types::{Currency, DcrRecord, DcrStatus, LinearId, PartyId};
    use crate::Config;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;

    fn spawn_test_actor() -> (StoreHandle, broadcast::Receiver<CommittedTransition>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        let oracle = Arc::new(LocalOracle::new(storage));
        let (events, rx) = broadcast::channel(16);
        let handle = spawn_store_actor(oracle, events, Metrics::new().unwrap(), 100);
        (handle, rx, temp_dir)
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
    async fn test_actor_submit_and_broadcast() {
        let (handle, mut events, _temp) = spawn_test_actor();

        let record = test_dcr();
        let committed = handle
            .submit(CandidateTransition::Dcr {
                input: None,
                output: record.clone(),
                signers: BTreeSet::new(),
            })
            .await
            .unwrap();

        assert_eq!(committed.linear_id(), record.linear_id);

        let event = events.recv().await.unwrap();
        assert_eq!(event.linear_id(), record.linear_id);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_shutdown() {
        let (handle, _events, _temp) = spawn_test_actor();
        handle.shutdown().await.unwrap();
    }
}
