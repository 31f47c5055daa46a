//! Background task feeding the projection from committed transitions

use crate::store::ProjectionStore;
use record_store::CommittedTransition;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn a task that applies every committed transition to the store
///
/// The task ends when the broadcast channel closes (store shut down). A
/// lagged receiver skips to the newest commits; the projection is a cache of
/// current state, not the system of record, so missed intermediate versions
/// only shorten its history.
pub fn spawn_projection(
    mut events: broadcast::Receiver<CommittedTransition>,
    store: Arc<ProjectionStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(transition) => {
                    tracing::debug!(
                        linear_id = %transition.linear_id(),
                        "Projection row updated"
                    );
                    store.apply(&transition);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Projection lagged behind commits");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        tracing::debug!("Projection updater stopped");
    })
}
