//! Network transports and request handlers
//!
//! A `NetworkTransport` carries one request envelope to a counterpart and
//! returns its reply. The in-process implementation dispatches over Tokio
//! channels to a responder task; a production deployment would put a real
//! relay behind the same trait. Either way, no caller ever holds a record
//! lock across the round trip.

use crate::{
    message::{NetEnvelope, NetRequest, NetResponse},
    Error, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Handler for requests arriving from counterpart networks
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle an incoming request
    async fn handle(&self, request: NetRequest) -> Result<NetResponse>;
}

/// One-shot request/response transport to a counterpart network
#[async_trait]
pub trait NetworkTransport: Send + Sync {
    /// Send a request and await the correlated reply
    async fn request(&self, envelope: NetEnvelope<NetRequest>) -> Result<NetEnvelope<NetResponse>>;
}

type PendingReply = oneshot::Sender<Result<NetEnvelope<NetResponse>>>;

/// In-process transport: requests are queued to a responder task that runs
/// the registered handler and replies on a oneshot channel
pub struct InProcessNetwork {
    network_id: String,
    sender: mpsc::Sender<(NetEnvelope<NetRequest>, PendingReply)>,
}

impl InProcessNetwork {
    /// Spawn a responder task for `handler` and return the transport
    pub fn spawn<H>(network_id: impl Into<String>, handler: Arc<H>, capacity: usize) -> Self
    where
        H: RequestHandler + 'static,
    {
        let network_id = network_id.into();
        let (tx, mut rx) = mpsc::channel::<(NetEnvelope<NetRequest>, PendingReply)>(capacity);

        let responder_id = network_id.clone();
        tokio::spawn(async move {
            while let Some((envelope, reply)) = rx.recv().await {
                tracing::debug!(
                    network = %responder_id,
                    request_id = %envelope.id,
                    "Handling cross-network request"
                );

                let result = handler
                    .handle(envelope.payload.clone())
                    .await
                    .map(|payload| NetEnvelope::reply(&envelope, responder_id.clone(), payload));

                let _ = reply.send(result);
            }
        });

        Self {
            network_id,
            sender: tx,
        }
    }

    /// Network this transport is connected to
    pub fn network_id(&self) -> &str {
        &self.network_id
    }
}

#[async_trait]
impl NetworkTransport for InProcessNetwork {
    async fn request(
        &self,
        envelope: NetEnvelope<NetRequest>,
    ) -> Result<NetEnvelope<NetResponse>> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send((envelope, tx))
            .await
            .map_err(|_| Error::Closed(format!("Responder for {} gone", self.network_id)))?;

        rx.await
            .map_err(|_| Error::Closed(format!("Responder for {} dropped reply", self.network_id)))?
    }
}
