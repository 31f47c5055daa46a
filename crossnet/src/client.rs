//! Cross-network client with timeout and retry budget
//!
//! Every call is a bounded request/response pair: an explicit per-attempt
//! timeout and a fixed number of attempts. When the budget is exhausted the
//! caller gets a timeout error and decides what to do next (retry later,
//! escalate, or release the local earmark). The client never blocks beyond
//! its budget and holds no locks.

use crate::{
    message::{DcrStatusReport, NetEnvelope, NetRequest, NetResponse},
    metrics::{NET_REQUEST_DURATION, NET_REQUEST_TOTAL},
    network::NetworkTransport,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-attempt timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Maximum attempts per call
    pub max_attempts: u32,

    /// Delay between attempts (milliseconds)
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5000,
            max_attempts: 3,
            retry_delay_ms: 250,
        }
    }
}

/// Client for querying counterpart networks
pub struct NetworkClient {
    transports: RwLock<HashMap<String, Arc<dyn NetworkTransport>>>,
    config: ClientConfig,
}

impl NetworkClient {
    /// Create new client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transports: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a transport for a network
    pub async fn register(&self, network_id: impl Into<String>, transport: Arc<dyn NetworkTransport>) {
        self.transports.write().await.insert(network_id.into(), transport);
    }

    /// Query a counterpart network for the reservation status of a trade
    pub async fn dcr_status(&self, network_id: &str, trade_id: &str) -> Result<DcrStatusReport> {
        let transport = {
            let transports = self.transports.read().await;
            transports
                .get(network_id)
                .cloned()
                .ok_or_else(|| Error::UnknownNetwork(network_id.to_string()))?
        };

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let mut last_error = Error::Timeout {
            network: network_id.to_string(),
            attempts: 0,
        };

        for attempt in 1..=self.config.max_attempts {
            let envelope = NetEnvelope::request(
                network_id,
                NetRequest::DcrStatus {
                    trade_id: trade_id.to_string(),
                },
            );
            let request_id = envelope.id;
            let start = Instant::now();

            match tokio::time::timeout(timeout, transport.request(envelope)).await {
                Ok(Ok(reply)) => {
                    NET_REQUEST_DURATION
                        .with_label_values(&[network_id])
                        .observe(start.elapsed().as_secs_f64());

                    if reply.correlation_id != Some(request_id) {
                        NET_REQUEST_TOTAL
                            .with_label_values(&[network_id, "mismatch"])
                            .inc();
                        return Err(Error::Transport(format!(
                            "Uncorrelated reply from {}",
                            network_id
                        )));
                    }

                    let NetResponse::DcrStatus(report) = reply.payload;
                    NET_REQUEST_TOTAL
                        .with_label_values(&[network_id, "ok"])
                        .inc();
                    return Ok(report);
                }
                Ok(Err(e)) => {
                    NET_REQUEST_TOTAL
                        .with_label_values(&[network_id, "error"])
                        .inc();
                    tracing::warn!(
                        network = network_id,
                        attempt,
                        error = %e,
                        "Cross-network request failed"
                    );
                    last_error = e;
                }
                Err(_) => {
                    NET_REQUEST_TOTAL
                        .with_label_values(&[network_id, "timeout"])
                        .inc();
                    tracing::warn!(
                        network = network_id,
                        attempt,
                        timeout_ms = self.config.request_timeout_ms,
                        "Cross-network request timed out"
                    );
                    last_error = Error::Timeout {
                        network: network_id.to_string(),
                        attempts: attempt,
                    };
                }
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }
        }

        Err(last_error)
    }
}
