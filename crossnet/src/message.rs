//! Message envelope for cross-network request/response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation status as reported across the network boundary
///
/// Wire-level codes, deliberately decoupled from any ledger's internal
/// status enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportedDcrStatus {
    /// Reservation exists but was never locked
    Available,
    /// Reservation locked against the trade, not yet final
    Earmarked,
    /// Reservation settled (terminal)
    Confirmed,
    /// Reservation released (terminal)
    Cancelled,
}

/// Counterpart's answer to a reservation status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcrStatusReport {
    /// Trade the query was about
    pub trade_id: String,

    /// Status of the reservation bound to the trade; None if no reservation
    /// is bound to this trade on the reporting ledger
    pub status: Option<ReportedDcrStatus>,
}

/// Request payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetRequest {
    /// Query the status of the reservation bound to a trade
    DcrStatus {
        /// Trade correlation key
        trade_id: String,
    },
}

/// Response payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetResponse {
    /// Answer to a `DcrStatus` query
    DcrStatus(DcrStatusReport),
}

/// Correlation-keyed message envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetEnvelope<T> {
    /// Message ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// ID of the request this message answers (None on requests)
    pub correlation_id: Option<Uuid>,

    /// Network the message is addressed to (requests) or sent from (replies)
    pub network_id: String,

    /// Payload
    pub payload: T,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> NetEnvelope<T> {
    /// Serialize to bytes
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<T: for<'de> Deserialize<'de>> NetEnvelope<T> {
    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl NetEnvelope<NetRequest> {
    /// Create a request envelope addressed to a network
    pub fn request(network_id: impl Into<String>, payload: NetRequest) -> Self {
        Self {
            id: Uuid::now_v7(),
            correlation_id: None,
            network_id: network_id.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

impl NetEnvelope<NetResponse> {
    /// Create a reply correlated to a request
    pub fn reply(
        request: &NetEnvelope<NetRequest>,
        network_id: impl Into<String>,
        payload: NetResponse,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            correlation_id: Some(request.id),
            network_id: network_id.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}
