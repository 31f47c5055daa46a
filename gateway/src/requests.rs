//! String-boundary request shapes
//!
//! Every field is a string at the boundary; parsing into typed values
//! happens here, and a malformed field is a parse error, distinct from a
//! validation error raised by the invariant rules downstream.

use crate::{Error, Result};
use record_store::{Currency, LinearId, Signature};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Inbound requests, tagged by operation name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayRequest {
    /// Create a reservation on the issuing ledger
    #[serde(rename = "CreateDCR", rename_all = "camelCase")]
    CreateDcr {
        /// Party entitled to the asset
        owner: String,
        /// Party liable for the asset
        issuer: String,
        /// Reserved value
        value: String,
        /// Currency code
        currency: String,
        /// Optional trade correlation at creation
        #[serde(default)]
        trade_id: Option<String>,
    },

    /// Create a cross-ledger trade
    #[serde(rename = "CreateXVP", rename_all = "camelCase")]
    CreateXvp {
        /// Trade correlation key
        trade_id: String,
        /// Asset being exchanged
        asset_id: String,
        /// Sending party
        from: String,
        /// Receiving party
        to: String,
    },

    /// Lock a reservation against a trade
    #[serde(rename = "EarmarkDCR", rename_all = "camelCase")]
    EarmarkDcr {
        /// Reservation to lock
        linear_id: String,
        /// Party requesting the lock
        party_name: String,
        /// Trade to bind
        trade_id: String,
    },

    /// Settle a reservation against a counterpart attestation
    #[serde(rename = "ConfirmDCR", rename_all = "camelCase")]
    ConfirmDcr {
        /// Trade whose reservation settles
        trade_id: String,
        /// System this request is addressed to
        system_id: String,
        /// Attesting counterpart system
        source_system_id: String,
        /// Payload the attestation covers
        encoded_info: String,
        /// Hex-encoded attestation signature
        signature_or_proof: String,
    },

    /// Release a reservation
    #[serde(rename = "CancelDCR", rename_all = "camelCase")]
    CancelDcr {
        /// Trade whose reservation is released
        trade_id: String,
        /// Payload the release proof covers
        encoded_info: String,
        /// Hex-encoded release signature
        signature_or_proof: String,
    },

    /// Resolve a trade against the counterpart ledger
    #[serde(rename = "ResolveXVP", rename_all = "camelCase")]
    ResolveXvp {
        /// Trade to resolve
        trade_id: String,
        /// Ledger holding the backing reservation
        source_network_id: String,
    },
}

impl GatewayRequest {
    /// Parse a request from its JSON wire form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))
    }
}

/// Parse a decimal value field
pub(crate) fn parse_value(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Parse(format!("Invalid value '{}': {}", value, e)))
}

/// Parse a currency code field
pub(crate) fn parse_currency(code: &str) -> Result<Currency> {
    Currency::from_str(code).ok_or_else(|| Error::Parse(format!("Unknown currency '{}'", code)))
}

/// Parse a linear ID field
pub(crate) fn parse_linear_id(id: &str) -> Result<LinearId> {
    LinearId::parse(id).ok_or_else(|| Error::Parse(format!("Invalid linear id '{}'", id)))
}

/// Parse a hex-encoded 64-byte signature field
pub(crate) fn parse_signature(proof: &str) -> Result<Signature> {
    let bytes = hex::decode(proof)
        .map_err(|e| Error::Parse(format!("Invalid signature encoding: {}", e)))?;
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|_| Error::Parse("Signature must be 64 bytes".to_string()))?;
    Ok(Signature::from_bytes(bytes))
}
