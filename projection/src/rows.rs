//! Denormalized row shapes for the query surface
//!
//! One row per current record version, all query-facing values rendered as
//! strings the way the relational projection exposes them.

use record_store::{DcrRecord, XvpRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Current-state row for a reservation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcrRow {
    /// Party entitled to the asset
    pub owner: String,

    /// Party liable for the asset
    pub issuer: String,

    /// Reserved value
    pub value: Decimal,

    /// Currency code
    pub currency: String,

    /// Linear identity
    pub linear_id: Uuid,

    /// Bound trade, if earmarked
    pub trade_id: Option<String>,

    /// Hex-encoded attestation signature, if resolved
    pub proof: Option<String>,

    /// Status code
    pub status: String,
}

impl From<&DcrRecord> for DcrRow {
    fn from(record: &DcrRecord) -> Self {
        Self {
            owner: record.owner.to_string(),
            issuer: record.issuer.to_string(),
            value: record.value,
            currency: record.currency.code().to_string(),
            linear_id: record.linear_id.as_uuid(),
            trade_id: record.trade_id.as_ref().map(|t| t.to_string()),
            proof: record
                .proof
                .as_ref()
                .map(|p| hex::encode(p.signature.as_bytes())),
            status: record.status.code().to_string(),
        }
    }
}

/// Current-state row for a trade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XvpRow {
    /// Linear identity
    pub linear_id: Uuid,

    /// Trade correlation key
    pub trade_id: String,

    /// Asset being exchanged
    pub asset_id: String,

    /// Sending party
    pub sender: String,

    /// Receiving party
    pub receiver: String,

    /// Status code
    pub status: String,
}

impl From<&XvpRecord> for XvpRow {
    fn from(record: &XvpRecord) -> Self {
        Self {
            linear_id: record.linear_id.as_uuid(),
            trade_id: record.trade_id.to_string(),
            asset_id: record.asset_id.clone(),
            sender: record.sender.to_string(),
            receiver: record.receiver.to_string(),
            status: record.status.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use record_store::{
        Attestation, Currency, DcrStatus, LinearId, PartyId, Signature, TradeId,
    };

    #[test]
    fn test_dcr_row_columns() {
        let record = DcrRecord {
            linear_id: LinearId::generate(),
            version: 3,
            owner: PartyId::new("BankA"),
            issuer: PartyId::new("CentralBank"),
            value: Decimal::new(100, 2),
            currency: Currency::GBP,
            trade_id: Some(TradeId::new("123")),
            proof: Some(Attestation {
                attestor: "ledger-b".to_string(),
                digest: [7u8; 32],
                signature: Signature::from_bytes([1u8; 64]),
            }),
            status: DcrStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let row = DcrRow::from(&record);
        assert_eq!(row.owner, "BankA");
        assert_eq!(row.currency, "GBP");
        assert_eq!(row.trade_id.as_deref(), Some("123"));
        assert_eq!(row.status, "CONFIRMED");
        assert_eq!(row.proof.as_deref(), Some(hex::encode([1u8; 64]).as_str()));
    }
}
