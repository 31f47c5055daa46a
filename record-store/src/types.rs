//! Core types for versioned settlement records
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for asset values)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Party identifier (legal entity registered on a ledger)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(String);

impl PartyId {
    /// Create new party ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade correlation key shared between a reservation and its trade record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(String);

impl TradeId {
    /// Create new trade ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Linear identity of a record, stable across all of its versions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LinearId(Uuid);

impl LinearId {
    /// Generate a fresh linear ID (UUIDv7 for time-ordering)
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Get raw bytes (for storage keys)
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for LinearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// UAE Dirham
    AED,
    /// Indian Rupee
    INR,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AED => "AED",
            Currency::INR => "INR",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "AED" => Some(Currency::AED),
            "INR" => Some(Currency::INR),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Record kind discriminator (for storage keys and indices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordKind {
    /// Delivery commitment record (reservation)
    Dcr = 1,
    /// Exchange-versus-payment trade record
    Xvp = 2,
}

/// Reservation record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum DcrStatus {
    /// Created and free to be locked against a trade
    Available = 1,
    /// Locked against a specific trade
    Earmarked = 2,
    /// Settled (terminal)
    Confirmed = 3,
    /// Released (terminal)
    Cancelled = 4,
}

impl DcrStatus {
    /// Status code as surfaced at the query boundary
    pub fn code(&self) -> &'static str {
        match self {
            DcrStatus::Available => "AVAILABLE",
            DcrStatus::Earmarked => "EARMARKED",
            DcrStatus::Confirmed => "CONFIRMED",
            DcrStatus::Cancelled => "CANCELLED",
        }
    }

    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, DcrStatus::Confirmed | DcrStatus::Cancelled)
    }
}

impl fmt::Display for DcrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Trade record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum XvpStatus {
    /// Awaiting resolution against the counterpart ledger
    Pending = 1,
    /// Counterpart leg confirmed (terminal)
    ResolvedSuccess = 2,
    /// Counterpart leg cancelled (terminal)
    ResolvedFailed = 3,
}

impl XvpStatus {
    /// Status code as surfaced at the query boundary
    pub fn code(&self) -> &'static str {
        match self {
            XvpStatus::Pending => "PENDING",
            XvpStatus::ResolvedSuccess => "RESOLVED_SUCCESS",
            XvpStatus::ResolvedFailed => "RESOLVED_FAILED",
        }
    }

    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, XvpStatus::ResolvedSuccess | XvpStatus::ResolvedFailed)
    }
}

impl fmt::Display for XvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Digital signature (Ed25519)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature bytes (64 bytes)
    #[serde(with = "serde_bytes")]
    bytes: [u8; 64],
}

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Verify signature
    pub fn verify(&self, message: &[u8], public_key: &[u8; 32]) -> bool {
        use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

        let signature = DalekSignature::from_bytes(&self.bytes);

        let verifying_key = match VerifyingKey::from_bytes(public_key) {
            Ok(key) => key,
            Err(_) => return false,
        };

        verifying_key.verify(message, &signature).is_ok()
    }
}

/// Proof that a counterpart system attested a reservation's disposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Identity that produced the attestation (a counterpart system or party)
    pub attestor: String,

    /// Digest the signature covers (binds the proof to one trade)
    pub digest: [u8; 32],

    /// Signature over the digest
    pub signature: Signature,
}

/// Delivery commitment record: a reserved claim on a specific asset value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcrRecord {
    /// Linear identity, stable across versions
    pub linear_id: LinearId,

    /// Version number (1-based, incremented on every transition)
    pub version: u64,

    /// Party entitled to the asset
    pub owner: PartyId,

    /// Party liable for the asset
    pub issuer: PartyId,

    /// Reserved value (non-negative)
    pub value: Decimal,

    /// Currency
    pub currency: Currency,

    /// Trade this reservation is bound to (set at earmark)
    pub trade_id: Option<TradeId>,

    /// Attestation recorded at resolution (null until then)
    pub proof: Option<Attestation>,

    /// Current status
    pub status: DcrStatus,

    /// Creation timestamp (version 1)
    pub created_at: DateTime<Utc>,

    /// Timestamp of this version
    pub updated_at: DateTime<Utc>,
}

impl DcrRecord {
    /// Create canonical bytes for signing and digesting
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Deterministic serialization for attestation verification
        bincode::serialize(self).expect("serialization cannot fail")
    }

    /// Check if record is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Clone into the next version (caller mutates status/bindings afterwards)
    pub fn supersede(&self) -> Self {
        let mut next = self.clone();
        next.version = self.version + 1;
        next.updated_at = Utc::now();
        next
    }
}

/// Exchange-versus-payment record: one cross-ledger trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XvpRecord {
    /// Linear identity, stable across versions
    pub linear_id: LinearId,

    /// Version number (1-based)
    pub version: u64,

    /// Trade correlation key (shared with the backing reservation)
    pub trade_id: TradeId,

    /// Asset being exchanged
    pub asset_id: String,

    /// Sending party
    pub sender: PartyId,

    /// Receiving party
    pub receiver: PartyId,

    /// Current status
    pub status: XvpStatus,

    /// Creation timestamp (version 1)
    pub created_at: DateTime<Utc>,

    /// Timestamp of this version
    pub updated_at: DateTime<Utc>,
}

impl XvpRecord {
    /// Create canonical bytes for signing and digesting
    pub fn canonical_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("serialization cannot fail")
    }

    /// Check if record is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Clone into the next version
    pub fn supersede(&self) -> Self {
        let mut next = self.clone();
        next.version = self.version + 1;
        next.updated_at = Utc::now();
        next
    }
}

/// Candidate transition submitted to the finality oracle
///
/// A transition consumes at most one prior version and produces exactly one
/// new version. Signer sets are validated upstream (lifecycle validator);
/// the oracle enforces version discipline only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateTransition {
    /// Reservation record transition
    Dcr {
        /// Consumed prior version (None for creation)
        input: Option<DcrRecord>,
        /// Produced version
        output: DcrRecord,
        /// Identities that signed the transition
        signers: BTreeSet<PartyId>,
    },
    /// Trade record transition
    Xvp {
        /// Consumed prior version (None for creation)
        input: Option<XvpRecord>,
        /// Produced version
        output: XvpRecord,
        /// Identities that signed the transition
        signers: BTreeSet<PartyId>,
    },
}

impl CandidateTransition {
    /// Record kind of the transition
    pub fn kind(&self) -> RecordKind {
        match self {
            CandidateTransition::Dcr { .. } => RecordKind::Dcr,
            CandidateTransition::Xvp { .. } => RecordKind::Xvp,
        }
    }

    /// Linear ID of the record being transitioned
    pub fn linear_id(&self) -> LinearId {
        match self {
            CandidateTransition::Dcr { output, .. } => output.linear_id,
            CandidateTransition::Xvp { output, .. } => output.linear_id,
        }
    }

    /// Whether this transition creates a new record
    pub fn is_creation(&self) -> bool {
        match self {
            CandidateTransition::Dcr { input, .. } => input.is_none(),
            CandidateTransition::Xvp { input, .. } => input.is_none(),
        }
    }
}

/// Durably committed transition, as returned by the oracle and broadcast to
/// downstream consumers (projections)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommittedTransition {
    /// Committed reservation version
    Dcr {
        /// The new current version
        record: DcrRecord,
        /// Version that was superseded (None for creation)
        superseded: Option<u64>,
    },
    /// Committed trade version
    Xvp {
        /// The new current version
        record: XvpRecord,
        /// Version that was superseded (None for creation)
        superseded: Option<u64>,
    },
}

impl CommittedTransition {
    /// Linear ID of the committed record
    pub fn linear_id(&self) -> LinearId {
        match self {
            CommittedTransition::Dcr { record, .. } => record.linear_id,
            CommittedTransition::Xvp { record, .. } => record.linear_id,
        }
    }

    /// Record kind of the committed record
    pub fn kind(&self) -> RecordKind {
        match self {
            CommittedTransition::Dcr { .. } => RecordKind::Dcr,
            CommittedTransition::Xvp { .. } => RecordKind::Xvp,
        }
    }
}
