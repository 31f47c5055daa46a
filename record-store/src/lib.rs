//! LedgerLink Record Store
//!
//! Append-only versioned record store with compare-and-set finality.
//!
//! # Architecture
//!
//! - **Versioned records**: a logical record is a chain of immutable
//!   versions keyed by `(linear_id, version)`; the current version is
//!   resolved by an index and superseded, never mutated
//! - **Finality oracle**: commitment goes through an injected
//!   `submit(candidate) -> committed | rejected` gate
//! - **Single writer**: one actor task serializes submits, giving
//!   single-writer-wins compare-and-set on current versions
//! - **Fan-out**: committed transitions broadcast to projections

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod config;
pub mod crypto;
pub mod error;
pub mod metrics;
pub mod oracle;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use crypto::{AttestorRegistry, KeyPair};
pub use error::{Error, Result};
pub use oracle::{FinalityOracle, LocalOracle};
pub use store::RecordStore;
pub use types::{
    Attestation, CandidateTransition, CommittedTransition, Currency, DcrRecord, DcrStatus,
    LinearId, PartyId, RecordKind, Signature, TradeId, XvpRecord, XvpStatus,
};
