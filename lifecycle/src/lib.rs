//! LedgerLink Lifecycle
//!
//! Record lifecycle and invariant logic for cross-ledger settlement.
//!
//! # Architecture
//!
//! Two record types cooperate in one logical trade, each mutated by exactly
//! one manager:
//!
//! 1. **DCR manager**: AVAILABLE -> EARMARKED -> {CONFIRMED | CANCELLED};
//!    earmark locks a reservation against a trade, confirm settles it
//!    against a counterpart attestation, cancel releases it
//! 2. **XVP coordinator**: PENDING -> RESOLVED_*; resolution treats the
//!    reservation's finality on the source ledger as the single source of
//!    truth and is safely re-entrant
//!
//! Every transition is validated against the invariant rules before being
//! submitted to the finality oracle; commits are compare-and-set on the
//! record's current version.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod dcr;
pub mod error;
pub mod policy;
pub mod validator;
pub mod xvp;

// Re-exports
pub use config::Config;
pub use dcr::{DcrManager, DcrStatusService};
pub use error::{Error, Result};
pub use policy::{DefaultSignerPolicy, SignerPolicy, TransitionKind};
pub use validator::{validate, Violation};
pub use xvp::XvpCoordinator;
