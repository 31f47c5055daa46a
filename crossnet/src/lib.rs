//! LedgerLink Cross-Network Messaging
//!
//! Asynchronous request/response between ledgers that share no consensus:
//! - Correlation-keyed envelopes
//! - Explicit per-attempt timeout and bounded retry budget
//! - Channel-dispatched transports; no caller blocks beyond its budget
//! - Observability via Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod error;
pub mod message;
pub mod metrics;
pub mod network;

pub use client::{ClientConfig, NetworkClient};
pub use error::{Error, Result};
pub use message::{DcrStatusReport, NetEnvelope, NetRequest, NetResponse, ReportedDcrStatus};
pub use network::{InProcessNetwork, NetworkTransport, RequestHandler};
