//! LedgerLink Gateway
//!
//! String-boundary request surface: parses inbound requests and translates
//! them into lifecycle operations. Parsing only; invariant checks,
//! commitment, and retry decisions all live downstream, and the HTTP layer
//! that carries these requests is an external collaborator.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod dispatch;
pub mod error;
pub mod requests;

pub use dispatch::{Gateway, GatewayResponse, ResponseRecord};
pub use error::{Error, Result};
pub use requests::GatewayRequest;
