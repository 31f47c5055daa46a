//! Request dispatch into lifecycle operations
//!
//! The gateway parses and translates only: no invariant checks live here,
//! and the committed record that comes back from a manager is returned
//! verbatim in the response envelope.

use crate::{
    requests::{parse_currency, parse_linear_id, parse_signature, parse_value, GatewayRequest},
    Result,
};
use lifecycle::{DcrManager, XvpCoordinator};
use record_store::{DcrRecord, PartyId, TradeId, XvpRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Committed record returned to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseRecord {
    /// Reservation snapshot
    Dcr(DcrRecord),
    /// Trade snapshot
    Xvp(XvpRecord),
}

/// Uniform response envelope
#[derive(Debug, Clone, Serialize)]
pub struct GatewayResponse {
    /// Always "committed"; failures surface as errors
    pub outcome: &'static str,

    /// The committed record
    pub record: ResponseRecord,
}

impl GatewayResponse {
    fn dcr(record: DcrRecord) -> Self {
        Self {
            outcome: "committed",
            record: ResponseRecord::Dcr(record),
        }
    }

    fn xvp(record: XvpRecord) -> Self {
        Self {
            outcome: "committed",
            record: ResponseRecord::Xvp(record),
        }
    }
}

/// Translates inbound requests into lifecycle operations
pub struct Gateway {
    dcr: Arc<DcrManager>,
    xvp: Arc<XvpCoordinator>,
}

impl Gateway {
    /// Create new gateway over the two managers
    pub fn new(dcr: Arc<DcrManager>, xvp: Arc<XvpCoordinator>) -> Self {
        Self { dcr, xvp }
    }

    /// Parse a JSON request and dispatch it
    pub async fn handle_json(&self, json: &str) -> Result<GatewayResponse> {
        let request = GatewayRequest::from_json(json)?;
        self.handle(request).await
    }

    /// Dispatch a parsed request
    pub async fn handle(&self, request: GatewayRequest) -> Result<GatewayResponse> {
        tracing::debug!(?request, "Dispatching gateway request");

        match request {
            GatewayRequest::CreateDcr {
                owner,
                issuer,
                value,
                currency,
                trade_id,
            } => {
                let owner = PartyId::new(owner);
                let issuer = PartyId::new(issuer);
                // Signature collection is the platform's ceremony; at this
                // boundary both participants are presented as signers
                let signers: BTreeSet<PartyId> = [owner.clone(), issuer.clone()]
                    .into_iter()
                    .collect();

                let record = self
                    .dcr
                    .create(
                        owner,
                        issuer,
                        parse_value(&value)?,
                        parse_currency(&currency)?,
                        trade_id.map(TradeId::new),
                        &signers,
                    )
                    .await?;
                Ok(GatewayResponse::dcr(record))
            }

            GatewayRequest::CreateXvp {
                trade_id,
                asset_id,
                from,
                to,
            } => {
                let sender = PartyId::new(from);
                let receiver = PartyId::new(to);
                let signers: BTreeSet<PartyId> = [sender.clone(), receiver.clone()]
                    .into_iter()
                    .collect();

                let record = self
                    .xvp
                    .create_trade(TradeId::new(trade_id), asset_id, sender, receiver, &signers)
                    .await?;
                Ok(GatewayResponse::xvp(record))
            }

            GatewayRequest::EarmarkDcr {
                linear_id,
                party_name,
                trade_id,
            } => {
                let record = self
                    .dcr
                    .earmark(
                        &parse_linear_id(&linear_id)?,
                        &PartyId::new(party_name),
                        TradeId::new(trade_id),
                    )
                    .await?;
                Ok(GatewayResponse::dcr(record))
            }

            GatewayRequest::ConfirmDcr {
                trade_id,
                system_id,
                source_system_id,
                encoded_info,
                signature_or_proof,
            } => {
                let record = self
                    .dcr
                    .confirm(
                        &TradeId::new(trade_id),
                        &system_id,
                        &source_system_id,
                        &encoded_info,
                        parse_signature(&signature_or_proof)?,
                    )
                    .await?;
                Ok(GatewayResponse::dcr(record))
            }

            GatewayRequest::CancelDcr {
                trade_id,
                encoded_info,
                signature_or_proof,
            } => {
                let record = self
                    .dcr
                    .cancel(
                        &TradeId::new(trade_id),
                        &encoded_info,
                        parse_signature(&signature_or_proof)?,
                    )
                    .await?;
                Ok(GatewayResponse::dcr(record))
            }

            GatewayRequest::ResolveXvp {
                trade_id,
                source_network_id,
            } => {
                let record = self
                    .xvp
                    .resolve_trade(&TradeId::new(trade_id), &source_network_id)
                    .await?;
                Ok(GatewayResponse::xvp(record))
            }
        }
    }
}
