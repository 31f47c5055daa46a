//! Invariant validator
//!
//! Pure predicates applied to every proposed transition before it is
//! submitted to the finality oracle. Violations carry specific, stable
//! reason strings: they are part of the observable contract and are
//! surfaced verbatim to callers.

use crate::policy::{SignerPolicy, TransitionKind};
use record_store::{CandidateTransition, DcrRecord, DcrStatus, PartyId, XvpRecord, XvpStatus};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

/// A specific invariant violation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Reservation value below zero
    #[error("value must be non-negative")]
    NegativeValue,

    /// Owner and issuer are the same party
    #[error("owner and issuer cannot be the same entity")]
    OwnerIsIssuer,

    /// A required signer is missing from the transition
    #[error("all participants must be signers")]
    MissingSigners,

    /// Creation output is not version one
    #[error("a creation must produce version one")]
    CreateBadVersion,

    /// Creation output does not begin in its initial status
    #[error("a creation must begin in its initial status")]
    CreateWrongStatus,

    /// Linear identity changed between input and output
    #[error("linear id must be preserved across versions")]
    IdentityChanged,

    /// Output version is not input version plus one
    #[error("version must increment by exactly one")]
    VersionSkip,

    /// An immutable field (owner, issuer, value, currency, trade identity)
    /// changed between versions
    #[error("immutable fields must carry over unchanged")]
    ImmutableFieldChanged,

    /// Reservation status edge outside AVAILABLE -> EARMARKED -> terminal
    #[error("illegal status transition: {from} -> {to}")]
    IllegalEdge {
        /// Status being consumed
        from: DcrStatus,
        /// Status being produced
        to: DcrStatus,
    },

    /// Earmark without a trade binding
    #[error("an earmark must bind a trade")]
    MissingTradeBinding,

    /// Attempt to bind an already-bound reservation to another trade
    #[error("reservation is bound to a different trade")]
    TradeRebinding,

    /// Confirmation without an attestation
    #[error("a confirmation must carry an attestation")]
    MissingProof,

    /// Sender and receiver are the same party and policy forbids it
    #[error("sender and receiver cannot be the same party")]
    SenderIsReceiver,

    /// Attempt to change a terminal trade status
    #[error("a resolved trade cannot change status")]
    TerminalTrade,

    /// Trade status edge outside PENDING -> RESOLVED_*
    #[error("illegal trade status transition: {from} -> {to}")]
    IllegalTradeEdge {
        /// Status being consumed
        from: XvpStatus,
        /// Status being produced
        to: XvpStatus,
    },
}

/// Validate a candidate transition
///
/// `allow_single_party_trades` relaxes the sender/receiver distinctness rule
/// for trades where one legal party acts in both roles.
pub fn validate(
    candidate: &CandidateTransition,
    policy: &dyn SignerPolicy,
    allow_single_party_trades: bool,
) -> Result<(), Violation> {
    match candidate {
        CandidateTransition::Dcr {
            input: None,
            output,
            signers,
        } => validate_dcr_create(output, signers, policy),
        CandidateTransition::Dcr {
            input: Some(input),
            output,
            signers,
        } => validate_dcr_transition(input, output, signers, policy),
        CandidateTransition::Xvp {
            input: None,
            output,
            signers,
        } => validate_xvp_create(output, signers, policy, allow_single_party_trades),
        CandidateTransition::Xvp {
            input: Some(input),
            output,
            signers: _,
        } => validate_xvp_transition(input, output),
    }
}

/// Creation: no input consumed, exactly one version-one output, both
/// participants sign, identity and value invariants hold
fn validate_dcr_create(
    output: &DcrRecord,
    signers: &BTreeSet<PartyId>,
    policy: &dyn SignerPolicy,
) -> Result<(), Violation> {
    if output.version != 1 {
        return Err(Violation::CreateBadVersion);
    }
    if output.status != DcrStatus::Available {
        return Err(Violation::CreateWrongStatus);
    }
    if output.value < Decimal::ZERO {
        return Err(Violation::NegativeValue);
    }
    if output.owner == output.issuer {
        return Err(Violation::OwnerIsIssuer);
    }

    let required = policy.dcr_signers(output, TransitionKind::Create);
    if !required.is_subset(signers) {
        return Err(Violation::MissingSigners);
    }

    Ok(())
}

/// Update: exactly one input and one output, an allowed status edge, and
/// identity/immutable fields preserved
fn validate_dcr_transition(
    input: &DcrRecord,
    output: &DcrRecord,
    signers: &BTreeSet<PartyId>,
    policy: &dyn SignerPolicy,
) -> Result<(), Violation> {
    if output.linear_id != input.linear_id {
        return Err(Violation::IdentityChanged);
    }
    if output.version != input.version + 1 {
        return Err(Violation::VersionSkip);
    }
    if output.owner != input.owner
        || output.issuer != input.issuer
        || output.value != input.value
        || output.currency != input.currency
        || output.created_at != input.created_at
    {
        return Err(Violation::ImmutableFieldChanged);
    }

    let kind = match (input.status, output.status) {
        (DcrStatus::Available, DcrStatus::Earmarked) => TransitionKind::Earmark,
        (DcrStatus::Earmarked, DcrStatus::Confirmed) => TransitionKind::Confirm,
        (DcrStatus::Earmarked, DcrStatus::Cancelled) => TransitionKind::Cancel,
        (from, to) => return Err(Violation::IllegalEdge { from, to }),
    };

    match kind {
        TransitionKind::Earmark => {
            let bound = output
                .trade_id
                .as_ref()
                .ok_or(Violation::MissingTradeBinding)?;
            if let Some(prior) = input.trade_id.as_ref() {
                if prior != bound {
                    return Err(Violation::TradeRebinding);
                }
            }
        }
        TransitionKind::Confirm => {
            if output.trade_id != input.trade_id {
                return Err(Violation::TradeRebinding);
            }
            if output.proof.is_none() {
                return Err(Violation::MissingProof);
            }
        }
        TransitionKind::Cancel => {
            if output.trade_id != input.trade_id {
                return Err(Violation::TradeRebinding);
            }
        }
        _ => {}
    }

    let required = policy.dcr_signers(input, kind);
    if !required.is_subset(signers) {
        return Err(Violation::MissingSigners);
    }

    Ok(())
}

fn validate_xvp_create(
    output: &XvpRecord,
    signers: &BTreeSet<PartyId>,
    policy: &dyn SignerPolicy,
    allow_single_party_trades: bool,
) -> Result<(), Violation> {
    if output.version != 1 {
        return Err(Violation::CreateBadVersion);
    }
    if output.status != XvpStatus::Pending {
        return Err(Violation::CreateWrongStatus);
    }
    if output.sender == output.receiver && !allow_single_party_trades {
        return Err(Violation::SenderIsReceiver);
    }

    let required = policy.xvp_signers(output, TransitionKind::Create);
    if !required.is_subset(signers) {
        return Err(Violation::MissingSigners);
    }

    Ok(())
}

fn validate_xvp_transition(input: &XvpRecord, output: &XvpRecord) -> Result<(), Violation> {
    if output.linear_id != input.linear_id {
        return Err(Violation::IdentityChanged);
    }
    if output.version != input.version + 1 {
        return Err(Violation::VersionSkip);
    }
    if output.trade_id != input.trade_id
        || output.asset_id != input.asset_id
        || output.sender != input.sender
        || output.receiver != input.receiver
        || output.created_at != input.created_at
    {
        return Err(Violation::ImmutableFieldChanged);
    }

    if input.status.is_terminal() {
        return Err(Violation::TerminalTrade);
    }

    match (input.status, output.status) {
        (XvpStatus::Pending, XvpStatus::ResolvedSuccess)
        | (XvpStatus::Pending, XvpStatus::ResolvedFailed) => Ok(()),
        (from, to) => Err(Violation::IllegalTradeEdge { from, to }),
    }
}
