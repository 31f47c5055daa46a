//! Required-signers policy
//!
//! Decouples the multi-party signature requirement from any cryptographic
//! scheme: given a record and a transition kind, the policy names the
//! identities that must appear in the transition's signer set. The validator
//! checks set membership; signature byte verification belongs to the
//! finality layer.

use record_store::{DcrRecord, PartyId, XvpRecord};
use std::collections::BTreeSet;

/// Transition kinds a policy distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Record creation
    Create,
    /// Reservation lock (AVAILABLE -> EARMARKED)
    Earmark,
    /// Reservation settlement (EARMARKED -> CONFIRMED)
    Confirm,
    /// Reservation release (EARMARKED -> CANCELLED)
    Cancel,
    /// Trade resolution (PENDING -> RESOLVED_*)
    Resolve,
}

/// Names the identities that must sign a transition
pub trait SignerPolicy: Send + Sync {
    /// Required signers for a reservation transition
    fn dcr_signers(&self, record: &DcrRecord, kind: TransitionKind) -> BTreeSet<PartyId>;

    /// Required signers for a trade-record transition
    fn xvp_signers(&self, record: &XvpRecord, kind: TransitionKind) -> BTreeSet<PartyId>;
}

/// Default policy:
/// - reservation creation is counter-signed by owner and issuer
/// - the owner locks (earmark), the issuer finalizes (confirm/cancel)
/// - trade creation is counter-signed by sender and receiver
/// - resolution is driven by counterpart finality, no local signers
#[derive(Debug, Default)]
pub struct DefaultSignerPolicy;

impl SignerPolicy for DefaultSignerPolicy {
    fn dcr_signers(&self, record: &DcrRecord, kind: TransitionKind) -> BTreeSet<PartyId> {
        match kind {
            TransitionKind::Create => [record.owner.clone(), record.issuer.clone()]
                .into_iter()
                .collect(),
            TransitionKind::Earmark => [record.owner.clone()].into_iter().collect(),
            TransitionKind::Confirm | TransitionKind::Cancel => {
                [record.issuer.clone()].into_iter().collect()
            }
            TransitionKind::Resolve => BTreeSet::new(),
        }
    }

    fn xvp_signers(&self, record: &XvpRecord, kind: TransitionKind) -> BTreeSet<PartyId> {
        match kind {
            TransitionKind::Create => [record.sender.clone(), record.receiver.clone()]
                .into_iter()
                .collect(),
            _ => BTreeSet::new(),
        }
    }
}
