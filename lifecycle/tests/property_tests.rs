//! Property-based tests for transition invariants
//!
//! These tests use proptest to verify the validator's contract:
//! - Non-negative values always accepted, negative always rejected
//! - owner == issuer always rejected regardless of value and currency
//! - Terminal reservation states are sticky under every proposed edge
//! - Creations always produce exactly version one

use chrono::Utc;
use lifecycle::{validate, DefaultSignerPolicy, Violation};
use proptest::prelude::*;
use record_store::{
    CandidateTransition, Currency, DcrRecord, DcrStatus, LinearId, PartyId, TradeId,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Strategy for generating non-negative amounts (in minor units)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..1_000_000_00u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for generating currencies
fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::AED),
        Just(Currency::INR),
    ]
}

/// Strategy for generating party names
fn party_strategy() -> impl Strategy<Value = PartyId> {
    "[A-Z][a-z]{2,8}Bank".prop_map(PartyId::new)
}

/// Strategy for generating reservation statuses
fn status_strategy() -> impl Strategy<Value = DcrStatus> {
    prop_oneof![
        Just(DcrStatus::Available),
        Just(DcrStatus::Earmarked),
        Just(DcrStatus::Confirmed),
        Just(DcrStatus::Cancelled),
    ]
}

fn creation(owner: PartyId, issuer: PartyId, value: Decimal, currency: Currency) -> DcrRecord {
    let now = Utc::now();
    DcrRecord {
        linear_id: LinearId::generate(),
        version: 1,
        owner,
        issuer,
        value,
        currency,
        trade_id: None,
        proof: None,
        status: DcrStatus::Available,
        created_at: now,
        updated_at: now,
    }
}

fn signers_for(record: &DcrRecord) -> BTreeSet<PartyId> {
    [record.owner.clone(), record.issuer.clone()]
        .into_iter()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: creations with non-negative values and both signatures are
    /// always accepted
    #[test]
    fn prop_non_negative_values_accepted(
        value in amount_strategy(),
        currency in currency_strategy(),
    ) {
        let record = creation(
            PartyId::new("BankA"),
            PartyId::new("CentralBank"),
            value,
            currency,
        );
        let signers = signers_for(&record);

        let result = validate(
            &CandidateTransition::Dcr { input: None, output: record, signers },
            &DefaultSignerPolicy,
            true,
        );
        prop_assert!(result.is_ok());
    }

    /// Property: negative values are always rejected with the specific
    /// non-negativity reason
    #[test]
    fn prop_negative_values_rejected(
        cents in 1u64..1_000_000_00u64,
        currency in currency_strategy(),
    ) {
        let record = creation(
            PartyId::new("BankA"),
            PartyId::new("CentralBank"),
            -Decimal::new(cents as i64, 2),
            currency,
        );
        let signers = signers_for(&record);

        let result = validate(
            &CandidateTransition::Dcr { input: None, output: record, signers },
            &DefaultSignerPolicy,
            true,
        );
        prop_assert_eq!(result, Err(Violation::NegativeValue));
    }

    /// Property: owner == issuer is rejected regardless of value and currency
    #[test]
    fn prop_owner_is_issuer_always_rejected(
        party in party_strategy(),
        value in amount_strategy(),
        currency in currency_strategy(),
    ) {
        let record = creation(party.clone(), party.clone(), value, currency);
        let signers: BTreeSet<PartyId> = [party].into_iter().collect();

        let result = validate(
            &CandidateTransition::Dcr { input: None, output: record, signers },
            &DefaultSignerPolicy,
            true,
        );
        prop_assert_eq!(result, Err(Violation::OwnerIsIssuer));
    }

    /// Property: no edge out of a terminal state is ever legal
    #[test]
    fn prop_terminal_states_sticky(
        from in prop_oneof![Just(DcrStatus::Confirmed), Just(DcrStatus::Cancelled)],
        to in status_strategy(),
    ) {
        let mut input = creation(
            PartyId::new("BankA"),
            PartyId::new("CentralBank"),
            Decimal::ONE,
            Currency::GBP,
        );
        input.status = from;
        input.trade_id = Some(TradeId::new("123"));

        let mut output = input.supersede();
        output.status = to;
        let signers = signers_for(&input);

        let result = validate(
            &CandidateTransition::Dcr { input: Some(input), output, signers },
            &DefaultSignerPolicy,
            true,
        );
        prop_assert_eq!(result, Err(Violation::IllegalEdge { from, to }));
    }

    /// Property: a creation producing any version other than one is rejected
    #[test]
    fn prop_creation_version_must_be_one(version in 2u64..1000) {
        let mut record = creation(
            PartyId::new("BankA"),
            PartyId::new("CentralBank"),
            Decimal::ONE,
            Currency::GBP,
        );
        record.version = version;
        let signers = signers_for(&record);

        let result = validate(
            &CandidateTransition::Dcr { input: None, output: record, signers },
            &DefaultSignerPolicy,
            true,
        );
        prop_assert_eq!(result, Err(Violation::CreateBadVersion));
    }
}
