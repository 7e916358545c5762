//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the order arithmetic, the exchange
//! ledger and the match orchestrator keep their invariants across
//! random inputs.

use proptest::prelude::*;
use rust_decimal::Decimal;

use ctf_match_simulator::adapters::persistence::document;
use ctf_match_simulator::domain::arithmetic::{
    derive_match_type, price, taking_amount, taking_amount_rounded,
};
use ctf_match_simulator::domain::{
    AssetKind, ExchangeLedger, MakerId, MakerOrder, MatchType, Order, Side, SideToken, Token,
};
use ctf_match_simulator::ports::OrderSet;
use ctf_match_simulator::usecases::matcher::compute;

// ── Strategies ──────────────────────────────────────────────

/// Amounts with up to six fractional digits, zero included.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000, 0u32..=6).prop_map(|(n, scale)| Decimal::new(n, scale))
}

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000, 0u32..=6).prop_map(|(n, scale)| Decimal::new(n, scale))
}

/// Any 64-bit mantissa with up to eighteen fractional digits; more than
/// an `f64` can carry.
fn precise_amount() -> impl Strategy<Value = Decimal> {
    (0i64..i64::MAX, 0u32..=18).prop_map(|(n, scale)| Decimal::new(n, scale))
}

fn precise_order() -> impl Strategy<Value = Order> {
    (side(), token(), precise_amount(), precise_amount(), precise_amount()).prop_map(
        |(side, token, maker_amount, taker_amount, making)| {
            Order::new(SideToken::new(side, token), maker_amount, taker_amount, making)
        },
    )
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn token() -> impl Strategy<Value = Token> {
    prop_oneof![Just(Token::Yes), Just(Token::No)]
}

fn asset() -> impl Strategy<Value = AssetKind> {
    prop_oneof![
        Just(AssetKind::Collateral),
        Just(AssetKind::Yes),
        Just(AssetKind::No)
    ]
}

fn match_type() -> impl Strategy<Value = MatchType> {
    prop_oneof![
        Just(MatchType::Mint),
        Just(MatchType::Merge),
        Just(MatchType::Complementary)
    ]
}

fn order() -> impl Strategy<Value = Order> {
    (side(), token(), amount(), amount(), amount()).prop_map(
        |(side, token, maker_amount, taker_amount, making)| {
            Order::new(SideToken::new(side, token), maker_amount, taker_amount, making)
        },
    )
}

fn makers() -> impl Strategy<Value = Vec<MakerOrder>> {
    prop::collection::vec(order(), 0..5).prop_map(|orders| {
        orders
            .into_iter()
            .zip(1..)
            .map(|(order, n)| MakerOrder::new(MakerId(n), order))
            .collect()
    })
}

// ── Order Arithmetic Properties ─────────────────────────────

proptest! {
    /// Rounded taking amount is the floor of the exact amount.
    #[test]
    fn taking_amount_rounded_is_floor(
        making in amount(),
        maker_amount in positive_amount(),
        taker_amount in amount(),
    ) {
        let exact = taking_amount(making, maker_amount, taker_amount);
        let rounded = taking_amount_rounded(making, maker_amount, taker_amount);
        prop_assert_eq!(rounded, exact.floor());
        prop_assert!(rounded <= exact);
    }

    /// A zero maker amount never divides; it yields zero.
    #[test]
    fn taking_amount_zero_maker_amount(making in amount(), taker_amount in amount()) {
        prop_assert_eq!(taking_amount(making, Decimal::ZERO, taker_amount), Decimal::ZERO);
        prop_assert_eq!(taking_amount_rounded(making, Decimal::ZERO, taker_amount), Decimal::ZERO);
    }

    /// Prices are never negative for non-negative amounts.
    #[test]
    fn price_non_negative(side in side(), maker_amount in amount(), taker_amount in amount()) {
        prop_assert!(price(side, maker_amount, taker_amount) >= Decimal::ZERO);
    }

    /// Swapping taker and maker never changes the match type.
    #[test]
    fn match_type_symmetric(a in side(), b in side()) {
        prop_assert_eq!(derive_match_type(a, b), derive_match_type(b, a));
    }
}

// ── Exchange Ledger Properties ──────────────────────────────

proptest! {
    /// COMPLEMENTARY records two steps, MINT and MERGE three.
    #[test]
    fn apply_match_step_count(
        match_type in match_type(),
        making in amount(),
        taking in amount(),
        maker_asset in asset(),
        taker_asset in asset(),
    ) {
        let mut ledger = ExchangeLedger::new();
        let execution = ledger.apply_match(match_type, making, taking, maker_asset, taker_asset);
        let expected = if match_type == MatchType::Complementary { 2 } else { 3 };
        prop_assert_eq!(execution.steps.len(), expected);
        prop_assert_eq!(execution.final_state, ledger.snapshot());
    }

    /// Each step starts from the state the previous one ended in.
    #[test]
    fn apply_match_steps_chain(
        match_type in match_type(),
        making in amount(),
        taking in amount(),
        maker_asset in asset(),
        taker_asset in asset(),
    ) {
        let mut ledger = ExchangeLedger::new();
        let execution = ledger.apply_match(match_type, making, taking, maker_asset, taker_asset);
        for pair in execution.steps.windows(2) {
            prop_assert_eq!(pair[0].after, pair[1].before);
        }
        prop_assert_eq!(execution.steps.last().map(|s| s.after), Some(execution.final_state));
    }
}

// ── Orchestrator Properties ─────────────────────────────────

proptest! {
    /// Two passes over the same input produce identical results.
    #[test]
    fn compute_is_idempotent(taker in order(), makers in makers()) {
        prop_assert_eq!(compute(&taker, &makers), compute(&taker, &makers));
    }

    /// The collateral breakdown nets out to the exchange's final collateral.
    #[test]
    fn collateral_flow_balances(taker in order(), makers in makers()) {
        let result = compute(&taker, &makers);
        if let Some(summary) = result.summary {
            prop_assert_eq!(summary.collateral_flow.net(), summary.after_payout.collateral);
            prop_assert_eq!(summary.success, summary.errors.is_empty());
        }
    }

    /// The taker is never promised a negative payout.
    #[test]
    fn actually_receives_non_negative(taker in order(), makers in makers()) {
        let result = compute(&taker, &makers);
        prop_assert!(result.taker.actually_receives >= Decimal::ZERO);
        prop_assert_eq!(result.makers.len(), makers.len());
    }
}

// ── Document Properties ─────────────────────────────────────

proptest! {
    /// Export then import reproduces every order exactly.
    #[test]
    fn document_round_trip(
        taker in precise_order(),
        orders in prop::collection::vec(precise_order(), 0..5),
    ) {
        let set = OrderSet { taker, makers: orders };
        let json = document::encode(&set).unwrap();
        prop_assert_eq!(document::decode(&json).unwrap(), set);
    }
}
