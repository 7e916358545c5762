//! Order arithmetic for the CTF exchange.
//!
//! Pure functions mirroring the exchange contract's matching rules:
//! taking amounts, limit prices, the asset each order gives and takes,
//! the settlement path (mint / merge / complementary) and the crossing
//! condition between a taker and a maker.
//!
//! Every function is total. Zero denominators yield zero rather than an
//! error, and rounding is always floor so no counterparty is ever
//! over-credited.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::{AssetKind, Order, Side, SideToken};

/// Settlement path required to match two orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    /// BUY vs BUY on opposite tokens: collateral is split into a YES + NO pair.
    Mint,
    /// SELL vs SELL on opposite tokens: a YES + NO pair is redeemed for collateral.
    Merge,
    /// BUY vs SELL on the same token: direct swap.
    Complementary,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => write!(f, "MINT"),
            Self::Merge => write!(f, "MERGE"),
            Self::Complementary => write!(f, "COMPLEMENTARY"),
        }
    }
}

/// Asset an order gives to the exchange and the asset it takes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIds {
    pub maker_asset: AssetKind,
    pub taker_asset: AssetKind,
}

/// `making * taker_amount / maker_amount`, or zero when `maker_amount` is zero.
///
/// Saturates at `Decimal::MAX` instead of panicking on overflow.
pub fn taking_amount(making: Decimal, maker_amount: Decimal, taker_amount: Decimal) -> Decimal {
    if maker_amount.is_zero() {
        return Decimal::ZERO;
    }
    making
        .checked_mul(taker_amount)
        .and_then(|product| product.checked_div(maker_amount))
        .unwrap_or(Decimal::MAX)
}

/// Floor of [`taking_amount`].
pub fn taking_amount_rounded(
    making: Decimal,
    maker_amount: Decimal,
    taker_amount: Decimal,
) -> Decimal {
    taking_amount(making, maker_amount, taker_amount).floor()
}

/// Collateral paid or received per outcome token.
///
/// For a BUY the maker amount is collateral, for a SELL the taker amount is.
pub fn price(side: Side, maker_amount: Decimal, taker_amount: Decimal) -> Decimal {
    let (collateral, tokens) = match side {
        Side::Buy => (maker_amount, taker_amount),
        Side::Sell => (taker_amount, maker_amount),
    };
    if tokens.is_zero() {
        return Decimal::ZERO;
    }
    collateral.checked_div(tokens).unwrap_or(Decimal::MAX)
}

/// Price of an order at its own limit ratio.
pub fn order_price(order: &Order) -> Decimal {
    price(order.side, order.maker_amount, order.taker_amount)
}

/// BUY gives collateral and takes the token; SELL gives the token and takes collateral.
pub const fn derive_asset_ids(side_token: SideToken) -> AssetIds {
    match side_token.side {
        Side::Buy => AssetIds {
            maker_asset: AssetKind::Collateral,
            taker_asset: side_token.token.asset(),
        },
        Side::Sell => AssetIds {
            maker_asset: side_token.token.asset(),
            taker_asset: AssetKind::Collateral,
        },
    }
}

pub const fn derive_match_type(taker_side: Side, maker_side: Side) -> MatchType {
    match (taker_side, maker_side) {
        (Side::Buy, Side::Buy) => MatchType::Mint,
        (Side::Sell, Side::Sell) => MatchType::Merge,
        _ => MatchType::Complementary,
    }
}

/// Whether the taker's and maker's limit prices allow a match.
///
/// - BUY / BUY: prices must sum to at least one full unit of collateral.
/// - SELL / SELL: prices must sum to at most one unit.
/// - BUY / SELL: the buyer's price must be at least the seller's.
pub fn is_crossing(taker: &Order, maker: &Order) -> bool {
    let taker_price = order_price(taker);
    let maker_price = order_price(maker);

    match (taker.side, maker.side) {
        (Side::Buy, Side::Buy) => taker_price.saturating_add(maker_price) >= Decimal::ONE,
        (Side::Sell, Side::Sell) => taker_price.saturating_add(maker_price) <= Decimal::ONE,
        (Side::Buy, Side::Sell) => taker_price >= maker_price,
        (Side::Sell, Side::Buy) => maker_price >= taker_price,
    }
}

/// The two maker legs that can settle against `taker`.
///
/// One is the complementary leg (opposite side, same token), the other the
/// mint/merge leg (same side, complementary token). The BUY leg comes first.
pub const fn compatible_maker_legs(taker: SideToken) -> [SideToken; 2] {
    let same_side = SideToken::new(taker.side, taker.token.complement());
    let opposite_side = SideToken::new(taker.side.opposite(), taker.token);
    match taker.side {
        Side::Buy => [same_side, opposite_side],
        Side::Sell => [opposite_side, same_side],
    }
}

/// Whether `maker` is one of [`compatible_maker_legs`] of `taker`.
pub fn is_compatible_leg(taker: SideToken, maker: SideToken) -> bool {
    compatible_maker_legs(taker).contains(&maker)
}
