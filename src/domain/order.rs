//! Order model for the CTF exchange simulator.
//!
//! Defines sides, outcome tokens, exchange assets and the order record
//! itself. String forms (`"BUY YES"`, `"SELL"`, `"NO"`) are parsed once
//! here at the boundary; the rest of the crate only ever sees the enums.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The other side of the book.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            _ => Err(OrderError::UnknownSide(s.to_string())),
        }
    }
}

/// Outcome token of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    Yes,
    No,
}

impl Token {
    /// The complementary outcome (YES ↔ NO).
    pub const fn complement(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    /// Exchange asset backing this outcome token.
    pub const fn asset(self) -> AssetKind {
        match self {
            Self::Yes => AssetKind::Yes,
            Self::No => AssetKind::No,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

impl FromStr for Token {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Self::Yes),
            "NO" => Ok(Self::No),
            _ => Err(OrderError::UnknownToken(s.to_string())),
        }
    }
}

/// One of the three fungible balances held by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetKind {
    Collateral,
    Yes,
    No,
}

impl AssetKind {
    /// All assets in ledger display order.
    pub const ALL: [Self; 3] = [Self::Collateral, Self::Yes, Self::No];
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collateral => write!(f, "COLLATERAL"),
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Side paired with the outcome token it trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideToken {
    pub side: Side,
    pub token: Token,
}

impl SideToken {
    pub const fn new(side: Side, token: Token) -> Self {
        Self { side, token }
    }

    /// Input labels for the maker / taker amount fields of an order on this leg.
    pub const fn amount_labels(self) -> (&'static str, &'static str) {
        match (self.side, self.token) {
            (Side::Buy, Token::Yes) => ("Collateral to Pay", "YES Tokens to Receive"),
            (Side::Buy, Token::No) => ("Collateral to Pay", "NO Tokens to Receive"),
            (Side::Sell, Token::Yes) => ("YES Tokens to Sell", "Collateral to Receive"),
            (Side::Sell, Token::No) => ("NO Tokens to Sell", "Collateral to Receive"),
        }
    }
}

impl fmt::Display for SideToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.side, self.token)
    }
}

impl FromStr for SideToken {
    type Err = OrderError;

    /// Parses the `"BUY YES"` form used by order-entry widgets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(side), Some(token), None) => Ok(Self::new(side.parse()?, token.parse()?)),
            _ => Err(OrderError::MalformedSideToken(s.to_string())),
        }
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Rejection of an order at the input boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("unknown side {0:?} (expected BUY or SELL)")]
    UnknownSide(String),
    #[error("unknown token {0:?} (expected YES or NO)")]
    UnknownToken(String),
    #[error("malformed side/token {0:?} (expected e.g. \"BUY YES\")")]
    MalformedSideToken(String),
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("{field} of {value} exceeds the maximum of {max}")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
}

// ────────────────────────────────────────────
// Orders
// ────────────────────────────────────────────

/// A signed order as entered by the user.
///
/// `maker_amount` / `taker_amount` fix the limit ratio; `making` is the
/// quantity actually filled in this match and must not exceed
/// `maker_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub side: Side,
    pub token: Token,
    pub maker_amount: Decimal,
    pub taker_amount: Decimal,
    pub making: Decimal,
}

impl Order {
    pub const fn new(
        side_token: SideToken,
        maker_amount: Decimal,
        taker_amount: Decimal,
        making: Decimal,
    ) -> Self {
        Self {
            side: side_token.side,
            token: side_token.token,
            maker_amount,
            taker_amount,
            making,
        }
    }

    /// An order with all amounts zeroed, as a fresh input form would be.
    pub const fn empty(side_token: SideToken) -> Self {
        Self::new(side_token, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    pub const fn side_token(&self) -> SideToken {
        SideToken::new(self.side, self.token)
    }

    /// All three amounts are non-zero.
    pub fn is_complete(&self) -> bool {
        !self.maker_amount.is_zero() && !self.taker_amount.is_zero() && !self.making.is_zero()
    }

    /// The fill exceeds the order's own maker amount.
    pub fn overfilled(&self) -> bool {
        self.making > self.maker_amount
    }

    /// Checks every amount is within `0..=max_amount`.
    pub fn validate(&self, max_amount: Decimal) -> Result<(), OrderError> {
        for (field, value) in [
            ("makerAmount", self.maker_amount),
            ("takerAmount", self.taker_amount),
            ("making", self.making),
        ] {
            if value < Decimal::ZERO {
                return Err(OrderError::NegativeAmount { field, value });
            }
            if value > max_amount {
                return Err(OrderError::AmountTooLarge {
                    field,
                    value,
                    max: max_amount,
                });
            }
        }
        Ok(())
    }
}

/// Stable identifier of a maker order within a workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MakerId(pub u32);

impl fmt::Display for MakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resting maker order bound to its display id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerOrder {
    pub id: MakerId,
    #[serde(flatten)]
    pub order: Order,
}

impl MakerOrder {
    pub const fn new(id: MakerId, order: Order) -> Self {
        Self { id, order }
    }
}
