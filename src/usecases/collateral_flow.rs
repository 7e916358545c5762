//! Collateral Flow - Net Collateral Breakdown of a Settlement
//!
//! Attributes every collateral movement on the exchange to the order
//! that caused it. The net of all flows equals the exchange's collateral
//! balance after the taker has been paid.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::arithmetic::derive_asset_ids;
use crate::domain::{AssetKind, MakerId, MakerOrder, MatchType, Order, SideToken};

use super::matcher::{MakerResult, OrderStatus};

/// Collateral moved by one settled maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEntry {
  pub maker: MakerId,
  pub side_token: SideToken,
  pub match_type: MatchType,
  pub taking: Decimal,
  pub collateral_in: Decimal,
  pub collateral_out: Decimal,
}

impl FlowEntry {
  fn for_maker(maker: &MakerOrder, match_type: MatchType, taking: Decimal) -> Self {
    let assets = derive_asset_ids(maker.order.side_token());
    let making = maker.order.making;

    let (collateral_in, collateral_out) = match match_type {
      MatchType::Complementary => (
        if assets.maker_asset == AssetKind::Collateral { making } else { Decimal::ZERO },
        if assets.taker_asset == AssetKind::Collateral { taking } else { Decimal::ZERO },
      ),
      MatchType::Merge | MatchType::Mint => (making, taking),
    };

    Self {
      maker: maker.id,
      side_token: maker.order.side_token(),
      match_type,
      taking,
      collateral_in,
      collateral_out,
    }
  }

  pub fn net(&self) -> Decimal {
    self.collateral_in - self.collateral_out
  }
}

impl fmt::Display for FlowEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let collateral_in = self.collateral_in.normalize();
    let collateral_out = self.collateral_out.normalize();
    match self.match_type {
      MatchType::Complementary if self.collateral_in.is_zero() => {
        write!(f, "-{collateral_out} collateral to maker")
      }
      MatchType::Complementary => write!(f, "+{collateral_in} collateral from maker"),
      MatchType::Merge => write!(
        f,
        "+{collateral_in} collateral (MERGE) - {collateral_out} collateral to maker = {} net",
        self.net().normalize()
      ),
      MatchType::Mint => write!(
        f,
        "+{collateral_in} collateral from maker - {collateral_out} collateral (MINT) = {} net",
        self.net().normalize()
      ),
    }
  }
}

/// Collateral in/out across the taker and every settled maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralFlow {
  pub taker_in: Decimal,
  pub taker_out: Decimal,
  pub entries: Vec<FlowEntry>,
  pub total_in: Decimal,
  pub total_out: Decimal,
}

impl CollateralFlow {
  /// Build the breakdown from the makers and their results (same order).
  ///
  /// Makers that were not settled moved nothing and are left out.
  pub fn build(
    taker: &Order,
    makers: &[MakerOrder],
    results: &[MakerResult],
    taker_receives: Decimal,
  ) -> Self {
    let taker_assets = derive_asset_ids(taker.side_token());
    let taker_in = if taker_assets.maker_asset == AssetKind::Collateral {
      taker.making.max(Decimal::ZERO)
    } else {
      Decimal::ZERO
    };
    let taker_out = if taker_assets.taker_asset == AssetKind::Collateral {
      taker_receives
    } else {
      Decimal::ZERO
    };

    let entries: Vec<FlowEntry> = makers
      .iter()
      .zip(results)
      .filter(|(_, result)| result.status == OrderStatus::Settled)
      .filter_map(|(maker, result)| {
        result
          .match_type
          .map(|match_type| FlowEntry::for_maker(maker, match_type, result.taking))
      })
      .collect();

    let total_in = entries
      .iter()
      .fold(taker_in, |acc, e| acc.saturating_add(e.collateral_in));
    let total_out = entries
      .iter()
      .fold(taker_out, |acc, e| acc.saturating_add(e.collateral_out));

    Self {
      taker_in,
      taker_out,
      entries,
      total_in,
      total_out,
    }
  }

  pub fn net(&self) -> Decimal {
    self.total_in.saturating_sub(self.total_out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Side, Token};
  use crate::usecases::matcher::compute;
  use rust_decimal_macros::dec;

  fn order(side: Side, token: Token, maker_amount: Decimal, taker_amount: Decimal, making: Decimal) -> Order {
    Order::new(SideToken::new(side, token), maker_amount, taker_amount, making)
  }

  #[test]
  fn test_merge_flow_matches_ledger() {
    let taker = order(Side::Sell, Token::Yes, dec!(100), dec!(40), dec!(100));
    let makers = [MakerOrder::new(
      MakerId(1),
      order(Side::Sell, Token::No, dec!(100), dec!(55), dec!(100)),
    )];

    let result = compute(&taker, &makers);
    let summary = result.summary.unwrap();
    let flow = &summary.collateral_flow;

    assert_eq!(flow.entries.len(), 1);
    assert_eq!(flow.entries[0].collateral_in, dec!(100));
    assert_eq!(flow.entries[0].collateral_out, dec!(55));
    assert_eq!(flow.taker_out, dec!(45));
    assert_eq!(flow.net(), summary.after_payout.collateral);
  }

  #[test]
  fn test_rejected_maker_has_no_flow() {
    let taker = order(Side::Buy, Token::Yes, dec!(40), dec!(100), dec!(40));
    let makers = [MakerOrder::new(
      MakerId(1),
      order(Side::Sell, Token::Yes, dec!(100), dec!(50), dec!(100)),
    )];

    let result = compute(&taker, &makers);
    let flow = result.summary.unwrap().collateral_flow;
    assert!(flow.entries.is_empty());
    assert_eq!(flow.taker_in, dec!(40));
    assert_eq!(flow.net(), dec!(40));
  }

  #[test]
  fn test_complementary_entry_display() {
    let maker = MakerOrder::new(
      MakerId(3),
      order(Side::Sell, Token::Yes, dec!(100), dec!(5), dec!(100)),
    );
    let entry = FlowEntry::for_maker(&maker, MatchType::Complementary, dec!(5));
    assert_eq!(entry.to_string(), "-5 collateral to maker");
    assert_eq!(entry.net(), dec!(-5));
  }
}
