//! Workbench - The Editable Order Set
//!
//! Holds one taker order and an ordered list of maker orders, the way an
//! order-entry screen does. Makers get stable ids that are never reused
//! while the workbench lives; an import starts numbering from scratch.
//!
//! Every mutation is validated against `limits.max_amount` before it is
//! applied. Imports are all-or-nothing: the document is loaded and every
//! order checked first, and only then does it replace the current set.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::config::LimitsConfig;
use crate::domain::arithmetic::compatible_maker_legs;
use crate::domain::{MakerId, MakerOrder, Order, OrderError, Side, SideToken, Token};
use crate::ports::{OrderSet, OrderStore};

use super::matcher::{MatchOrchestrator, SettlementResult};

/// Current orders plus the orchestrator that recomputes them.
#[derive(Debug)]
pub struct Workbench {
  taker: Order,
  makers: Vec<MakerOrder>,
  next_id: u32,
  max_amount: Decimal,
  orchestrator: MatchOrchestrator,
}

impl Workbench {
  /// Empty workbench with a blank BUY YES taker.
  pub fn new(limits: &LimitsConfig) -> Self {
    Self {
      taker: Order::empty(SideToken::new(Side::Buy, Token::Yes)),
      makers: Vec::new(),
      next_id: 1,
      max_amount: limits.max_amount,
      orchestrator: MatchOrchestrator::new(),
    }
  }

  pub const fn taker(&self) -> &Order {
    &self.taker
  }

  pub fn makers(&self) -> &[MakerOrder] {
    &self.makers
  }

  pub fn set_taker(&mut self, order: Order) -> Result<(), OrderError> {
    order.validate(self.max_amount)?;
    self.taker = order;
    Ok(())
  }

  /// Append a maker; it settles after every maker already present.
  pub fn add_maker(&mut self, order: Order) -> Result<MakerId, OrderError> {
    order.validate(self.max_amount)?;
    let id = MakerId(self.next_id);
    self.next_id = self.next_id.saturating_add(1);
    self.makers.push(MakerOrder::new(id, order));
    debug!(maker = %id, side_token = %order.side_token(), "Maker added");
    Ok(id)
  }

  /// Replace a maker in place. Returns `Ok(false)` for an unknown id.
  pub fn update_maker(&mut self, id: MakerId, order: Order) -> Result<bool, OrderError> {
    order.validate(self.max_amount)?;
    match self.makers.iter_mut().find(|m| m.id == id) {
      Some(maker) => {
        maker.order = order;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  pub fn remove_maker(&mut self, id: MakerId) -> bool {
    let before = self.makers.len();
    self.makers.retain(|m| m.id != id);
    self.makers.len() != before
  }

  /// Maker legs that can settle against the current taker.
  pub const fn maker_options(&self) -> [SideToken; 2] {
    compatible_maker_legs(self.taker.side_token())
  }

  /// Taker plus complete makers, in order. Incomplete makers are not exported.
  pub fn order_set(&self) -> OrderSet {
    OrderSet {
      taker: self.taker,
      makers: self
        .makers
        .iter()
        .filter(|m| m.order.is_complete())
        .map(|m| m.order)
        .collect(),
    }
  }

  /// Replace everything with the store's contents. Returns the maker count.
  ///
  /// On any error the workbench is left exactly as it was.
  #[instrument(skip(self, store), fields(location = %store.location()))]
  pub fn import(&mut self, store: &dyn OrderStore) -> Result<usize> {
    let set = store.load()?;

    set
      .taker
      .validate(self.max_amount)
      .context("invalid takerOrder")?;
    for (i, maker) in set.makers.iter().enumerate() {
      maker
        .validate(self.max_amount)
        .with_context(|| format!("invalid makerOrders[{i}]"))?;
    }

    let count = set.makers.len();
    self.taker = set.taker;
    self.makers = set
      .makers
      .into_iter()
      .zip(1..)
      .map(|(order, n)| MakerOrder::new(MakerId(n), order))
      .collect();
    self.next_id = u32::try_from(count).map_or(u32::MAX, |n| n.saturating_add(1));

    info!(makers = count, taker = %self.taker.side_token(), "Orders imported");
    Ok(count)
  }

  #[instrument(skip(self, store), fields(location = %store.location()))]
  pub fn export(&self, store: &dyn OrderStore) -> Result<()> {
    let set = self.order_set();
    store.save(&set).context("Failed to export orders")?;
    info!(makers = set.makers.len(), "Orders exported");
    Ok(())
  }

  /// Recompute the settlement from a zeroed ledger.
  pub fn compute(&mut self) -> SettlementResult {
    self.orchestrator.compute(&self.taker, &self.makers)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ports::order_store::MockOrderStore;
  use rust_decimal_macros::dec;

  fn limits() -> LimitsConfig {
    LimitsConfig {
      max_amount: dec!(1000000),
    }
  }

  fn order(side: Side, token: Token, maker_amount: Decimal, taker_amount: Decimal) -> Order {
    Order::new(SideToken::new(side, token), maker_amount, taker_amount, maker_amount)
  }

  fn store_returning(set: OrderSet) -> MockOrderStore {
    let mut store = MockOrderStore::new();
    store.expect_location().return_const("mock".to_string());
    store.expect_load().times(1).return_once(move || Ok(set));
    store
  }

  #[test]
  fn test_ids_are_stable_and_not_reused() {
    let mut bench = Workbench::new(&limits());
    let a = bench.add_maker(order(Side::Sell, Token::Yes, dec!(10), dec!(5))).unwrap();
    let b = bench.add_maker(order(Side::Sell, Token::Yes, dec!(20), dec!(10))).unwrap();
    assert_eq!((a, b), (MakerId(1), MakerId(2)));

    assert!(bench.remove_maker(a));
    assert!(!bench.remove_maker(a));
    let c = bench.add_maker(order(Side::Buy, Token::No, dec!(5), dec!(10))).unwrap();
    assert_eq!(c, MakerId(3));
    assert_eq!(bench.makers().iter().map(|m| m.id).collect::<Vec<_>>(), vec![b, c]);
  }

  #[test]
  fn test_update_maker() {
    let mut bench = Workbench::new(&limits());
    let id = bench.add_maker(order(Side::Sell, Token::Yes, dec!(10), dec!(5))).unwrap();
    let replacement = order(Side::Buy, Token::No, dec!(7), dec!(9));

    assert!(bench.update_maker(id, replacement).unwrap());
    assert_eq!(bench.makers()[0].order, replacement);
    assert!(!bench.update_maker(MakerId(99), replacement).unwrap());
  }

  #[test]
  fn test_rejects_out_of_range_amounts() {
    let mut bench = Workbench::new(&limits());
    assert!(matches!(
      bench.add_maker(order(Side::Sell, Token::Yes, dec!(-1), dec!(5))),
      Err(OrderError::NegativeAmount { .. })
    ));
    assert!(matches!(
      bench.set_taker(order(Side::Buy, Token::Yes, dec!(2000000), dec!(5))),
      Err(OrderError::AmountTooLarge { .. })
    ));
    assert!(bench.makers().is_empty());
    assert!(!bench.taker().is_complete());
  }

  #[test]
  fn test_maker_options_follow_taker() {
    let mut bench = Workbench::new(&limits());
    bench.set_taker(order(Side::Sell, Token::No, dec!(10), dec!(5))).unwrap();
    assert_eq!(
      bench.maker_options(),
      [SideToken::new(Side::Buy, Token::No), SideToken::new(Side::Sell, Token::Yes)]
    );
  }

  #[test]
  fn test_import_replaces_and_renumbers() {
    let mut bench = Workbench::new(&limits());
    bench.add_maker(order(Side::Sell, Token::Yes, dec!(1), dec!(1))).unwrap();
    bench.add_maker(order(Side::Sell, Token::Yes, dec!(1), dec!(1))).unwrap();

    let set = OrderSet {
      taker: order(Side::Buy, Token::Yes, dec!(50), dec!(100)),
      makers: vec![order(Side::Sell, Token::Yes, dec!(100), dec!(50))],
    };
    let store = store_returning(set.clone());

    assert_eq!(bench.import(&store).unwrap(), 1);
    assert_eq!(*bench.taker(), set.taker);
    assert_eq!(bench.makers()[0].id, MakerId(1));
    assert_eq!(bench.add_maker(set.makers[0]).unwrap(), MakerId(2));
  }

  #[test]
  fn test_failed_import_leaves_workbench_unchanged() {
    let mut bench = Workbench::new(&limits());
    let taker = order(Side::Buy, Token::Yes, dec!(50), dec!(100));
    bench.set_taker(taker).unwrap();
    bench.add_maker(order(Side::Sell, Token::Yes, dec!(100), dec!(50))).unwrap();

    let store = store_returning(OrderSet {
      taker: order(Side::Sell, Token::No, dec!(1), dec!(1)),
      makers: vec![
        order(Side::Sell, Token::Yes, dec!(1), dec!(1)),
        order(Side::Sell, Token::Yes, dec!(-5), dec!(1)),
      ],
    });
    let err = bench.import(&store).unwrap_err();
    assert!(err.to_string().contains("makerOrders[1]"));

    let mut failing = MockOrderStore::new();
    failing.expect_location().return_const("mock".to_string());
    failing
      .expect_load()
      .return_once(|| Err(anyhow::anyhow!("missing \"makerOrders\"")));
    assert!(bench.import(&failing).is_err());

    assert_eq!(*bench.taker(), taker);
    assert_eq!(bench.makers().len(), 1);
  }

  #[test]
  fn test_export_skips_incomplete_makers() {
    let mut bench = Workbench::new(&limits());
    bench.set_taker(order(Side::Buy, Token::Yes, dec!(50), dec!(100))).unwrap();
    bench.add_maker(order(Side::Sell, Token::Yes, dec!(100), dec!(50))).unwrap();
    bench
      .add_maker(Order::empty(SideToken::new(Side::Buy, Token::No)))
      .unwrap();

    let mut store = MockOrderStore::new();
    store.expect_location().return_const("mock".to_string());
    store
      .expect_save()
      .withf(|set: &OrderSet| set.makers.len() == 1)
      .times(1)
      .returning(|_| Ok(()));

    bench.export(&store).unwrap();
  }

  #[test]
  fn test_compute_is_repeatable() {
    let mut bench = Workbench::new(&limits());
    bench.set_taker(order(Side::Buy, Token::Yes, dec!(50), dec!(100))).unwrap();
    bench.add_maker(order(Side::Sell, Token::Yes, dec!(100), dec!(50))).unwrap();

    let first = bench.compute();
    assert!(first.is_success());
    assert_eq!(bench.compute(), first);
  }
}
