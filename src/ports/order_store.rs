//! Order Store Port - Import/Export of Order Sets
//!
//! The workbench only knows this trait; where the order document lives
//! (a JSON file, a test double) is an adapter concern.

use serde::{Deserialize, Serialize};

use crate::domain::Order;

/// One taker order plus the maker orders to replay against it, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSet {
  pub taker: Order,
  pub makers: Vec<Order>,
}

/// Source and sink for order documents.
///
/// `load` must either return a fully decoded set or an error; callers
/// rely on never seeing a partially decoded document.
#[cfg_attr(test, mockall::automock)]
pub trait OrderStore {
  /// Read and decode the stored order set.
  fn load(&self) -> anyhow::Result<OrderSet>;

  /// Persist an order set, replacing whatever was stored.
  fn save(&self, set: &OrderSet) -> anyhow::Result<()>;

  /// Human-readable location, for logs.
  fn location(&self) -> String;
}
