//! Domain layer - settlement arithmetic and the exchange ledger.
//!
//! Pure, synchronous logic with no I/O (hexagonal architecture inner ring).
//! Everything here is deterministic: the same orders always produce the
//! same balances and the same step trace.

pub mod arithmetic;
pub mod ledger;
pub mod order;

// Re-export core types for convenience
pub use arithmetic::{AssetIds, MatchType};
pub use ledger::{ExchangeLedger, ExecutionStep, LedgerSnapshot, MatchExecution, Operation};
pub use order::{AssetKind, MakerId, MakerOrder, Order, OrderError, Side, SideToken, Token};
