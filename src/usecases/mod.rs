//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the simulator's workflows.
//!
//! Use cases:
//! - `MatchOrchestrator`: One full settlement recalculation
//! - `CollateralFlow`: Net collateral breakdown of a settlement
//! - `Workbench`: Editable order set with import/export

pub mod collateral_flow;
pub mod matcher;
pub mod workbench;

pub use collateral_flow::{CollateralFlow, FlowEntry};
pub use matcher::{
  LiquidityWarning, MakerError, MakerResult, MatchOrchestrator, OrderStatus, SettlementResult,
  SettlementSummary, SummaryError, TakerError, TakerResult,
};
pub use workbench::Workbench;
