//! Match Orchestrator - One Full Settlement Recalculation
//!
//! Replays a taker order against an ordered list of maker orders on a
//! fresh exchange ledger and reports, per order and in aggregate, what
//! each party receives and where liquidity falls short.
//!
//! Recalculation flow:
//! 1. Reset the ledger
//! 2. Credit the taker's deposit (if any)
//! 3. Settle each maker in input order (first come, first settled)
//! 4. Pay the taker whatever the ledger still holds of the asset it takes
//! 5. Flag shortfalls and negative balances
//!
//! Nothing is rolled back. A maker that drives a balance negative is
//! still settled and only carries a warning; aggregate deficits are
//! reported in the summary.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::arithmetic::{
  derive_asset_ids, derive_match_type, is_compatible_leg, is_crossing, order_price, taking_amount,
  taking_amount_rounded,
};
use crate::domain::{
  AssetKind, ExchangeLedger, ExecutionStep, LedgerSnapshot, MakerId, MakerOrder, MatchType,
  Operation, Order, SideToken,
};

use super::collateral_flow::CollateralFlow;

/// Outcome of processing one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  /// A required amount is zero; nothing was computed against the ledger.
  Incomplete,
  /// Validation failed; the ledger was not touched.
  Rejected,
  /// Settled against the ledger (possibly with warnings).
  Settled,
}

/// Validation failure that blocks one maker's settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MakerError {
  #[error("Making amount {making} cannot exceed maker amount {maker_amount}")]
  MakingExceedsMakerAmount {
    making: Decimal,
    maker_amount: Decimal,
  },
  #[error(
    "Orders are not crossing - prices do not allow profitable match (taker {taker_price}, maker {maker_price})"
  )]
  NotCrossing {
    taker_price: Decimal,
    maker_price: Decimal,
  },
}

/// Informational liquidity shortfall; the settlement still went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LiquidityWarning {
  #[error("TooLittleTokensReceived: Insufficient {asset} in exchange after maker {maker} ({balance})")]
  TooLittleTokensReceived {
    maker: MakerId,
    asset: AssetKind,
    balance: Decimal,
  },
}

/// Problem with the taker order itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TakerError {
  #[error("Making amount {making} cannot exceed maker amount {maker_amount}")]
  MakingExceedsMakerAmount {
    making: Decimal,
    maker_amount: Decimal,
  },
  #[error(
    "TooLittleTokensReceived: Taker expects {expected} {asset} tokens, but exchange only has {available}"
  )]
  TooLittleTokensReceived {
    expected: Decimal,
    available: Decimal,
    asset: AssetKind,
  },
}

/// Aggregate failure computed after every maker has been replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SummaryError {
  #[error(
    "TooLittleTokensReceived: Taker expects {expected} {asset} tokens, but exchange only has {available}"
  )]
  TooLittleTokensReceived {
    expected: Decimal,
    available: Decimal,
    asset: AssetKind,
  },
  #[error("Insufficient {asset}: {balance}")]
  InsufficientBalance { asset: AssetKind, balance: Decimal },
}

/// Per-maker outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakerResult {
  pub id: MakerId,
  pub side_token: SideToken,
  pub status: OrderStatus,
  /// `None` for incomplete orders.
  pub match_type: Option<MatchType>,
  /// Whether the maker's leg is one the taker can settle against.
  pub compatible: bool,
  pub crossing: bool,
  /// Floor of the exact taking amount; this is what the maker is paid.
  pub taking: Decimal,
  pub taking_exact: Decimal,
  pub price: Decimal,
  /// Ledger balances after this maker was processed.
  pub final_balances: LedgerSnapshot,
  pub steps: Vec<ExecutionStep>,
  pub errors: Vec<MakerError>,
  pub warnings: Vec<LiquidityWarning>,
}

/// Taker outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakerResult {
  pub side_token: SideToken,
  pub status: OrderStatus,
  pub taking: Decimal,
  pub taking_exact: Decimal,
  /// Ledger balance of the taker's asset after all makers, floored at zero.
  pub actually_receives: Decimal,
  pub price: Decimal,
  pub final_balances: LedgerSnapshot,
  pub deposit_step: Option<ExecutionStep>,
  pub errors: Vec<TakerError>,
}

/// Aggregate view once the taker has been paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
  pub before_payout: LedgerSnapshot,
  /// Display-only; never fed back into the ledger.
  pub payout_step: ExecutionStep,
  pub after_payout: LedgerSnapshot,
  pub collateral_flow: CollateralFlow,
  pub errors: Vec<SummaryError>,
  pub warnings: Vec<LiquidityWarning>,
  pub success: bool,
}

/// Everything one recalculation produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
  pub taker: TakerResult,
  pub makers: Vec<MakerResult>,
  /// `None` until the taker has a fill and at least one maker is complete.
  pub summary: Option<SettlementSummary>,
}

impl SettlementResult {
  pub fn is_success(&self) -> bool {
    self.summary.as_ref().is_some_and(|s| s.success)
  }
}

/// Drives the arithmetic and the ledger for one recalculation at a time.
///
/// The orchestrator owns its ledger exclusively and resets it at the
/// start of every [`compute`](Self::compute), so passes never observe
/// each other's state.
#[derive(Debug, Default)]
pub struct MatchOrchestrator {
  ledger: ExchangeLedger,
}

impl MatchOrchestrator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Use an explicitly constructed ledger.
  pub const fn with_ledger(ledger: ExchangeLedger) -> Self {
    Self { ledger }
  }

  /// Replay `taker` against `makers` from a zeroed ledger.
  pub fn compute(&mut self, taker: &Order, makers: &[MakerOrder]) -> SettlementResult {
    self.ledger.reset();

    let taker_assets = derive_asset_ids(taker.side_token());
    let deposit_step = (taker.making > Decimal::ZERO)
      .then(|| self.ledger.deposit(taker_assets.maker_asset, taker.making));

    let maker_results: Vec<MakerResult> =
      makers.iter().map(|maker| self.settle_maker(taker, maker)).collect();

    let final_state = self.ledger.snapshot();
    let taker_result = taker_result(taker, deposit_step, final_state);

    let has_complete_maker = maker_results
      .iter()
      .any(|r| r.status != OrderStatus::Incomplete);
    let summary = (taker.making > Decimal::ZERO && has_complete_maker)
      .then(|| summarize(taker, makers, &maker_results, &taker_result, final_state));

    info!(
      taker = %taker.side_token(),
      makers = maker_results.len(),
      settled = maker_results.iter().filter(|r| r.status == OrderStatus::Settled).count(),
      actually_receives = %taker_result.actually_receives,
      success = summary.as_ref().map(|s| s.success),
      "Recalculation complete"
    );

    SettlementResult {
      taker: taker_result,
      makers: maker_results,
      summary,
    }
  }

  fn settle_maker(&mut self, taker: &Order, maker: &MakerOrder) -> MakerResult {
    let order = &maker.order;
    let mut result = MakerResult {
      id: maker.id,
      side_token: order.side_token(),
      status: OrderStatus::Incomplete,
      match_type: None,
      compatible: is_compatible_leg(taker.side_token(), order.side_token()),
      crossing: false,
      taking: taking_amount_rounded(order.making, order.maker_amount, order.taker_amount),
      taking_exact: taking_amount(order.making, order.maker_amount, order.taker_amount),
      price: order_price(order),
      final_balances: self.ledger.snapshot(),
      steps: Vec::new(),
      errors: Vec::new(),
      warnings: Vec::new(),
    };

    if !order.is_complete() {
      debug!(maker = %maker.id, "Maker order incomplete, skipping");
      return result;
    }

    let match_type = derive_match_type(taker.side, order.side);
    result.match_type = Some(match_type);
    result.crossing = is_crossing(taker, order);

    if order.overfilled() {
      result.errors.push(MakerError::MakingExceedsMakerAmount {
        making: order.making,
        maker_amount: order.maker_amount,
      });
    }
    if !result.crossing {
      result.errors.push(MakerError::NotCrossing {
        taker_price: order_price(taker),
        maker_price: result.price,
      });
    }
    if !result.errors.is_empty() {
      debug!(
        maker = %maker.id,
        errors = result.errors.len(),
        "Maker order rejected"
      );
      result.status = OrderStatus::Rejected;
      return result;
    }

    let assets = derive_asset_ids(order.side_token());
    let execution = self.ledger.apply_match(
      match_type,
      order.making,
      result.taking,
      assets.maker_asset,
      assets.taker_asset,
    );

    let balance = execution.final_state.balance(assets.taker_asset);
    if balance < Decimal::ZERO {
      warn!(
        maker = %maker.id,
        asset = %assets.taker_asset,
        balance = %balance,
        "Exchange short after maker payout"
      );
      result.warnings.push(LiquidityWarning::TooLittleTokensReceived {
        maker: maker.id,
        asset: assets.taker_asset,
        balance,
      });
    }

    debug!(
      maker = %maker.id,
      match_type = %match_type,
      taking = %result.taking,
      "Maker order settled"
    );

    result.status = OrderStatus::Settled;
    result.final_balances = execution.final_state;
    result.steps = execution.steps;
    result
  }
}

/// Run one recalculation on a fresh orchestrator.
pub fn compute(taker: &Order, makers: &[MakerOrder]) -> SettlementResult {
  MatchOrchestrator::new().compute(taker, makers)
}

fn taker_result(
  taker: &Order,
  deposit_step: Option<ExecutionStep>,
  final_state: LedgerSnapshot,
) -> TakerResult {
  let assets = derive_asset_ids(taker.side_token());
  let taking = taking_amount_rounded(taker.making, taker.maker_amount, taker.taker_amount);
  let actually_receives = final_state.balance(assets.taker_asset).max(Decimal::ZERO);

  let mut result = TakerResult {
    side_token: taker.side_token(),
    status: OrderStatus::Incomplete,
    taking,
    taking_exact: taking_amount(taker.making, taker.maker_amount, taker.taker_amount),
    actually_receives,
    price: order_price(taker),
    final_balances: final_state,
    deposit_step,
    errors: Vec::new(),
  };

  if !taker.is_complete() {
    return result;
  }

  if taker.overfilled() {
    result.errors.push(TakerError::MakingExceedsMakerAmount {
      making: taker.making,
      maker_amount: taker.maker_amount,
    });
  }
  if actually_receives < taking {
    result.errors.push(TakerError::TooLittleTokensReceived {
      expected: taking,
      available: actually_receives,
      asset: assets.taker_asset,
    });
  }

  result.status = if result.errors.is_empty() {
    OrderStatus::Settled
  } else {
    OrderStatus::Rejected
  };
  result
}

fn summarize(
  taker: &Order,
  makers: &[MakerOrder],
  maker_results: &[MakerResult],
  taker_result: &TakerResult,
  before_payout: LedgerSnapshot,
) -> SettlementSummary {
  let asset = derive_asset_ids(taker.side_token()).taker_asset;
  let receives = taker_result.actually_receives;

  let payout_step = ExecutionStep {
    operation: Operation::TakerPayout {
      asset,
      amount: receives,
    },
    before: before_payout,
    after: before_payout.after_payout(asset, receives),
  };

  let mut errors = Vec::new();
  if receives < taker_result.taking {
    errors.push(SummaryError::TooLittleTokensReceived {
      expected: taker_result.taking,
      available: receives,
      asset,
    });
  }
  errors.extend(
    before_payout
      .negative_assets()
      .into_iter()
      .map(|(asset, balance)| SummaryError::InsufficientBalance { asset, balance }),
  );

  let warnings = maker_results
    .iter()
    .flat_map(|r| r.warnings.iter().cloned())
    .collect();

  let collateral_flow = CollateralFlow::build(taker, makers, maker_results, receives);

  if !errors.is_empty() {
    warn!(errors = errors.len(), "Settlement would fail");
  }

  SettlementSummary {
    before_payout,
    payout_step,
    after_payout: payout_step.after,
    collateral_flow,
    success: errors.is_empty(),
    errors,
    warnings,
  }
}
