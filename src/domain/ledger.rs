//! Exchange ledger - the exchange's own collateral / YES / NO balances.
//!
//! Each match is replayed the way the settlement contract executes it:
//! the maker's funds are transferred in, the conditional mint or merge
//! runs, then the maker is paid out. Every mutation is recorded as an
//! [`ExecutionStep`] with before/after snapshots so a negative balance
//! can be traced to the exact step that produced it.
//!
//! Balances are allowed to go negative; detecting that is the caller's job.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::arithmetic::MatchType;
use super::order::AssetKind;

/// Point-in-time copy of the three exchange balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub collateral: Decimal,
    pub yes: Decimal,
    pub no: Decimal,
}

impl LedgerSnapshot {
    pub const ZERO: Self = Self {
        collateral: Decimal::ZERO,
        yes: Decimal::ZERO,
        no: Decimal::ZERO,
    };

    pub const fn balance(&self, asset: AssetKind) -> Decimal {
        match asset {
            AssetKind::Collateral => self.collateral,
            AssetKind::Yes => self.yes,
            AssetKind::No => self.no,
        }
    }

    fn balance_mut(&mut self, asset: AssetKind) -> &mut Decimal {
        match asset {
            AssetKind::Collateral => &mut self.collateral,
            AssetKind::Yes => &mut self.yes,
            AssetKind::No => &mut self.no,
        }
    }

    /// Assets whose balance is below zero, in display order.
    pub fn negative_assets(&self) -> Vec<(AssetKind, Decimal)> {
        AssetKind::ALL
            .into_iter()
            .map(|asset| (asset, self.balance(asset)))
            .filter(|(_, balance)| *balance < Decimal::ZERO)
            .collect()
    }

    pub fn has_deficit(&self) -> bool {
        AssetKind::ALL
            .into_iter()
            .any(|asset| self.balance(asset) < Decimal::ZERO)
    }

    /// Copy of this snapshot with `amount` of `asset` paid out.
    pub fn after_payout(&self, asset: AssetKind, amount: Decimal) -> Self {
        let mut next = *self;
        let balance = next.balance_mut(asset);
        *balance = balance.saturating_sub(amount);
        next
    }
}

impl fmt::Display for LedgerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} COLLATERAL, {} YES, {} NO",
            self.collateral.normalize(),
            self.yes.normalize(),
            self.no.normalize()
        )
    }
}

/// A single balance transition performed during settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// The taker's own funds arriving before any maker is processed.
    TakerDeposit { asset: AssetKind, amount: Decimal },
    /// Maker funds arriving at the exchange.
    TransferIn { asset: AssetKind, amount: Decimal },
    /// Collateral split into a YES + NO pair.
    Mint { amount: Decimal },
    /// YES + NO pair redeemed for collateral.
    Merge { amount: Decimal },
    /// Exchange paying the maker.
    TransferOut { asset: AssetKind, amount: Decimal },
    /// Exchange paying the taker whatever it still holds.
    TakerPayout { asset: AssetKind, amount: Decimal },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TakerDeposit { asset, amount } => {
                write!(f, "Taker transfers {} {asset} to exchange", amount.normalize())
            }
            Self::TransferIn { asset, amount } => write!(
                f,
                "Transfer {} {asset} from maker to exchange",
                amount.normalize()
            ),
            Self::Mint { amount } => {
                let amount = amount.normalize();
                write!(
                    f,
                    "MINT: Use {amount} collateral → generate {amount} YES + {amount} NO"
                )
            }
            Self::Merge { amount } => {
                let amount = amount.normalize();
                write!(
                    f,
                    "MERGE: Combine {amount} YES + {amount} NO → {amount} collateral"
                )
            }
            Self::TransferOut { asset, amount } => write!(
                f,
                "Transfer {} {asset} from exchange to maker",
                amount.normalize()
            ),
            Self::TakerPayout { asset, amount } => write!(
                f,
                "Exchange transfers {} {asset} to taker",
                amount.normalize()
            ),
        }
    }
}

/// Audit record of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub operation: Operation,
    pub before: LedgerSnapshot,
    pub after: LedgerSnapshot,
}

/// Trace of one maker settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchExecution {
    pub final_state: LedgerSnapshot,
    pub steps: Vec<ExecutionStep>,
}

/// Exchange balances for one recalculation pass.
///
/// Construct one per pass; nothing here is shared between passes.
#[derive(Debug, Clone, Default)]
pub struct ExchangeLedger {
    state: LedgerSnapshot,
}

impl ExchangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all balances.
    pub fn reset(&mut self) {
        self.state = LedgerSnapshot::ZERO;
    }

    pub const fn snapshot(&self) -> LedgerSnapshot {
        self.state
    }

    /// Credit the taker's deposit and record it.
    pub fn deposit(&mut self, asset: AssetKind, amount: Decimal) -> ExecutionStep {
        self.record(Operation::TakerDeposit { asset, amount }, |state| {
            credit(state, asset, amount);
        })
    }

    /// Replay one maker settlement: transfer in, mint/merge, transfer out.
    ///
    /// COMPLEMENTARY matches skip the middle leg entirely, so the trace
    /// holds two steps for them and three otherwise.
    pub fn apply_match(
        &mut self,
        match_type: MatchType,
        making: Decimal,
        taking: Decimal,
        maker_asset: AssetKind,
        taker_asset: AssetKind,
    ) -> MatchExecution {
        let mut steps = Vec::with_capacity(3);

        steps.push(self.record(
            Operation::TransferIn {
                asset: maker_asset,
                amount: making,
            },
            |state| credit(state, maker_asset, making),
        ));

        match match_type {
            MatchType::Mint => steps.push(self.record(Operation::Mint { amount: taking }, |state| {
                debit(state, AssetKind::Collateral, taking);
                credit(state, AssetKind::Yes, taking);
                credit(state, AssetKind::No, taking);
            })),
            MatchType::Merge => {
                steps.push(self.record(Operation::Merge { amount: making }, |state| {
                    debit(state, AssetKind::Yes, making);
                    debit(state, AssetKind::No, making);
                    credit(state, AssetKind::Collateral, making);
                }));
            }
            MatchType::Complementary => {}
        }

        steps.push(self.record(
            Operation::TransferOut {
                asset: taker_asset,
                amount: taking,
            },
            |state| debit(state, taker_asset, taking),
        ));

        MatchExecution {
            final_state: self.state,
            steps,
        }
    }

    fn record<F>(&mut self, operation: Operation, mutate: F) -> ExecutionStep
    where
        F: FnOnce(&mut LedgerSnapshot),
    {
        let before = self.state;
        mutate(&mut self.state);
        let after = self.state;
        trace!(%operation, %before, %after, "Ledger mutation");
        ExecutionStep {
            operation,
            before,
            after,
        }
    }
}

fn credit(state: &mut LedgerSnapshot, asset: AssetKind, amount: Decimal) {
    let balance = state.balance_mut(asset);
    *balance = balance.saturating_add(amount);
}

fn debit(state: &mut LedgerSnapshot, asset: AssetKind, amount: Decimal) {
    let balance = state.balance_mut(asset);
    *balance = balance.saturating_sub(amount);
}
