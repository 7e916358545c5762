//! Text Report - Human-Readable Settlement Rendering
//!
//! Renders a `SettlementResult` the way an operator reads it: the taker
//! first, then every maker in settlement order with its execution steps,
//! then the payout summary and collateral breakdown.

use std::fmt::{self, Write};

use rust_decimal::Decimal;

use crate::config::ReportConfig;
use crate::domain::{ExecutionStep, LedgerSnapshot};
use crate::usecases::matcher::{
    MakerResult, OrderStatus, SettlementResult, SettlementSummary, TakerResult,
};

const INCOMPLETE_SUMMARY: &str =
    "Fill in the taker order and at least one complete maker to see the settlement summary.";

/// Plain-text renderer configured by the `[report]` section.
pub struct TextReport<'a> {
    config: &'a ReportConfig,
}

impl<'a> TextReport<'a> {
    pub const fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Render the whole result.
    pub fn render(&self, result: &SettlementResult) -> String {
        self.display(result).to_string()
    }

    /// Borrowing view implementing `Display`, for writing without an
    /// intermediate `String`.
    pub const fn display<'r>(&'r self, result: &'r SettlementResult) -> Rendered<'r> {
        Rendered {
            report: self,
            result,
        }
    }

    /// Write the whole result into `out`.
    pub fn write_to(&self, out: &mut impl Write, result: &SettlementResult) -> fmt::Result {
        self.taker_section(out, &result.taker)?;
        for maker in &result.makers {
            writeln!(out)?;
            self.maker_section(out, maker)?;
        }
        writeln!(out)?;
        match &result.summary {
            Some(summary) => self.summary_section(out, summary),
            None => writeln!(out, "{INCOMPLETE_SUMMARY}"),
        }
    }

    fn taker_section(&self, out: &mut impl Write, taker: &TakerResult) -> fmt::Result {
        writeln!(out, "TAKER {} [{}]", taker.side_token, status_label(taker.status))?;
        if taker.status == OrderStatus::Incomplete {
            writeln!(out, "  incomplete: makerAmount, takerAmount and making must all be set")?;
            return Ok(());
        }
        writeln!(
            out,
            "  price {}  taking {} (exact {})  actually receives {}",
            self.price(taker.price),
            taker.taking.normalize(),
            self.exact(taker.taking_exact),
            taker.actually_receives.normalize()
        )?;
        if let Some(step) = &taker.deposit_step {
            self.step_line(out, "  deposit:", step)?;
        }
        writeln!(out, "  final balances: {}", self.balances(&taker.final_balances))?;
        for error in &taker.errors {
            writeln!(out, "  ERROR {}", self.relabel(&error.to_string()))?;
        }
        Ok(())
    }

    fn maker_section(&self, out: &mut impl Write, maker: &MakerResult) -> fmt::Result {
        let match_type = maker
            .match_type
            .map(|m| format!(" {m}"))
            .unwrap_or_default();
        writeln!(
            out,
            "MAKER {} {} [{}]{match_type}{}",
            maker.id,
            maker.side_token,
            status_label(maker.status),
            if maker.compatible { "" } else { " (leg not compatible with taker)" }
        )?;
        if maker.status == OrderStatus::Incomplete {
            writeln!(out, "  incomplete: skipped")?;
            return Ok(());
        }
        writeln!(
            out,
            "  price {}  taking {} (exact {})  crossing {}",
            self.price(maker.price),
            maker.taking.normalize(),
            self.exact(maker.taking_exact),
            if maker.crossing { "yes" } else { "no" }
        )?;
        for (i, step) in maker.steps.iter().enumerate() {
            self.step_line(out, &format!("  {}.", i + 1), step)?;
        }
        if maker.status == OrderStatus::Settled {
            writeln!(out, "  balances: {}", self.balances(&maker.final_balances))?;
        }
        for error in &maker.errors {
            writeln!(out, "  ERROR {error}")?;
        }
        for warning in &maker.warnings {
            writeln!(out, "  WARNING {}", self.relabel(&warning.to_string()))?;
        }
        Ok(())
    }

    fn summary_section(&self, out: &mut impl Write, summary: &SettlementSummary) -> fmt::Result {
        let verdict = if summary.success { "SUCCESS" } else { "FAILED" };
        writeln!(out, "SETTLEMENT {verdict}")?;
        writeln!(out, "  before payout: {}", self.balances(&summary.before_payout))?;
        self.step_line(out, "  payout:", &summary.payout_step)?;
        writeln!(out, "  after payout:  {}", self.balances(&summary.after_payout))?;

        let flow = &summary.collateral_flow;
        let label = &self.config.collateral_label;
        writeln!(out, "  {label} flow:")?;
        if !flow.taker_in.is_zero() {
            writeln!(out, "    taker: +{} from taker", flow.taker_in.normalize())?;
        }
        if !flow.taker_out.is_zero() {
            writeln!(out, "    taker: -{} to taker", flow.taker_out.normalize())?;
        }
        for entry in &flow.entries {
            writeln!(
                out,
                "    maker {} {}: {}",
                entry.maker,
                entry.side_token,
                self.relabel(&entry.to_string())
            )?;
        }
        writeln!(
            out,
            "    total in {}  total out {}  net {}",
            flow.total_in.normalize(),
            flow.total_out.normalize(),
            flow.net().normalize()
        )?;

        for error in &summary.errors {
            writeln!(out, "  ERROR {}", self.relabel(&error.to_string()))?;
        }
        for warning in &summary.warnings {
            writeln!(out, "  WARNING {}", self.relabel(&warning.to_string()))?;
        }
        Ok(())
    }

    fn step_line(&self, out: &mut impl Write, prefix: &str, step: &ExecutionStep) -> fmt::Result {
        writeln!(
            out,
            "{prefix} {}  [{}] -> [{}]",
            self.relabel(&step.operation.to_string()),
            self.balances(&step.before),
            self.balances(&step.after)
        )
    }

    fn balances(&self, snapshot: &LedgerSnapshot) -> String {
        self.relabel(&snapshot.to_string())
    }

    fn price(&self, value: Decimal) -> Decimal {
        value.round_dp(self.config.price_precision).normalize()
    }

    fn exact(&self, value: Decimal) -> String {
        let dp = usize::try_from(self.config.price_precision).unwrap_or(usize::MAX);
        format!("{:.dp$}", value.round_dp(self.config.price_precision))
    }

    fn relabel(&self, text: &str) -> String {
        let label = &self.config.collateral_label;
        text.replace("COLLATERAL", label).replace("collateral", label)
    }
}

/// A report bound to one result; see [`TextReport::display`].
pub struct Rendered<'r> {
    report: &'r TextReport<'r>,
    result: &'r SettlementResult,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.report.write_to(f, self.result)
    }
}

const fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Incomplete => "incomplete",
        OrderStatus::Rejected => "rejected",
        OrderStatus::Settled => "settled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MakerId, MakerOrder, Order, Side, SideToken, Token};
    use crate::usecases::matcher::compute;
    use rust_decimal_macros::dec;

    fn config(label: &str) -> ReportConfig {
        ReportConfig {
            price_precision: 6,
            collateral_label: label.to_string(),
        }
    }

    #[test]
    fn test_render_complementary_success() {
        let taker = Order::new(SideToken::new(Side::Buy, Token::Yes), dec!(50), dec!(100), dec!(50));
        let makers = [MakerOrder::new(
            MakerId(1),
            Order::new(SideToken::new(Side::Sell, Token::Yes), dec!(100), dec!(50), dec!(100)),
        )];
        let result = compute(&taker, &makers);
        let cfg = config("USDC");
        let text = TextReport::new(&cfg).render(&result);

        assert!(text.contains("TAKER BUY YES [settled]"));
        assert!(text.contains("MAKER #1 SELL YES [settled] COMPLEMENTARY"));
        assert!(text.contains("Transfer 100 YES from maker to exchange"));
        assert!(text.contains("SETTLEMENT SUCCESS"));
        assert!(text.contains("USDC flow:"));
        assert!(!text.contains("COLLATERAL"));
        assert!(text.contains("exact 100.000000"));
    }

    #[test]
    fn test_render_without_summary() {
        let taker = Order::empty(SideToken::new(Side::Buy, Token::Yes));
        let cfg = config("COLLATERAL");
        let text = TextReport::new(&cfg).render(&compute(&taker, &[]));

        assert!(text.contains("[incomplete]"));
        assert!(text.contains(INCOMPLETE_SUMMARY));
    }

    #[test]
    fn test_render_flags_incompatible_leg() {
        let taker = Order::new(SideToken::new(Side::Buy, Token::Yes), dec!(50), dec!(100), dec!(50));
        let makers = [MakerOrder::new(
            MakerId(3),
            Order::new(SideToken::new(Side::Buy, Token::Yes), dec!(50), dec!(100), dec!(50)),
        )];
        let cfg = config("COLLATERAL");
        let text = TextReport::new(&cfg).render(&compute(&taker, &makers));

        assert!(text.contains("(leg not compatible with taker)"));
    }

    /// Sink that refuses writes after a fixed number of bytes.
    struct Capped {
        buf: String,
        limit: usize,
    }

    impl Write for Capped {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.buf.len() + s.len() > self.limit {
                return Err(fmt::Error);
            }
            self.buf.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_propagate() {
        let taker = Order::new(SideToken::new(Side::Buy, Token::Yes), dec!(50), dec!(100), dec!(50));
        let makers = [MakerOrder::new(
            MakerId(1),
            Order::new(SideToken::new(Side::Sell, Token::Yes), dec!(100), dec!(50), dec!(100)),
        )];
        let result = compute(&taker, &makers);
        let cfg = config("USDC");
        let report = TextReport::new(&cfg);
        let full = report.render(&result);

        let mut roomy = Capped { buf: String::new(), limit: full.len() };
        assert!(report.write_to(&mut roomy, &result).is_ok());
        assert_eq!(roomy.buf, full);
        assert_eq!(report.display(&result).to_string(), full);

        let mut cramped = Capped { buf: String::new(), limit: full.len() - 1 };
        assert_eq!(report.write_to(&mut cramped, &result), Err(fmt::Error));
        assert!(cramped.buf.len() < full.len());
    }
}
