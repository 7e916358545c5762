//! Report Adapters - Rendering Settlement Results
//!
//! Text output for terminals; JSON output is plain `serde_json` over
//! `SettlementResult` and needs no adapter.

pub mod text;

pub use text::TextReport;
