//! Configuration Module - TOML-based Simulator Configuration
//!
//! Loads and validates configuration from `config.toml`. Every section
//! and field has a default, so an empty or missing file yields a usable
//! configuration.

pub mod loader;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Identity and logging.
  #[serde(default)]
  pub simulator: SimulatorConfig,
  /// Input limits applied at the order boundary.
  #[serde(default)]
  pub limits: LimitsConfig,
  /// Text report formatting.
  #[serde(default)]
  pub report: ReportConfig,
  /// Watch-mode polling.
  #[serde(default)]
  pub watch: WatchConfig,
}

/// Simulator identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
  /// Human-readable name, logged at startup.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Emit JSON log lines instead of the compact format.
  #[serde(default)]
  pub json_logs: bool,
}

/// Order amount limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
  /// Largest accepted amount, in base units.
  #[serde(default = "default_max_amount")]
  pub max_amount: Decimal,
}

/// Report formatting.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
  /// Fractional digits shown for prices and exact taking amounts.
  #[serde(default = "default_price_precision")]
  pub price_precision: u32,
  /// Name printed for the collateral asset.
  #[serde(default = "default_collateral_label")]
  pub collateral_label: String,
}

/// Watch-mode configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
  /// How often the order document is checked for changes (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
}

impl Default for SimulatorConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      json_logs: false,
    }
  }
}

impl Default for LimitsConfig {
  fn default() -> Self {
    Self {
      max_amount: default_max_amount(),
    }
  }
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      price_precision: default_price_precision(),
      collateral_label: default_collateral_label(),
    }
  }
}

impl Default for WatchConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms: default_poll_interval(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "ctf-match-simulator".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_max_amount() -> Decimal {
  Decimal::from(100_000_000_000_000_i64) // 10^14
}

fn default_price_precision() -> u32 {
  6
}

fn default_collateral_label() -> String {
  "COLLATERAL".to_string()
}

fn default_poll_interval() -> u64 {
  500
}
