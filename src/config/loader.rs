//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use super::AppConfig;

/// Largest precision `Decimal` can represent.
const MAX_PRICE_PRECISION: u32 = 28;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  parse_config(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// Returns whether the file was found, so the caller can log it once
/// logging is initialised.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<(AppConfig, bool)> {
  let path = path.as_ref();
  if path.exists() {
    Ok((load_config(path)?, true))
  } else {
    Ok((AppConfig::default(), false))
  }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.simulator.log_level.trim().is_empty(),
    "simulator.log_level must not be empty"
  );

  anyhow::ensure!(
    config.limits.max_amount > Decimal::ZERO,
    "limits.max_amount must be positive, got {}",
    config.limits.max_amount
  );

  anyhow::ensure!(
    config.report.price_precision <= MAX_PRICE_PRECISION,
    "report.price_precision must be in [0, {}], got {}",
    MAX_PRICE_PRECISION,
    config.report.price_precision
  );
  anyhow::ensure!(
    !config.report.collateral_label.trim().is_empty(),
    "report.collateral_label must not be empty"
  );

  anyhow::ensure!(
    config.watch.poll_interval_ms > 0,
    "watch.poll_interval_ms must be positive"
  );

  Ok(())
}
