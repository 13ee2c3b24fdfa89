//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    markets = config.markets.len(),
    origin_domain = config.relay.origin_domain,
    destination_domain = config.relay.destination_domain,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Relay validation
  anyhow::ensure!(
    config.relay.origin_domain != config.relay.destination_domain,
    "origin_domain and destination_domain must differ, both are {}",
    config.relay.origin_domain
  );
  anyhow::ensure!(
    !config.relay.spoke_address.is_zero(),
    "spoke_address must not be the zero address"
  );
  anyhow::ensure!(
    !config.relay.hub_address.is_zero(),
    "hub_address must not be the zero address"
  );
  anyhow::ensure!(
    !config.relay.resolver_address.is_zero(),
    "resolver_address must not be the zero address"
  );

  // Market validation
  anyhow::ensure!(
    !config.markets.is_empty(),
    "At least one market must be configured"
  );

  let mut seen = HashSet::new();
  for (i, market) in config.markets.iter().enumerate() {
    anyhow::ensure!(
      !market.oracle_id.is_empty(),
      "Market {} ({}) has empty oracle_id",
      i,
      market.name
    );
    anyhow::ensure!(
      seen.insert(&market.oracle_id),
      "Market {} ({}) duplicates oracle_id {}",
      i,
      market.name,
      market.oracle_id
    );
  }

  // Oracle validation
  anyhow::ensure!(
    !config.oracle.primary_url.is_empty(),
    "Primary oracle URL must not be empty"
  );
  anyhow::ensure!(
    !config.oracle.secondary_url.is_empty(),
    "Secondary oracle URL must not be empty"
  );

  // Rate limit validation
  anyhow::ensure!(
    config.rate_limits.max_requests_per_minute > 0
      && config.rate_limits.max_requests_per_minute <= 60,
    "max_requests_per_minute must be in (0, 60], got {}",
    config.rate_limits.max_requests_per_minute
  );
  anyhow::ensure!(
    config.rate_limits.min_interval_ms > 0,
    "min_interval_ms must be positive"
  );

  // Resolution validation
  anyhow::ensure!(
    config.resolution.poll_interval_seconds > 0,
    "poll_interval_seconds must be positive"
  );

  Ok(())
}
