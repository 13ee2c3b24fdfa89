//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. All domain
//! identifiers, contract addresses, and market parameters are
//! externalized here - nothing is hardcoded in the domain layer.

pub mod loader;

use alloy::primitives::Address;
use serde::Deserialize;

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before anything is wired.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Bot identity and metadata.
  pub bot: BotConfig,
  /// Relay routing: domains and trusted addresses.
  pub relay: RelayConfig,
  /// Tracked market definitions.
  pub markets: Vec<MarketConfig>,
  /// Oracle API endpoints.
  pub oracle: OracleConfig,
  /// Rate limiting configuration.
  pub rate_limits: RateLimitConfig,
  /// Resolution poll loop configuration.
  pub resolution: ResolutionConfig,
  /// Persistence configuration.
  pub persistence: PersistenceConfig,
  /// Metrics and monitoring.
  pub metrics: MetricsConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Log what would be settled without submitting anything.
  #[serde(default)]
  pub dry_run: bool,
}

/// Relay routing configuration.
///
/// The hub only accepts relayed messages from the configured spoke
/// address on the configured origin domain; everything else is
/// rejected unapplied.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
  /// Domain the spoke lives on.
  pub origin_domain: u32,
  /// Domain the hub lives on.
  pub destination_domain: u32,
  /// Trusted spoke address on the origin domain.
  pub spoke_address: Address,
  /// Hub address on the destination domain.
  pub hub_address: Address,
  /// The only identity allowed to resolve markets on the hub.
  pub resolver_address: Address,
}

/// Individual tracked market configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
  /// Human-readable market name.
  pub name: String,
  /// Identifier used against the oracle APIs.
  pub oracle_id: String,
  /// On-chain market identifier used for settlement.
  pub market_id: u64,
  /// Whether this market is actively polled.
  #[serde(default = "default_true")]
  pub active: bool,
}

/// Oracle API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
  /// Primary market-data API base URL.
  pub primary_url: String,
  /// Secondary (fallback) API base URL.
  pub secondary_url: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum retries per endpoint on transient errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
  /// Maximum oracle requests per rolling minute (provider limit: 60).
  #[serde(default = "default_max_requests")]
  pub max_requests_per_minute: u32,
  /// Minimum spacing between consecutive requests (milliseconds).
  #[serde(default = "default_min_interval")]
  pub min_interval_ms: u64,
}

/// Resolution poll loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionConfig {
  /// Seconds between poll cycles.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_seconds: u64,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the tracker document.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_timeout_ms() -> u64 {
  30_000
}

fn default_max_retries() -> u32 {
  2
}

fn default_max_requests() -> u32 {
  60
}

fn default_min_interval() -> u64 {
  1_100
}

fn default_poll_interval() -> u64 {
  60
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
