//! Oracle Port - External Market-Data Interface
//!
//! The gateway behind this trait normalizes the provider-specific
//! JSON shapes (primary and secondary endpoints) into one status
//! struct. Fallback between endpoints happens inside the adapter;
//! callers only see `OracleError::Unavailable` once both failed.

use async_trait::async_trait;

use crate::error::OracleError;

/// Normalized market status as reported by an oracle provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleMarket {
  /// Provider-side market identifier.
  pub oracle_id: String,
  /// Whether the provider reports the market closed/determined.
  pub closed: bool,
  /// Raw outcome label, present once the market is closed. Mapping
  /// to a settlement value is the caller's job (never guessed).
  pub outcome: Option<String>,
}

/// Trait for querying market outcome determinations.
#[async_trait]
pub trait OracleClient: Send + Sync + 'static {
  /// Fetch the current status of one market.
  async fn market_status(&self, oracle_id: &str) -> Result<OracleMarket, OracleError>;

  /// Check if the oracle endpoints are reachable.
  async fn is_healthy(&self) -> bool;
}
