//! Tracker Repository Port - Durable Resolved-Market Record
//!
//! The record behind this trait is what makes settlement at-most-once
//! across process restarts: it is reloaded in full before the first
//! poll cycle and written immediately after every recorded
//! resolution, before the next cycle begins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::outcome::Outcome;

/// One tracked market's durable resolution state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedMarket {
  /// Oracle-side market identifier.
  pub market_id: String,
  /// Whether settlement has been recorded for this market.
  pub resolved: bool,
  /// Settlement value (0 or 1) once resolved.
  pub resolved_outcome: Option<u8>,
  /// When the settlement was recorded.
  pub resolved_at: Option<DateTime<Utc>>,
}

impl TrackedMarket {
  /// Fresh unresolved entry for a newly tracked market.
  pub fn pending(market_id: impl Into<String>) -> Self {
    Self {
      market_id: market_id.into(),
      resolved: false,
      resolved_outcome: None,
      resolved_at: None,
    }
  }
}

/// Trait for the durable tracker store.
#[async_trait]
pub trait TrackerRepository: Send + Sync + 'static {
  /// Load the full tracked set.
  async fn load_all(&self) -> anyhow::Result<Vec<TrackedMarket>>;

  /// Whether a market already has a recorded resolution.
  async fn is_resolved(&self, market_id: &str) -> anyhow::Result<bool>;

  /// Record a market as resolved and persist durably before
  /// returning.
  async fn record_resolved(&self, market_id: &str, outcome: Outcome) -> anyhow::Result<()>;

  /// Check if the backing store is usable (disk space, permissions).
  async fn is_healthy(&self) -> bool;
}
