//! Settlement Port - Market Resolution Submission Interface
//!
//! The resolution bot submits outcomes through this trait. The
//! production implementation forwards to the hub under the bot's
//! configured resolver identity.

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::domain::outcome::Outcome;
use crate::error::SettlementError;

/// Trait for submitting a market resolution.
#[async_trait]
pub trait SettlementClient: Send + Sync + 'static {
  /// Submit the canonical outcome for a market.
  ///
  /// Fails with `SettlementError::AlreadyResolved` if another caller
  /// settled the market first; the bot maps that back to success.
  async fn resolve_market(
    &self,
    market_id: U256,
    outcome: Outcome,
  ) -> Result<(), SettlementError>;
}
