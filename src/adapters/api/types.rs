//! Oracle API Response Types
//!
//! Defines the serialization types for the two market-data providers
//! and their normalization into the port-level `OracleMarket`. The
//! primary and secondary endpoints return different JSON shapes for
//! the same data; everything downstream of this module sees one
//! shape.

use serde::Deserialize;

use crate::ports::oracle::OracleMarket;

/// Primary endpoint response shape.
///
/// `GET /markets/{id}` returns the market document directly.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryMarketResponse {
  /// Provider market identifier.
  pub id: String,
  /// Whether the market has closed with a determination.
  pub closed: bool,
  /// Outcome label once closed ("YES"/"NO" spellings vary).
  pub outcome: Option<String>,
  /// Market question text.
  pub question: Option<String>,
}

impl PrimaryMarketResponse {
  /// Normalize into the port-level status.
  pub fn into_status(self) -> OracleMarket {
    OracleMarket {
      oracle_id: self.id,
      closed: self.closed,
      outcome: self.outcome,
    }
  }
}

/// Secondary endpoint response shape.
///
/// Same data, different field names: a `status` string instead of a
/// boolean and `result` instead of `outcome`.
#[derive(Debug, Clone, Deserialize)]
pub struct SecondaryMarketResponse {
  /// "open", "closed", or "resolved".
  pub status: String,
  /// Outcome label once closed.
  pub result: Option<String>,
  /// Provider market identifier.
  pub market: Option<String>,
}

impl SecondaryMarketResponse {
  /// Normalize into the port-level status.
  ///
  /// `oracle_id` is passed in because the secondary shape does not
  /// always echo the market identifier back.
  pub fn into_status(self, oracle_id: &str) -> OracleMarket {
    let closed = matches!(
      self.status.to_ascii_lowercase().as_str(),
      "closed" | "resolved" | "finalized"
    );
    OracleMarket {
      oracle_id: self
        .market
        .unwrap_or_else(|| oracle_id.to_string()),
      closed,
      outcome: self.result,
    }
  }
}
