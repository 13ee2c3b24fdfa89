//! Oracle HTTP Gateway - Rate-limited Market-Data Client
//!
//! Wraps reqwest with the shared rate limiter, bounded retries, and
//! primary→secondary endpoint fallback for all outbound oracle
//! queries. Implements the `OracleClient` port: callers see one
//! normalized status per market, or `OracleError::Unavailable` once
//! both endpoints have failed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::rate_limit::RateLimiter;
use super::types::{PrimaryMarketResponse, SecondaryMarketResponse};
use crate::error::OracleError;
use crate::ports::oracle::{OracleClient, OracleMarket};

/// Configuration for the oracle gateway.
#[derive(Debug, Clone)]
pub struct OracleGatewayConfig {
  /// Base URL of the primary market-data API.
  pub primary_base_url: String,
  /// Base URL of the secondary (fallback) API.
  pub secondary_base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum retries per endpoint on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for OracleGatewayConfig {
  fn default() -> Self {
    Self {
      primary_base_url: "https://gamma-api.example.com".to_string(),
      secondary_base_url: "https://data-api.example.com".to_string(),
      timeout: Duration::from_secs(30),
      max_retries: 2,
      retry_base_delay: Duration::from_millis(200),
    }
  }
}

/// Rate-limited HTTP gateway over both oracle endpoints.
pub struct OracleGateway {
  /// Underlying HTTP client.
  http: Client,
  /// Gateway configuration.
  config: OracleGatewayConfig,
  /// Shared gate for every outbound data call, retries and fallback
  /// included.
  limiter: Arc<RateLimiter>,
}

impl OracleGateway {
  /// Create a new gateway.
  pub fn new(config: OracleGatewayConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      http,
      config,
      limiter,
    })
  }

  /// Fetch and normalize from the primary endpoint.
  async fn fetch_primary(&self, oracle_id: &str) -> Result<OracleMarket> {
    let url = format!("{}/markets/{}", self.config.primary_base_url, oracle_id);
    let body = self.get_with_retry(&url).await?;
    let resp: PrimaryMarketResponse =
      serde_json::from_str(&body).context("Malformed primary oracle body")?;
    Ok(resp.into_status())
  }

  /// Fetch and normalize from the secondary endpoint.
  async fn fetch_secondary(&self, oracle_id: &str) -> Result<OracleMarket> {
    let url = format!("{}/markets/{}", self.config.secondary_base_url, oracle_id);
    let body = self.get_with_retry(&url).await?;
    let resp: SecondaryMarketResponse =
      serde_json::from_str(&body).context("Malformed secondary oracle body")?;
    Ok(resp.into_status(oracle_id))
  }

  /// Execute a GET with rate limiting and bounded retries.
  ///
  /// Server errors and transport failures retry with exponential
  /// backoff; any other non-2xx status fails immediately.
  async fn get_with_retry(&self, url: &str) -> Result<String> {
    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis(), url, "Retrying oracle request");
        sleep(delay).await;
      }

      // Every attempt is an outbound call and consumes a slot.
      self.limiter.acquire().await;

      match self.http.get(url).send().await {
        Ok(response) => match response.status() {
          StatusCode::OK => {
            return response.text().await.context("Failed to read oracle body");
          }
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(url, "Oracle rate limited us, backing off");
            last_error = Some(anyhow::anyhow!("Rate limited"));
            continue;
          }
          status if status.is_server_error() => {
            warn!(url, status = %status, "Oracle server error, retrying");
            last_error = Some(anyhow::anyhow!("Server error: {status}"));
            continue;
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Oracle error {status}: {body}");
          }
        },
        Err(e) => {
          warn!(url, error = %e, attempt, "Oracle request failed");
          last_error = Some(e.into());
          continue;
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Max retries exceeded")))
  }
}

#[async_trait]
impl OracleClient for OracleGateway {
  async fn market_status(&self, oracle_id: &str) -> Result<OracleMarket, OracleError> {
    match self.fetch_primary(oracle_id).await {
      Ok(market) => Ok(market),
      Err(primary_err) => {
        warn!(
          oracle_id,
          error = %primary_err,
          "Primary oracle failed, falling back to secondary"
        );
        match self.fetch_secondary(oracle_id).await {
          Ok(market) => Ok(market),
          Err(secondary_err) => Err(OracleError::Unavailable {
            oracle_id: oracle_id.to_string(),
            primary: format!("{primary_err:#}"),
            secondary: format!("{secondary_err:#}"),
          }),
        }
      }
    }
  }

  async fn is_healthy(&self) -> bool {
    // Liveness probe only; does not consume a data-call slot.
    self
      .http
      .get(&self.config.primary_base_url)
      .send()
      .await
      .is_ok()
  }
}
