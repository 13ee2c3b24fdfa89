//! Oracle API Adapter
//!
//! Implements the `OracleClient` port over the two market-data
//! endpoints. Every outbound request passes through the shared rate
//! limiter; the secondary endpoint is consulted only after the
//! primary fails.
//!
//! Sub-modules:
//! - `client`: HTTP gateway with retries and endpoint fallback
//! - `rate_limit`: window + spacing gate shared by all oracle calls
//! - `types`: provider response shapes and normalization

pub mod client;
pub mod rate_limit;
pub mod types;
