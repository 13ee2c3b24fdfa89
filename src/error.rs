//! Error Taxonomy - Structured Failures per Component
//!
//! Relay-path rejections (decode, authorization) are local and atomic:
//! the failed call never mutates hub state. Oracle and settlement
//! failures are recoverable via retry on the next poll cycle; the bot
//! maps `AlreadyResolved` back to success for tracking purposes.

use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Failure to decode a relayed order payload.
///
/// Always rejects the whole message; no partial order is ever stored.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload length {got} bytes, expected {expected}")]
    BadLength { got: usize, expected: usize },

    #[error("malformed ABI tuple: {0}")]
    Abi(#[source] alloy::sol_types::Error),
}

/// Relay-path errors raised by the spoke and the hub.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("untrusted relay sender {sender} for origin domain {origin_domain}")]
    UntrustedSender { origin_domain: u32, sender: Address },

    #[error("no trusted spoke configured for origin domain {0}")]
    UnknownOriginDomain(u32),

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: &'static str },

    #[error("no open order for market {market_id} and user {user}")]
    OrderNotFound { market_id: U256, user: Address },

    #[error("mailbox dispatch failed: {0}")]
    Dispatch(anyhow::Error),
}

/// Settlement errors raised by `resolve_market`.
#[derive(Error, Debug)]
pub enum SettlementError {
    /// The market already has a canonical outcome. The resolution bot
    /// treats this as a success signal: the goal state is reached.
    #[error("market {market_id} already resolved")]
    AlreadyResolved { market_id: U256 },

    #[error("caller {caller} is not the authorized resolver")]
    UnauthorizedResolver { caller: Address },

    #[error("settlement submission failed: {0}")]
    Submission(String),
}

/// Oracle gateway errors. Both are retried on the next poll cycle.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Primary and secondary endpoints both failed for this market.
    #[error("oracle unavailable for {oracle_id}: primary: {primary}; secondary: {secondary}")]
    Unavailable {
        oracle_id: String,
        primary: String,
        secondary: String,
    },

    /// The oracle reported the market closed but the outcome label is
    /// not one we recognize. Never guessed; the market stays pending.
    #[error("ambiguous outcome {label:?} for {oracle_id}")]
    AmbiguousOutcome { oracle_id: String, label: String },
}
