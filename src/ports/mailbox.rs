//! Mailbox Port - Cross-Domain Message Transport Interface
//!
//! The mailbox accepts `(destination domain, recipient, payload)` and
//! guarantees eventual delivery to the recipient on the destination
//! domain. Delivery is at-least-once with no duplicate suppression
//! and no ordering guarantee: recipients must treat every message as
//! independently applicable and idempotent to re-apply.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RelayError;

/// Receipt returned by a successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
  /// Transport-assigned message identifier.
  pub message_id: Uuid,
  /// Domain the message was routed toward.
  pub destination_domain: u32,
  /// Recipient address on the destination domain.
  pub recipient: Address,
}

/// Sending side of the transport.
///
/// Dispatch may fail synchronously (the caller must surface the
/// error); delivery can be delayed indefinitely but is assumed
/// eventually successful.
#[async_trait]
pub trait Mailbox: Send + Sync + 'static {
  /// Dispatch a payload toward `recipient` on `destination_domain`.
  async fn dispatch(
    &self,
    destination_domain: u32,
    recipient: Address,
    payload: Bytes,
  ) -> anyhow::Result<DispatchReceipt>;
}

/// Receiving side of the transport. The mailbox invokes this once
/// per delivery (possibly more than once per message).
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
  /// Apply a delivered message.
  ///
  /// `sender` is the dispatching identity on `origin_domain`,
  /// propagated by the relay context. Implementations must reject
  /// untrusted `(origin_domain, sender)` pairings without mutating
  /// any state.
  async fn handle_message(
    &self,
    origin_domain: u32,
    sender: Address,
    payload: &[u8],
  ) -> Result<(), RelayError>;
}
