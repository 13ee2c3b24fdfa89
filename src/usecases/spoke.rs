//! Spoke Use Case - Origin-Domain Order Forwarding
//!
//! The spoke accepts local order placements, validates the numeric
//! fields, encodes the order into the relay wire layout, and
//! dispatches it through the mailbox toward the configured hub. It
//! holds no order-book state of its own: the hub is the single source
//! of truth, and the dispatch receipt is the only thing a caller gets
//! back.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use tracing::{debug, info};

use crate::domain::codec::RelayMessage;
use crate::error::RelayError;
use crate::ports::mailbox::{DispatchReceipt, Mailbox};

/// Origin-domain spoke bound to one hub.
pub struct Spoke<M: Mailbox> {
    mailbox: Arc<M>,
    /// Domain this spoke lives on (logging only; the transport
    /// stamps the real origin).
    origin_domain: u32,
    /// Hub routing target.
    destination_domain: u32,
    hub_address: Address,
}

impl<M: Mailbox> Spoke<M> {
    /// Create a spoke that forwards toward `(destination_domain,
    /// hub_address)`.
    pub fn new(
        mailbox: Arc<M>,
        origin_domain: u32,
        destination_domain: u32,
        hub_address: Address,
    ) -> Self {
        Self {
            mailbox,
            origin_domain,
            destination_domain,
            hub_address,
        }
    }

    /// Validate, encode, and dispatch an order toward the hub.
    ///
    /// Rejects zero amounts and zero prices before anything is
    /// dispatched. A synchronous dispatch failure is surfaced to the
    /// caller; nothing is retried here.
    pub async fn place_order(
        &self,
        market_id: U256,
        price: U256,
        amount: U256,
        is_buy: bool,
    ) -> Result<DispatchReceipt, RelayError> {
        if amount.is_zero() {
            return Err(RelayError::InvalidOrder {
                reason: "amount must be non-zero",
            });
        }
        if price.is_zero() {
            return Err(RelayError::InvalidOrder {
                reason: "price must be non-zero",
            });
        }

        let message = RelayMessage {
            market_id,
            price,
            amount,
            is_buy,
        };
        let payload = Bytes::from(message.encode());
        debug!(
            market_id = %market_id,
            payload_len = payload.len(),
            "Order encoded for relay"
        );

        let receipt = self
            .mailbox
            .dispatch(self.destination_domain, self.hub_address, payload)
            .await
            .map_err(RelayError::Dispatch)?;

        info!(
            message_id = %receipt.message_id,
            market_id = %market_id,
            origin_domain = self.origin_domain,
            destination_domain = self.destination_domain,
            "Order dispatched toward hub"
        );

        Ok(receipt)
    }
}
