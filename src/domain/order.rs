//! Order-book domain types.
//!
//! Defines the entities the hub's canonical order book is built from:
//! orders keyed by `(market, user)`, the tombstone status used for
//! cancellation, and the resolution record written exactly once per
//! market.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::outcome::Outcome;

/// Key of the canonical order book.
///
/// One live order per `(market, user)`; a later order for the same key
/// overwrites the earlier one (last-write-wins, no merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    /// Market identifier.
    pub market_id: U256,
    /// Owner of the order.
    pub user: Address,
}

/// Lifecycle status of a booked order.
///
/// Orders are never deleted from the book; cancellation leaves a
/// tombstone so a late duplicate delivery overwrites visibly instead
/// of resurrecting state through a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Resting on the book.
    Open,
    /// Cancelled by its owner (tombstone).
    Cancelled,
}

/// A booked order on the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Market this order belongs to.
    pub market_id: U256,
    /// Owner identity. Direct placements use the caller; relayed
    /// orders use the verified spoke sender from the relay context.
    pub user: Address,
    /// Limit price in atomic units.
    pub price: U256,
    /// Size in atomic units.
    pub amount: U256,
    /// Buy or sell.
    pub is_buy: bool,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Timestamp of the last write to this key.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new open order stamped with the current time.
    pub fn new(
        market_id: U256,
        user: Address,
        price: U256,
        amount: U256,
        is_buy: bool,
    ) -> Self {
        Self {
            market_id,
            user,
            price,
            amount,
            is_buy,
            status: OrderStatus::Open,
            updated_at: Utc::now(),
        }
    }

    /// Book key for this order.
    pub fn key(&self) -> OrderKey {
        OrderKey {
            market_id: self.market_id,
            user: self.user,
        }
    }

    /// Whether the order is still live on the book.
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Open
    }
}

/// Canonical outcome record for a resolved market.
///
/// Written exactly once; a second resolution attempt for the same
/// market is rejected rather than silently overwriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Market identifier.
    pub market_id: U256,
    /// Settled outcome.
    pub outcome: Outcome,
    /// When the resolution was recorded.
    pub resolved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_new_order_is_open() {
        let order = Order::new(
            U256::from(1),
            addr(0xAA),
            U256::from(55),
            U256::from(100),
            true,
        );
        assert_eq!(order.status, OrderStatus::Open);
        assert!(order.is_active());
    }

    #[test]
    fn test_key_ignores_price_and_side() {
        let a = Order::new(U256::from(9), addr(1), U256::from(40), U256::from(10), true);
        let b = Order::new(U256::from(9), addr(1), U256::from(60), U256::from(99), false);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_cancelled_order_is_inactive() {
        let mut order =
            Order::new(U256::from(2), addr(2), U256::from(50), U256::from(5), false);
        order.status = OrderStatus::Cancelled;
        assert!(!order.is_active());
    }
}
