//! Hub Use Case - Canonical Order Book and Settlement Authority
//!
//! The hub lives on the destination domain and holds the single
//! source of truth for the shared order book. It is mutated through
//! exactly two entry points: direct local placement and relayed
//! messages delivered by the mailbox. Both apply the same
//! last-write-wins rule per `(market, user)` key, which is what makes
//! duplicate delivery from the at-least-once transport idempotent.
//!
//! Market resolution is restricted to one authorized resolver
//! identity and succeeds at most once per market; a second attempt is
//! rejected so a buggy or malicious caller cannot flip an outcome.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::domain::codec::RelayMessage;
use crate::domain::order::{Order, OrderKey, OrderStatus, Resolution};
use crate::domain::outcome::Outcome;
use crate::error::{RelayError, SettlementError};
use crate::ports::mailbox::MessageHandler;
use crate::ports::settlement::SettlementClient;

/// Destination-domain hub holding the canonical order book.
pub struct Hub {
    /// Domain this hub lives on.
    local_domain: u32,
    /// Trusted spoke address per origin domain. Messages from any
    /// other `(domain, sender)` pairing are rejected unapplied.
    trusted_spokes: HashMap<u32, Address>,
    /// The only identity allowed to resolve markets.
    resolver: Address,
    /// Order book keyed by `(market, user)`. A single lock serializes
    /// writes so two concurrent placements for the same key can never
    /// interleave into a mixed state.
    book: RwLock<HashMap<OrderKey, Order>>,
    /// Resolved outcomes, written at most once per market.
    resolutions: RwLock<HashMap<U256, Resolution>>,
    /// Optional observability counters.
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Hub {
    /// Create a hub for `local_domain` with its trusted spoke set and
    /// authorized resolver.
    pub fn new(
        local_domain: u32,
        trusted_spokes: HashMap<u32, Address>,
        resolver: Address,
    ) -> Self {
        Self {
            local_domain,
            trusted_spokes,
            resolver,
            book: RwLock::new(HashMap::new()),
            resolutions: RwLock::new(HashMap::new()),
            metrics: None,
        }
    }

    /// Attach a metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Domain identifier this hub serves.
    pub fn local_domain(&self) -> u32 {
        self.local_domain
    }

    /// Place an order directly on the hub, attributed to `caller`.
    ///
    /// Overwrites any prior order under the same `(market, caller)`
    /// key, including cancelled tombstones.
    pub async fn place_order(
        &self,
        caller: Address,
        market_id: U256,
        price: U256,
        amount: U256,
        is_buy: bool,
    ) -> Result<Order, RelayError> {
        validate_order_fields(price, amount)?;

        let order = Order::new(market_id, caller, price, amount, is_buy);
        self.apply(order.clone(), "direct").await;
        Ok(order)
    }

    /// Cancel the caller's own order, leaving a tombstone.
    pub async fn cancel_order(
        &self,
        caller: Address,
        market_id: U256,
    ) -> Result<(), RelayError> {
        let key = OrderKey {
            market_id,
            user: caller,
        };

        let mut book = self.book.write().await;
        match book.get_mut(&key) {
            Some(order) if order.status == OrderStatus::Open => {
                order.status = OrderStatus::Cancelled;
                order.updated_at = Utc::now();
                info!(market_id = %market_id, user = %caller, "Order cancelled");
                Ok(())
            }
            _ => Err(RelayError::OrderNotFound {
                market_id,
                user: caller,
            }),
        }
    }

    /// Set the canonical outcome for a market, exactly once.
    pub async fn resolve_market(
        &self,
        caller: Address,
        market_id: U256,
        outcome: Outcome,
    ) -> Result<Resolution, SettlementError> {
        if caller != self.resolver {
            warn!(
                caller = %caller,
                market_id = %market_id,
                "Unauthorized resolve attempt rejected"
            );
            return Err(SettlementError::UnauthorizedResolver { caller });
        }

        let mut resolutions = self.resolutions.write().await;
        if resolutions.contains_key(&market_id) {
            return Err(SettlementError::AlreadyResolved { market_id });
        }

        let resolution = Resolution {
            market_id,
            outcome,
            resolved_at: Utc::now(),
        };
        resolutions.insert(market_id, resolution);

        info!(market_id = %market_id, outcome = %outcome, "Market resolved");
        if let Some(m) = &self.metrics {
            m.markets_resolved.inc();
        }

        Ok(resolution)
    }

    /// All orders still live on the book.
    pub async fn get_active_orders(&self) -> Vec<Order> {
        let book = self.book.read().await;
        book.values().filter(|o| o.is_active()).cloned().collect()
    }

    /// Current order under a key, tombstones included.
    pub async fn order(&self, key: &OrderKey) -> Option<Order> {
        self.book.read().await.get(key).cloned()
    }

    /// Canonical resolution for a market, if recorded.
    pub async fn resolution_of(&self, market_id: U256) -> Option<Resolution> {
        self.resolutions.read().await.get(&market_id).copied()
    }

    /// Write an order into the book (last-write-wins).
    async fn apply(&self, order: Order, source: &'static str) {
        let key = order.key();
        let mut book = self.book.write().await;
        let overwrote = book.insert(key, order).is_some();

        info!(
            market_id = %key.market_id,
            user = %key.user,
            source,
            overwrote,
            "Order applied"
        );
        if let Some(m) = &self.metrics {
            m.orders_applied.with_label_values(&[source]).inc();
        }
    }
}

#[async_trait]
impl MessageHandler for Hub {
    /// Apply a relayed order delivered by the mailbox.
    ///
    /// Rejects atomically on any failure: an untrusted sender or a
    /// malformed payload leaves the book byte-identical.
    async fn handle_message(
        &self,
        origin_domain: u32,
        sender: Address,
        payload: &[u8],
    ) -> Result<(), RelayError> {
        let Some(trusted) = self.trusted_spokes.get(&origin_domain) else {
            warn!(origin_domain, sender = %sender, "Message from unconfigured domain");
            if let Some(m) = &self.metrics {
                m.relay_rejects.with_label_values(&["auth"]).inc();
            }
            return Err(RelayError::UnknownOriginDomain(origin_domain));
        };

        if *trusted != sender {
            warn!(
                origin_domain,
                sender = %sender,
                trusted = %trusted,
                "Untrusted relay sender rejected"
            );
            if let Some(m) = &self.metrics {
                m.relay_rejects.with_label_values(&["auth"]).inc();
            }
            return Err(RelayError::UntrustedSender {
                origin_domain,
                sender,
            });
        }

        let message = match RelayMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(origin_domain, error = %e, "Relay payload decode failed");
                if let Some(m) = &self.metrics {
                    m.relay_rejects.with_label_values(&["decode"]).inc();
                }
                return Err(e.into());
            }
        };

        // Attribution: the wire tuple carries no user field, so the
        // order belongs to the sender identity the relay context
        // propagated (the verified spoke), not a fabricated one.
        let order = Order::new(
            message.market_id,
            sender,
            message.price,
            message.amount,
            message.is_buy,
        );
        self.apply(order, "relay").await;

        Ok(())
    }
}

/// Handle the bot uses to submit settlements to the hub under its
/// configured resolver identity.
pub struct ResolverHandle {
    hub: Arc<Hub>,
    resolver: Address,
}

impl ResolverHandle {
    pub fn new(hub: Arc<Hub>, resolver: Address) -> Self {
        Self { hub, resolver }
    }
}

#[async_trait]
impl SettlementClient for ResolverHandle {
    async fn resolve_market(
        &self,
        market_id: U256,
        outcome: Outcome,
    ) -> Result<(), SettlementError> {
        self.hub
            .resolve_market(self.resolver, market_id, outcome)
            .await
            .map(|_| ())
    }
}

fn validate_order_fields(price: U256, amount: U256) -> Result<(), RelayError> {
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
    Ok(())
}
