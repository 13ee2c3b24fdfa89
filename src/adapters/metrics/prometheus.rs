//! Prometheus Metrics Registry - Relay and Resolution Observability
//!
//! Registers and exposes Prometheus counters for Grafana dashboards.
//! Covers order flow through the hub, relay rejections, oracle
//! health, and the resolution loop.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Centralized Prometheus metrics.
///
/// All metrics follow the naming convention `relay_bot_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Orders applied to the hub book, labeled by source
    /// (direct/relay).
    pub orders_applied: IntCounterVec,
    /// Relay messages rejected, labeled by reason (auth/decode).
    pub relay_rejects: IntCounterVec,
    /// Markets resolved on the hub (any caller).
    pub markets_resolved: IntCounter,
    /// Resolutions recorded by the bot's tracker.
    pub markets_resolved_by_bot: IntCounter,
    /// Oracle queries that failed both endpoints.
    pub oracle_errors: IntCounter,
    /// Completed poll cycles.
    pub poll_cycles: IntCounter,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_applied = IntCounterVec::new(
            Opts::new(
                "relay_bot_orders_applied_total",
                "Orders applied to the hub order book",
            ),
            &["source"],
        )?;

        let relay_rejects = IntCounterVec::new(
            Opts::new(
                "relay_bot_relay_rejects_total",
                "Relay messages rejected without mutation",
            ),
            &["reason"],
        )?;

        let markets_resolved = IntCounter::new(
            "relay_bot_markets_resolved_total",
            "Markets resolved on the hub",
        )?;

        let markets_resolved_by_bot = IntCounter::new(
            "relay_bot_markets_resolved_by_bot_total",
            "Resolutions recorded in the bot tracker",
        )?;

        let oracle_errors = IntCounter::new(
            "relay_bot_oracle_errors_total",
            "Oracle queries where both endpoints failed",
        )?;

        let poll_cycles = IntCounter::new(
            "relay_bot_poll_cycles_total",
            "Completed resolution poll cycles",
        )?;

        // Register all metrics
        registry.register(Box::new(orders_applied.clone()))?;
        registry.register(Box::new(relay_rejects.clone()))?;
        registry.register(Box::new(markets_resolved.clone()))?;
        registry.register(Box::new(markets_resolved_by_bot.clone()))?;
        registry.register(Box::new(oracle_errors.clone()))?;
        registry.register(Box::new(poll_cycles.clone()))?;

        Ok(Self {
            registry,
            orders_applied,
            relay_rejects,
            markets_resolved,
            markets_resolved_by_bot,
            oracle_errors,
            poll_cycles,
        })
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let registry = metrics_self.registry.clone();
                async move {
                    let encoder = TextEncoder::new();
                    let metric_families = registry.gather();
                    let mut buffer = Vec::new();
                    encoder.encode(&metric_families, &mut buffer).unwrap();
                    String::from_utf8(buffer).unwrap_or_default()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_registers_all_metrics() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.orders_applied.with_label_values(&["relay"]).inc();
        metrics.markets_resolved.inc();

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"relay_bot_orders_applied_total".to_string()));
        assert!(names.contains(&"relay_bot_markets_resolved_total".to_string()));
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.poll_cycles.inc();
        metrics.poll_cycles.inc();
        assert_eq!(metrics.poll_cycles.get(), 2);
    }
}
