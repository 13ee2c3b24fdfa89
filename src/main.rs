//! Orderbook Relay Bot — Entry Point
//!
//! Initializes configuration, logging, the relay fabric, and the
//! autonomous resolution bot. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Open the durable market tracker (abort startup if unreadable)
//! 4. Build the hub with its trusted spoke set + resolver identity
//! 5. Wire the in-process transport: register the hub, bind a spoke
//! 6. Create the oracle gateway behind the shared rate limiter
//! 7. Spawn delivery pump, resolution bot, health + metrics servers
//! 8. Wait for SIGINT → graceful shutdown (signal→drain→exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{error, info};

mod adapters;
mod config;
mod domain;
mod error;
mod ports;
mod usecases;

use adapters::api::client::{OracleGateway, OracleGatewayConfig};
use adapters::api::rate_limit::{RateLimiter, RateLimiterConfig};
use adapters::mailbox::LocalTransport;
use adapters::metrics::MetricsRegistry;
use adapters::persistence::MarketTrackerStore;
use usecases::hub::{Hub, ResolverHandle};
use usecases::resolution_bot::{ResolutionBot, TrackedMarketSpec};
use usecases::spoke::Spoke;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.bot.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.bot.dry_run,
        markets = config.markets.len(),
        "Starting orderbook relay bot"
    );

    // ── 3. Shutdown signal channels ─────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let (health_tx, health_rx) = watch::channel(true);

    // ── 4. Metrics registry ─────────────────────────────────
    let metrics = Arc::new(
        MetricsRegistry::new().context("Failed to build metrics registry")?,
    );

    // ── 5. Open the durable market tracker ──────────────────
    // An unreadable dedup record risks double settlement, so this
    // aborts startup instead of running degraded.
    let tracker = Arc::new(
        MarketTrackerStore::open(&config.persistence.data_dir)
            .await
            .context("Failed to open market tracker — refusing to start")?,
    );

    // ── 6. Build the hub with trusted spoke + resolver ──────
    let mut trusted_spokes = HashMap::new();
    trusted_spokes.insert(config.relay.origin_domain, config.relay.spoke_address);
    let hub = Arc::new(
        Hub::new(
            config.relay.destination_domain,
            trusted_spokes,
            config.relay.resolver_address,
        )
        .with_metrics(Arc::clone(&metrics)),
    );

    // ── 7. Wire the in-process transport ────────────────────
    let (transport, pump) = LocalTransport::new();
    transport
        .register(
            config.relay.destination_domain,
            config.relay.hub_address,
            Arc::clone(&hub) as _,
        )
        .await;

    // The spoke is the origin-domain entry point an HTTP/UI layer
    // calls; the binary itself only drives the resolution side.
    let _spoke = Spoke::new(
        Arc::new(transport.endpoint(config.relay.origin_domain, config.relay.spoke_address)),
        config.relay.origin_domain,
        config.relay.destination_domain,
        config.relay.hub_address,
    );

    let pump_shutdown = shutdown_tx.subscribe();
    let pump_handle = tokio::spawn(async move {
        if let Err(e) = pump.run(pump_shutdown).await {
            error!(error = %e, "Delivery pump failed");
        }
    });

    // ── 8. Oracle gateway behind the shared rate limiter ────
    let limiter = Arc::new(RateLimiter::new(RateLimiterConfig {
        max_requests: config.rate_limits.max_requests_per_minute,
        window: Duration::from_secs(60),
        min_interval: Duration::from_millis(config.rate_limits.min_interval_ms),
    }));
    let oracle = Arc::new(
        OracleGateway::new(
            OracleGatewayConfig {
                primary_base_url: config.oracle.primary_url.clone(),
                secondary_base_url: config.oracle.secondary_url.clone(),
                timeout: Duration::from_millis(config.oracle.timeout_ms),
                max_retries: config.oracle.max_retries,
                retry_base_delay: Duration::from_millis(200),
            },
            Arc::clone(&limiter),
        )
        .context("Failed to create oracle gateway")?,
    );

    // ── 9. Spawn the resolution bot ─────────────────────────
    let settlement = Arc::new(ResolverHandle::new(
        Arc::clone(&hub),
        config.relay.resolver_address,
    ));
    let tracked: Vec<TrackedMarketSpec> = config
        .markets
        .iter()
        .filter(|m| m.active)
        .map(|m| TrackedMarketSpec {
            name: m.name.clone(),
            oracle_id: m.oracle_id.clone(),
            market_id: U256::from(m.market_id),
        })
        .collect();

    let bot = Arc::new(
        ResolutionBot::new(
            oracle,
            settlement,
            Arc::clone(&tracker),
            tracked,
            Duration::from_secs(config.resolution.poll_interval_seconds),
            config.bot.dry_run,
        )
        .with_metrics(Arc::clone(&metrics)),
    );

    let bot_shutdown = shutdown_tx.subscribe();
    let bot_ref = Arc::clone(&bot);
    let bot_handle = tokio::spawn(async move {
        if let Err(e) = bot_ref.run(bot_shutdown).await {
            error!(error = %e, "Resolution bot failed");
        }
    });

    // ── 10. Spawn health + metrics servers ──────────────────
    let health_handle = tokio::spawn(serve_health(
        health_rx,
        config.metrics.health_port,
    ));

    let metrics_handle = if config.metrics.enabled {
        let metrics_shutdown = shutdown_tx.subscribe();
        let bind = config.metrics.bind_address.clone();
        Some(tokio::spawn(Arc::clone(&metrics).serve(bind, metrics_shutdown)))
    } else {
        None
    };

    info!("All tasks spawned — bot is running");

    // ── 11. Wait for SIGINT ─────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // ── Graceful shutdown ───────────────────────────────────

    // 1. Signal all tasks to stop. The bot finishes any in-flight
    //    settlement before exiting so the tracker stays consistent.
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast to all tasks");

    // 2. Mark health as unhealthy (readiness probe → 503)
    let _ = health_tx.send(false);

    // 3. Wait for the bot to finish (up to 30s)
    info!("Waiting for resolution bot shutdown...");
    let _ = tokio::time::timeout(Duration::from_secs(30), bot_handle).await;

    // 4. Wait for the delivery pump to drain (up to 5s)
    let _ = tokio::time::timeout(Duration::from_secs(5), pump_handle).await;

    // 5. Stop the servers
    if let Some(handle) = metrics_handle {
        handle.abort();
    }
    health_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Serve health endpoints.
///
/// - `/live`  — Liveness probe: 200 if process is running
/// - `/ready` — Readiness probe: 503 during graceful shutdown
async fn serve_health(health_rx: watch::Receiver<bool>, port: u16) -> Result<()> {
    use axum::{extract::State, http::StatusCode, routing::get, Router};

    let app = Router::new()
        .route("/live", get(|| async { StatusCode::OK }))
        .route(
            "/ready",
            get(
                move |State(rx): State<watch::Receiver<bool>>| async move {
                    if *rx.borrow() {
                        StatusCode::OK
                    } else {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                },
            ),
        )
        .with_state(health_rx);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Health server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
