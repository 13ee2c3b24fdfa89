//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics export via axum 0.7. Health probes
//! (/live, /ready) are served from the entry point alongside the
//! shutdown watch channel.

pub mod prometheus;

pub use prometheus::MetricsRegistry;
