//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, in-process transport, file
//! I/O). Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: oracle HTTP gateway with rate limiting and fallback
//! - `mailbox`: in-process cross-domain message transport
//! - `metrics`: Prometheus metrics export
//! - `persistence`: durable resolved-market tracker

pub mod api;
pub mod mailbox;
pub mod metrics;
pub mod persistence;
