//! Mailbox Adapters - Cross-Domain Transport Implementations
//!
//! Provides the in-process `LocalTransport` used for single-binary
//! deployments and tests. A production deployment swaps in an
//! adapter over the real cross-domain messaging layer behind the
//! same `Mailbox` / `MessageHandler` ports.

pub mod local;

pub use local::{DeliveryPump, LocalMailbox, LocalTransport};
