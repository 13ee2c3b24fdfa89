//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Mailbox` / `MessageHandler`: cross-domain message transport
//! - `OracleClient`: external market-data provider
//! - `SettlementClient`: on-chain market resolution submission
//! - `TrackerRepository`: durable resolved-market record

pub mod mailbox;
pub mod oracle;
pub mod repository;
pub mod settlement;
