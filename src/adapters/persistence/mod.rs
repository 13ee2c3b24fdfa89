//! Persistence Adapters - Durable Tracker Storage
//!
//! Implements the TrackerRepository port with an atomic JSON
//! document. No database dependency — lightweight and
//! crash-recoverable.

pub mod tracker;

pub use tracker::MarketTrackerStore;
