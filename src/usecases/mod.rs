//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the relay and resolution workflows. Each use case is a
//! self-contained business operation.
//!
//! Use cases:
//! - `Hub`: canonical order book + settlement authority
//! - `Spoke`: origin-domain order forwarding toward the hub
//! - `ResolutionBot`: oracle polling + idempotent settlement loop

pub mod hub;
pub mod resolution_bot;
pub mod spoke;
