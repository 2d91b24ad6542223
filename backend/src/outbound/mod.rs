//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **redis**: Redis-backed `CounterStore` over a `bb8` pool
//! - **memory**: in-process `CounterStore` for single-instance runs and tests
//! - **telegram**: Bot API `ReplySink`
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod redis;
pub mod telegram;
