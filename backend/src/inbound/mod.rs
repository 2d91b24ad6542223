//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! The chat platform reaches the service through the webhook under [`http`].

pub mod http;
