//! Acrostic detection service.
//!
//! Watches chat messages for a hidden word spelled out in order, echoes the
//! message with the letters marked, and keeps per-user and global scores.
//!
//! Layout follows ports and adapters: [`domain`] holds the algorithms and
//! use-cases, [`inbound`] the webhook, [`outbound`] the store and delivery
//! adapters, and [`settings`] the startup configuration.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;
