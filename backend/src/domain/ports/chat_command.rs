//! Driving port for chat traffic.
//!
//! Inbound adapters hand authenticated messages to [`ChatCommand`] and decide
//! how to answer their own transport based on the returned outcome.

use async_trait::async_trait;

use crate::domain::{CounterKind, InboundMessage, Outcome, PipelineError};

/// Driving port: handle one chat message or leaderboard command.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCommand: Send + Sync {
    /// Inspect a plain-text message and reply when it hides the pattern or
    /// its numbers hit the target.
    async fn handle_text(&self, message: &InboundMessage) -> Result<Outcome, PipelineError>;

    /// Reply with the ranked leaderboard for `kind`.
    async fn show_leaderboard(
        &self,
        message: &InboundMessage,
        kind: CounterKind,
    ) -> Result<Outcome, PipelineError>;
}
