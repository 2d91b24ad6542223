//! Port for delivering replies to a chat.

use async_trait::async_trait;
use tracing::info;

use crate::domain::Reply;

use super::define_port_error;

define_port_error! {
    /// Errors raised by reply delivery adapters.
    pub enum ReplySinkError {
        /// The platform could not be reached or answered unexpectedly.
        Transport { message: String } =>
            "reply transport failed: {message}" as transient,
        /// The platform refused the message, for example malformed markup.
        Rejected { message: String } =>
            "reply rejected: {message}",
        /// The platform or a local gate asked us to slow down.
        RateLimited { retry_after_secs: u64 } =>
            "reply rate limited; retry after {retry_after_secs}s" as transient,
    }
}

/// Driven port: deliver a reply to a chat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver one reply.
    async fn send(&self, reply: &Reply) -> Result<(), ReplySinkError>;
}

/// Sink that only logs replies. Used when no bot token is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingReplySink;

#[async_trait]
impl ReplySink for LoggingReplySink {
    async fn send(&self, reply: &Reply) -> Result<(), ReplySinkError> {
        info!(
            chat_id = %reply.chat_id,
            reply_to = ?reply.reply_to,
            text = %reply.text,
            "reply (not delivered)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, Formatting};
    use rstest::rstest;

    #[tokio::test]
    async fn logging_sink_accepts_every_reply() {
        let reply = Reply {
            chat_id: ChatId::new(1),
            reply_to: None,
            text: "hello".to_owned(),
            formatting: Formatting::Plain,
        };
        LoggingReplySink
            .send(&reply)
            .await
            .expect("logging sink never fails");
    }

    #[rstest]
    fn rejection_is_permanent() {
        assert!(!ReplySinkError::rejected("can't parse entities").is_transient());
        assert!(ReplySinkError::rate_limited(3_u64).is_transient());
        assert!(ReplySinkError::transport("timeout").is_transient());
    }
}
