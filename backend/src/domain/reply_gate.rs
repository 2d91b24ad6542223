//! Per-chat reply cooldown placed in front of a [`ReplySink`].
//!
//! The gate is a fixed window: after a reply is let through to a chat, further
//! replies to that chat are refused until the cooldown has elapsed. Refused
//! replies surface as [`ReplySinkError::RateLimited`] and are not queued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::debug;

use super::message::{ChatId, Reply};
use super::ports::{ReplySink, ReplySinkError};

/// Tracked chats before stale windows are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Fixed-window cooldown keyed by chat.
pub struct ChatCooldownGate {
    clock: Arc<dyn Clock>,
    cooldown: TimeDelta,
    last_sent: Mutex<HashMap<ChatId, DateTime<Utc>>>,
}

impl ChatCooldownGate {
    /// Create a gate allowing one reply per chat every `cooldown`.
    pub fn new(clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown: TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX),
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the chat's window, or report how long until it reopens.
    pub fn try_acquire(&self, chat_id: ChatId) -> Result<(), Duration> {
        let now = self.clock.utc();
        let mut last_sent = self
            .last_sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(&previous) = last_sent.get(&chat_id) {
            let elapsed = now.signed_duration_since(previous);
            if elapsed < self.cooldown {
                let remaining = (self.cooldown - elapsed).to_std().unwrap_or_default();
                return Err(remaining);
            }
        }

        if last_sent.len() >= PRUNE_THRESHOLD {
            let cooldown = self.cooldown;
            last_sent.retain(|_, sent| now.signed_duration_since(*sent) < cooldown);
        }
        last_sent.insert(chat_id, now);
        Ok(())
    }
}

/// [`ReplySink`] decorator enforcing a [`ChatCooldownGate`].
pub struct GatedReplySink {
    inner: Arc<dyn ReplySink>,
    gate: ChatCooldownGate,
}

impl GatedReplySink {
    /// Wrap `inner` so every send first passes `gate`.
    pub fn new(inner: Arc<dyn ReplySink>, gate: ChatCooldownGate) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl ReplySink for GatedReplySink {
    async fn send(&self, reply: &Reply) -> Result<(), ReplySinkError> {
        if let Err(remaining) = self.gate.try_acquire(reply.chat_id) {
            let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            debug!(chat_id = %reply.chat_id, retry_after_secs, "reply held back by cooldown");
            return Err(ReplySinkError::rate_limited(retry_after_secs));
        }
        self.inner.send(reply).await
    }
}
