//! Builders turning validated settings into wired ports and HTTP state.
//!
//! Order: store, sink (plus cooldown gate), pipeline, HTTP state. Each
//! component is constructed once and shared through `Arc`.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use tracing::{info, warn};

use acrostic::domain::ports::{CounterStore, LoggingReplySink, ReplySink};
use acrostic::domain::{ChatCooldownGate, GatedReplySink, MessagePipeline, ScoreLedger};
use acrostic::inbound::http::state::HttpState;
use acrostic::outbound::memory::InMemoryCounterStore;
use acrostic::outbound::redis::{RedisCounterStore, RedisStoreConfig};
use acrostic::outbound::telegram::TelegramReplySink;
use acrostic::settings::{ServiceConfig, TelegramConfig};

/// Select the Redis store when configured, otherwise the in-memory store.
fn build_store(redis: Option<RedisStoreConfig>) -> io::Result<Arc<dyn CounterStore>> {
    match redis {
        Some(config) => {
            let store = RedisCounterStore::connect(config)
                .map_err(|err| io::Error::other(format!("redis store: {err}")))?;
            info!(store = "redis", "counter store configured");
            Ok(Arc::new(store))
        }
        None => {
            warn!(
                store = "memory",
                "no redis URL configured; scores will not survive a restart"
            );
            Ok(Arc::new(InMemoryCounterStore::default()))
        }
    }
}

/// Select the Bot API sink when a token is configured, otherwise a sink that
/// only logs, then apply the optional per-chat cooldown.
fn build_sink(
    telegram: Option<TelegramConfig>,
    cooldown: Option<Duration>,
) -> io::Result<Arc<dyn ReplySink>> {
    let sink: Arc<dyn ReplySink> = match telegram {
        Some(config) => {
            let sink = TelegramReplySink::new(&config.api_url, &config.token, config.timeout)
                .map_err(|err| io::Error::other(format!("telegram sink: {err}")))?;
            info!(sink = "telegram", api = %config.api_url, "reply sink configured");
            Arc::new(sink)
        }
        None => {
            warn!(sink = "log", "no bot token configured; replies are only logged");
            Arc::new(LoggingReplySink)
        }
    };

    Ok(match cooldown {
        Some(cooldown) => {
            info!(cooldown_secs = cooldown.as_secs(), "per-chat reply cooldown enabled");
            let gate = ChatCooldownGate::new(Arc::new(DefaultClock), cooldown);
            Arc::new(GatedReplySink::new(sink, gate))
        }
        None => sink,
    })
}

/// Wire the message pipeline and webhook state from validated settings.
///
/// # Errors
/// Returns [`io::Error`] when the store or sink cannot be constructed.
pub fn build_http_state(config: ServiceConfig) -> io::Result<HttpState> {
    let ServiceConfig {
        matcher,
        numeric_target,
        leaderboard_size,
        counter_ttl,
        redis,
        telegram,
        webhook_secret,
        reply_cooldown,
        bind_addr: _,
    } = config;

    if webhook_secret.is_none() {
        warn!("no webhook secret configured; accepting unauthenticated updates");
    }
    info!(
        pattern = %matcher.pattern(),
        mode = %matcher.mode(),
        numeric_target = numeric_target.map(|target| target.get()),
        "pipeline configured"
    );

    let store = build_store(redis)?;
    let sink = build_sink(telegram, reply_cooldown)?;
    let ledger = ScoreLedger::new(store).with_user_ttl(counter_ttl);
    let pipeline = MessagePipeline::new(matcher, ledger, sink)
        .with_numeric_target(numeric_target)
        .with_leaderboard_size(leaderboard_size);

    Ok(HttpState::new(Arc::new(pipeline)).with_secret(webhook_secret))
}
