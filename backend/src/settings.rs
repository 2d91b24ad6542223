//! Service configuration loaded via OrthoConfig.
//!
//! Every option may come from CLI flags, a configuration file or
//! `ACROSTIC_*` environment variables. [`AppSettings::resolve`] validates the
//! raw values once at startup and produces the typed [`ServiceConfig`] used
//! for wiring.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::{
    DEFAULT_LEADERBOARD_SIZE, MatchingMode, NumericTarget, Pattern, PatternValidationError,
    SequenceMatcher, UnknownMatchingMode,
};
use crate::inbound::http::state::WebhookSecret;
use crate::outbound::redis::RedisStoreConfig;
use crate::outbound::telegram::DEFAULT_API_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIS_POOL_SIZE: u32 = 16;
const DEFAULT_STORE_ATTEMPTS: u32 = 3;
const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);
const SECONDS_PER_DAY: u64 = 86_400;

/// Raw configuration values.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACROSTIC")]
pub struct AppSettings {
    /// Hidden word or phrase to look for.
    pub pattern: Option<String>,
    /// `letter-scan` (default) or `token-initial`.
    pub matching_mode: Option<String>,
    /// Enables the numeric-sum trigger for this target.
    pub numeric_target: Option<i64>,
    /// Entries shown by `/leaderboard`.
    pub leaderboard_size: Option<usize>,
    /// Expiry of per-user records, in days.
    pub counter_ttl_days: Option<u64>,
    /// Redis connection URL; the in-memory store is used when unset.
    pub redis_url: Option<String>,
    /// Maximum pooled Redis connections.
    pub redis_pool_size: Option<u32>,
    /// Attempts made to check out a store connection.
    pub store_attempts: Option<u32>,
    /// Bot API token; replies are only logged when unset.
    pub telegram_token: Option<String>,
    /// Bot API base URL.
    pub telegram_api_url: Option<String>,
    /// Expected webhook secret-token header.
    pub webhook_secret: Option<String>,
    /// Minimum delay between two replies in the same chat.
    pub reply_cooldown_secs: Option<u64>,
    /// HTTP listen address.
    pub bind_addr: Option<String>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("pattern", &self.pattern)
            .field("matching_mode", &self.matching_mode)
            .field("numeric_target", &self.numeric_target)
            .field("leaderboard_size", &self.leaderboard_size)
            .field("counter_ttl_days", &self.counter_ttl_days)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<redacted>"))
            .field("redis_pool_size", &self.redis_pool_size)
            .field("store_attempts", &self.store_attempts)
            .field(
                "telegram_token",
                &self.telegram_token.as_ref().map(|_| "<redacted>"),
            )
            .field("telegram_api_url", &self.telegram_api_url)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("reply_cooldown_secs", &self.reply_cooldown_secs)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

/// Reasons the configuration cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No pattern configured.
    #[error("a pattern is required (set ACROSTIC_PATTERN)")]
    MissingPattern,
    /// Pattern failed validation.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternValidationError),
    /// Matching mode not recognised.
    #[error(transparent)]
    MatchingMode(#[from] UnknownMatchingMode),
    /// Leaderboard would be empty.
    #[error("leaderboard size must be at least 1")]
    ZeroLeaderboardSize,
    /// Counter expiry of zero days.
    #[error("counter TTL must be at least one day")]
    ZeroCounterTtl,
    /// Listen address does not parse.
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        /// Configured value.
        value: String,
        /// Parser failure.
        source: std::net::AddrParseError,
    },
    /// Bot API base URL does not parse.
    #[error("invalid Bot API URL: {0}")]
    ApiUrl(#[from] url::ParseError),
}

/// Bot API connection settings.
pub struct TelegramConfig {
    /// Base URL of the Bot API.
    pub api_url: Url,
    /// Bot token; zeroed on drop.
    pub token: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Validated configuration used to wire the service.
pub struct ServiceConfig {
    /// Matcher built from the pattern and matching mode.
    pub matcher: SequenceMatcher,
    /// Optional numeric-sum trigger.
    pub numeric_target: Option<NumericTarget>,
    /// Entries shown by `/leaderboard`.
    pub leaderboard_size: usize,
    /// Expiry applied to per-user records.
    pub counter_ttl: Option<Duration>,
    /// Redis store settings, when a URL is configured.
    pub redis: Option<RedisStoreConfig>,
    /// Bot API settings, when a token is configured.
    pub telegram: Option<TelegramConfig>,
    /// Expected webhook secret.
    pub webhook_secret: Option<WebhookSecret>,
    /// Per-chat reply cooldown.
    pub reply_cooldown: Option<Duration>,
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
}

impl AppSettings {
    /// Validate raw values and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] for a missing or invalid pattern, an unknown
    /// matching mode, a zero leaderboard size or TTL, or an unparsable
    /// address.
    pub fn resolve(&self) -> Result<ServiceConfig, SettingsError> {
        let raw_pattern = non_blank(self.pattern.as_deref()).ok_or(SettingsError::MissingPattern)?;
        let pattern = Pattern::new(raw_pattern)?;
        let mode = match non_blank(self.matching_mode.as_deref()) {
            Some(raw) => raw.parse::<MatchingMode>()?,
            None => MatchingMode::default(),
        };

        let leaderboard_size = self.leaderboard_size.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
        if leaderboard_size == 0 {
            return Err(SettingsError::ZeroLeaderboardSize);
        }

        let counter_ttl = match self.counter_ttl_days {
            Some(0) => return Err(SettingsError::ZeroCounterTtl),
            Some(days) => Some(Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY))),
            None => None,
        };

        let bind_value = non_blank(self.bind_addr.as_deref()).unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr = bind_value
            .parse::<SocketAddr>()
            .map_err(|source| SettingsError::BindAddr {
                value: bind_value.to_owned(),
                source,
            })?;

        let redis = non_blank(self.redis_url.as_deref()).map(|url| {
            RedisStoreConfig::new(url)
                .with_max_size(self.redis_pool_size.unwrap_or(DEFAULT_REDIS_POOL_SIZE))
                .with_checkout_attempts(self.store_attempts.unwrap_or(DEFAULT_STORE_ATTEMPTS))
        });

        let telegram = match non_blank(self.telegram_token.as_deref()) {
            Some(token) => Some(TelegramConfig {
                api_url: Url::parse(
                    non_blank(self.telegram_api_url.as_deref()).unwrap_or(DEFAULT_API_URL),
                )?,
                token: Zeroizing::new(token.to_owned()),
                timeout: DEFAULT_SINK_TIMEOUT,
            }),
            None => None,
        };

        Ok(ServiceConfig {
            matcher: SequenceMatcher::new(pattern, mode),
            numeric_target: self.numeric_target.map(NumericTarget::new),
            leaderboard_size,
            counter_ttl,
            redis,
            telegram,
            webhook_secret: non_blank(self.webhook_secret.as_deref()).map(WebhookSecret::new),
            reply_cooldown: self
                .reply_cooldown_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            bind_addr,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
