//! Redis-backed counter store.
//!
//! Records are Redis hashes. The counter lives in the `count` field and is
//! bumped with `HINCRBY`, which Redis executes atomically, so concurrent
//! writers never lose an increment. Expiry is applied in the same
//! `MULTI`/`EXEC` block as the write it belongs to.
//!
//! Connections come from a `bb8` pool. Checking a connection out is retried a
//! bounded number of times because nothing has been written yet; commands
//! themselves are issued exactly once.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::{debug, warn};

use crate::domain::ports::{
    CounterStore, CounterStoreError, ScanCursor, ScanPage, StoredRecord,
};
use crate::domain::{COUNT_FIELD, RecordKey};

/// Configuration for [`RedisCounterStore`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use acrostic::outbound::redis::RedisStoreConfig;
///
/// let config = RedisStoreConfig::new("redis://127.0.0.1:6379")
///     .with_max_size(32)
///     .with_checkout_attempts(5)
///     .with_connection_timeout(Duration::from_secs(2));
/// assert_eq!(config.redis_url(), "redis://127.0.0.1:6379");
/// ```
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    redis_url: String,
    max_size: u32,
    connection_timeout: Duration,
    checkout_attempts: u32,
    checkout_backoff: Duration,
    scan_count: usize,
}

impl RedisStoreConfig {
    /// Create a configuration with defaults:
    /// - `max_size`: 16 connections
    /// - `connection_timeout`: 5 seconds
    /// - `checkout_attempts`: 3
    /// - `scan_count`: 100 keys per `SCAN` hint
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            max_size: 16,
            connection_timeout: Duration::from_secs(5),
            checkout_attempts: 3,
            checkout_backoff: Duration::from_millis(50),
            scan_count: 100,
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set how long one checkout may wait for a connection.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set how many times a checkout is attempted before giving up. Values
    /// below one are treated as one.
    pub fn with_checkout_attempts(mut self, attempts: u32) -> Self {
        self.checkout_attempts = attempts.max(1);
        self
    }

    /// Set the `COUNT` hint sent with each `SCAN`.
    pub fn with_scan_count(mut self, count: usize) -> Self {
        self.scan_count = count.max(1);
        self
    }

    /// Get the Redis URL.
    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

/// [`CounterStore`] over a pooled Redis connection.
#[derive(Clone)]
pub struct RedisCounterStore {
    pool: Pool<RedisConnectionManager>,
    config: RedisStoreConfig,
}

impl RedisCounterStore {
    /// Build the pool. No connection is opened until first use.
    ///
    /// # Errors
    ///
    /// Returns [`CounterStoreError::Connection`] when the URL is invalid.
    pub fn connect(config: RedisStoreConfig) -> Result<Self, CounterStoreError> {
        let manager = RedisConnectionManager::new(config.redis_url.as_str())
            .map_err(|err| CounterStoreError::connection(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(manager);
        Ok(Self { pool, config })
    }

    async fn checkout(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, CounterStoreError> {
        let mut attempt = 1;
        loop {
            match self.pool.get().await {
                Ok(conn) => return Ok(conn),
                Err(err) if attempt < self.config.checkout_attempts => {
                    debug!(attempt, error = %err, "redis checkout failed; retrying");
                    tokio::time::sleep(self.config.checkout_backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempts = attempt, error = %err, "redis checkout failed");
                    return Err(map_checkout_error(err));
                }
            }
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(
        &self,
        key: &RecordKey,
        amount: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, CounterStoreError> {
        let mut conn = self.checkout().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("HINCRBY")
            .arg(key.as_str())
            .arg(COUNT_FIELD)
            .arg(amount);
        if let Some(ttl) = ttl {
            pipe.cmd("EXPIRE").arg(key.as_str()).arg(ttl_secs(ttl)).ignore();
        }
        let (value,): (i64,) = pipe.query_async(&mut *conn).await.map_err(map_redis_error)?;
        Ok(value)
    }

    async fn set_field(
        &self,
        key: &RecordKey,
        field: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CounterStoreError> {
        let mut conn = self.checkout().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("HSET")
            .arg(key.as_str())
            .arg(field)
            .arg(value)
            .ignore();
        if let Some(ttl) = ttl {
            pipe.cmd("EXPIRE").arg(key.as_str()).arg(ttl_secs(ttl)).ignore();
        }
        let () = pipe.query_async(&mut *conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn scan_page(
        &self,
        prefix: &str,
        cursor: ScanCursor,
    ) -> Result<ScanPage, CounterStoreError> {
        let mut conn = self.checkout().await?;
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor.0)
            .arg("MATCH")
            .arg(match_pattern(prefix))
            .arg("COUNT")
            .arg(self.config.scan_count)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;

        let mut records = Vec::with_capacity(keys.len());
        if !keys.is_empty() {
            let mut pipe = redis::pipe();
            for key in &keys {
                pipe.cmd("HGETALL").arg(key);
            }
            let hashes: Vec<HashMap<String, String>> =
                pipe.query_async(&mut *conn).await.map_err(map_redis_error)?;
            for (key, hash) in keys.into_iter().zip(hashes) {
                if let Some(record) = decode_record(key, hash)? {
                    records.push(record);
                }
            }
        }

        Ok(ScanPage {
            records,
            next: (next != 0).then_some(ScanCursor(next)),
        })
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Glob for `SCAN MATCH` selecting every key that starts with `prefix`.
fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

/// Turn an `HGETALL` reply into a record. Keys that expired between `SCAN`
/// and `HGETALL` come back empty and are dropped.
fn decode_record(
    key: String,
    mut hash: HashMap<String, String>,
) -> Result<Option<StoredRecord>, CounterStoreError> {
    if hash.is_empty() {
        return Ok(None);
    }
    let count = match hash.remove(COUNT_FIELD) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|err| CounterStoreError::decode(key.as_str(), err.to_string()))?,
        None => 0,
    };
    Ok(Some(StoredRecord {
        key: RecordKey::from_raw(key),
        count,
        fields: hash.into_iter().collect::<BTreeMap<_, _>>(),
    }))
}

fn map_redis_error(err: RedisError) -> CounterStoreError {
    if err.is_io_error()
        || err.is_timeout()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
    {
        CounterStoreError::connection(err.to_string())
    } else {
        CounterStoreError::command(err.to_string())
    }
}

fn map_checkout_error(err: RunError<RedisError>) -> CounterStoreError {
    match err {
        RunError::User(err) => map_redis_error(err),
        RunError::TimedOut => CounterStoreError::connection("timed out waiting for a connection"),
    }
}
