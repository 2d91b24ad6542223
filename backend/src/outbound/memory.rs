//! In-process counter store.
//!
//! Used when no Redis URL is configured and as the reference store in tests.
//! Each operation holds one lock for its whole read-modify-write, which gives
//! the same per-key atomicity as `HINCRBY`. Scans are paged over the sorted
//! key space so callers exercise their pagination logic; the cursor is the
//! position after the last key examined.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    CounterStore, CounterStoreError, ScanCursor, ScanPage, StoredRecord,
};
use crate::domain::RecordKey;

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Default, Clone)]
struct Entry {
    count: i64,
    fields: BTreeMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

/// Thread-safe [`CounterStore`] kept in memory.
pub struct InMemoryCounterStore {
    entries: Mutex<BTreeMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    page_size: usize,
    interleave: bool,
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryCounterStore {
    /// Create an empty store using `clock` for expiry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            clock,
            page_size: DEFAULT_PAGE_SIZE,
            interleave: false,
        }
    }

    /// Return at most `page_size` records per scan page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Yield to the scheduler before every operation so concurrent callers
    /// interleave between each other's writes.
    pub fn with_interleaving(mut self) -> Self {
        self.interleave = true;
        self
    }

    /// Current counter of `key`, or `None` when absent or expired.
    pub fn count(&self, key: &RecordKey) -> Option<i64> {
        let now = self.clock.utc();
        self.lock()
            .get(key.as_str())
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.count)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        if self.interleave {
            tokio::task::yield_now().await;
        }
    }

    /// Fetch a live entry for writing, replacing an expired one.
    fn live_entry<'a>(
        entries: &'a mut BTreeMap<String, Entry>,
        key: &RecordKey,
        now: DateTime<Utc>,
    ) -> &'a mut Entry {
        let entry = entries.entry(key.as_str().to_owned()).or_default();
        if !entry.is_live(now) {
            *entry = Entry::default();
        }
        entry
    }

    /// Expiry instant for a write at `now`; a TTL too large to represent
    /// never expires.
    fn deadline(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
        ttl.and_then(|ttl| TimeDelta::from_std(ttl).ok())
            .and_then(|delta| now.checked_add_signed(delta))
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(
        &self,
        key: &RecordKey,
        amount: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, CounterStoreError> {
        self.pause().await;
        let now = self.clock.utc();
        let mut entries = self.lock();
        let entry = Self::live_entry(&mut entries, key, now);
        entry.count = entry.count.checked_add(amount).ok_or_else(|| {
            CounterStoreError::command(format!("increment would overflow {key}"))
        })?;
        if ttl.is_some() {
            entry.expires_at = Self::deadline(now, ttl);
        }
        Ok(entry.count)
    }

    async fn set_field(
        &self,
        key: &RecordKey,
        field: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CounterStoreError> {
        self.pause().await;
        let now = self.clock.utc();
        let mut entries = self.lock();
        let entry = Self::live_entry(&mut entries, key, now);
        entry.fields.insert(field.to_owned(), value.to_owned());
        if ttl.is_some() {
            entry.expires_at = Self::deadline(now, ttl);
        }
        Ok(())
    }

    async fn scan_page(
        &self,
        prefix: &str,
        cursor: ScanCursor,
    ) -> Result<ScanPage, CounterStoreError> {
        self.pause().await;
        let now = self.clock.utc();
        let entries = self.lock();
        let start = usize::try_from(cursor.0).unwrap_or(usize::MAX);

        // Keys are never removed, only reset, so a position in the prefix
        // range stays valid while earlier records expire.
        let mut scanned = entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .enumerate()
            .skip(start);
        let mut records = Vec::new();
        let mut position = start;
        for (index, (key, entry)) in scanned.by_ref() {
            position = index.saturating_add(1);
            if !entry.is_live(now) {
                continue;
            }
            records.push(StoredRecord {
                key: RecordKey::from_raw(key.as_str()),
                count: entry.count,
                fields: entry.fields.clone(),
            });
            if records.len() == self.page_size {
                break;
            }
        }
        let more = scanned.any(|(_, (_, entry))| entry.is_live(now));
        let next = more.then(|| ScanCursor(u64::try_from(position).unwrap_or(u64::MAX)));

        Ok(ScanPage { records, next })
    }
}
