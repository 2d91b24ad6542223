//! Port for the shared counter store backing the score ledger.
//!
//! The store holds hash-like records addressed by [`RecordKey`]. Adapters
//! must make [`CounterStore::increment`] atomic per key: concurrent callers
//! never lose an update. Nothing else is transactional.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::RecordKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by counter store adapters.
    pub enum CounterStoreError {
        /// No connection to the store could be obtained.
        Connection { message: String } =>
            "counter store connection failed: {message}" as transient,
        /// The store rejected or failed a command.
        Command { message: String } =>
            "counter store command failed: {message}",
        /// A stored value could not be decoded.
        Decode { key: String, message: String } =>
            "counter store value at {key} is malformed: {message}",
    }
}

/// One record returned by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Record key.
    pub key: RecordKey,
    /// Counter value; `0` when the record has no counter field.
    pub count: i64,
    /// Remaining string fields, such as the cached display name.
    pub fields: BTreeMap<String, String>,
}

/// Opaque continuation token for paged scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanCursor(pub u64);

impl ScanCursor {
    /// Cursor that starts a new scan.
    pub const START: Self = Self(0);
}

/// One page of a prefix scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanPage {
    /// Records in this page. Pages may repeat records across a scan.
    pub records: Vec<StoredRecord>,
    /// Cursor for the next page, or `None` when the scan is complete.
    pub next: Option<ScanCursor>,
}

/// Driven port: counter records with optional expiry and prefix scans.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add `amount` to the record's counter, creating it at zero
    /// when absent, and return the new value.
    ///
    /// When `ttl` is set the record expires that long after this write.
    async fn increment(
        &self,
        key: &RecordKey,
        amount: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, CounterStoreError>;

    /// Overwrite one string field of a record. Last writer wins.
    async fn set_field(
        &self,
        key: &RecordKey,
        field: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CounterStoreError>;

    /// Fetch one page of records whose keys start with `prefix`.
    async fn scan_page(
        &self,
        prefix: &str,
        cursor: ScanCursor,
    ) -> Result<ScanPage, CounterStoreError>;
}
