//! Score ledger: per-user and global counters plus the ranked leaderboard.
//!
//! Every increment is atomic in the store, but the user and global counters
//! for one event are independent writes. A failure between them leaves the
//! two out of step; counters are display-only, so that is tolerated.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::ports::{CounterStore, CounterStoreError, ScanCursor};
use super::score::{
    CounterKind, LeaderboardEntry, NAME_FIELD, RecordKey, ScoreEvent, ScoreUpdate,
};

/// Default number of leaderboard entries.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Records match events against a [`CounterStore`].
#[derive(Clone)]
pub struct ScoreLedger {
    store: Arc<dyn CounterStore>,
    user_ttl: Option<Duration>,
}

impl ScoreLedger {
    /// Create a ledger whose per-user records never expire.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            user_ttl: None,
        }
    }

    /// Expire per-user records `ttl` after their last update. The global
    /// counter never expires.
    pub fn with_user_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.user_ttl = ttl;
        self
    }

    /// Increment the acting user's and the global counter for the event's
    /// kind, refreshing the user's display name, and return both values.
    ///
    /// The writes run on a spawned task so a caller that gives up waiting
    /// does not abandon them half applied. Nothing is retried.
    pub async fn record_match(&self, event: ScoreEvent) -> Result<ScoreUpdate, CounterStoreError> {
        let store = Arc::clone(&self.store);
        let user_ttl = self.user_ttl;
        let task = tokio::spawn(async move { apply_event(store.as_ref(), &event, user_ttl).await });
        task.await.map_err(|err| {
            CounterStoreError::command(format!("score update task did not complete: {err}"))
        })?
    }

    /// Highest `limit` per-user scores for `kind`, highest first.
    ///
    /// Scans every page before sorting. Ties keep scan order.
    pub async fn top(
        &self,
        kind: CounterKind,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, CounterStoreError> {
        let prefix = RecordKey::user_prefix(kind);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut cursor = ScanCursor::START;
        let mut pages = 0_usize;

        loop {
            let page = self.store.scan_page(&prefix, cursor).await?;
            pages += 1;
            for record in page.records {
                let Some(user_id) = record.key.user_id(kind) else {
                    continue;
                };
                // A paged scan may return the same key twice.
                if !seen.insert(user_id) {
                    continue;
                }
                let display_name = record
                    .fields
                    .get(NAME_FIELD)
                    .cloned()
                    .unwrap_or_else(|| user_id.to_string());
                entries.push(LeaderboardEntry {
                    display_name,
                    user_id,
                    score: record.count,
                });
            }
            match page.next {
                Some(next) => cursor = next,
                None => break,
            }
        }

        debug!(%kind, pages, users = entries.len(), "scanned leaderboard");
        entries.sort_by(|left, right| right.score.cmp(&left.score));
        entries.truncate(limit);
        Ok(entries)
    }
}

async fn apply_event(
    store: &dyn CounterStore,
    event: &ScoreEvent,
    user_ttl: Option<Duration>,
) -> Result<ScoreUpdate, CounterStoreError> {
    let user_key = RecordKey::user(event.kind, event.user_id);
    let global_key = RecordKey::global(event.kind);

    let user = async {
        let score = store.increment(&user_key, 1, user_ttl).await?;
        store
            .set_field(&user_key, NAME_FIELD, &event.display_name, user_ttl)
            .await?;
        Ok::<_, CounterStoreError>(score)
    };
    let global = store.increment(&global_key, 1, None);

    let (user_score, global_score) = tokio::join!(user, global);
    Ok(ScoreUpdate {
        user_score: user_score?,
        global_score: global_score?,
    })
}
