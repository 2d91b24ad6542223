//! Score events, ledger results and the store key layout.

use std::fmt;

use super::message::SenderId;

/// Field holding the counter value inside a stored record.
pub const COUNT_FIELD: &str = "count";
/// Field holding the latest display name inside a per-user record.
pub const NAME_FIELD: &str = "name";

const KEY_NAMESPACE: &str = "acrostic";

/// Counter family a match event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// The hidden pattern was found.
    Pattern,
    /// The numbers in a message summed to the configured target.
    NumericSum,
}

impl CounterKind {
    /// Stable name used in store keys and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::NumericSum => "numeric",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One confirmed match by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEvent {
    /// Counter family to increment.
    pub kind: CounterKind,
    /// Acting user.
    pub user_id: SenderId,
    /// Latest display name, written next to the user's counter.
    pub display_name: String,
}

/// Counter values after a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    /// The acting user's counter for the event's kind.
    pub user_score: i64,
    /// The global counter for the event's kind.
    pub global_score: i64,
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Last stored display name.
    pub display_name: String,
    /// Stable user identifier.
    pub user_id: SenderId,
    /// Counter value.
    pub score: i64,
}

/// Store key of a score record.
///
/// Per-user records live at `acrostic:{kind}:user:{id}` and the global
/// counter at `acrostic:{kind}:global`, so one prefix scan returns every
/// per-user record of a kind and nothing else.
///
/// # Examples
/// ```
/// use acrostic::domain::{CounterKind, RecordKey, SenderId};
///
/// let key = RecordKey::user(CounterKind::Pattern, SenderId::new(42));
/// assert_eq!(key.as_str(), "acrostic:pattern:user:42");
/// assert_eq!(key.user_id(CounterKind::Pattern), Some(SenderId::new(42)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(String);

impl RecordKey {
    /// Wrap an existing key, typically one returned by a store scan.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Key of `user_id`'s counter for `kind`.
    pub fn user(kind: CounterKind, user_id: SenderId) -> Self {
        Self(format!("{}{user_id}", Self::user_prefix(kind)))
    }

    /// Key of the global counter for `kind`.
    pub fn global(kind: CounterKind) -> Self {
        Self(format!("{KEY_NAMESPACE}:{kind}:global"))
    }

    /// Prefix shared by every per-user key of `kind`.
    pub fn user_prefix(kind: CounterKind) -> String {
        format!("{KEY_NAMESPACE}:{kind}:user:")
    }

    /// User encoded in a per-user key of `kind`, if this is one.
    pub fn user_id(&self, kind: CounterKind) -> Option<SenderId> {
        self.0
            .strip_prefix(&Self::user_prefix(kind))
            .and_then(|suffix| suffix.parse().ok())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CounterKind::Pattern, "acrostic:pattern:global")]
    #[case(CounterKind::NumericSum, "acrostic:numeric:global")]
    fn global_keys_are_per_kind(#[case] kind: CounterKind, #[case] expected: &str) {
        assert_eq!(RecordKey::global(kind).as_str(), expected);
    }

    #[rstest]
    fn global_key_is_not_under_user_prefix() {
        let kind = CounterKind::Pattern;
        let global = RecordKey::global(kind);
        assert!(!global.as_str().starts_with(&RecordKey::user_prefix(kind)));
        assert_eq!(global.user_id(kind), None);
    }

    #[rstest]
    fn user_id_is_only_decoded_for_matching_kind() {
        let key = RecordKey::user(CounterKind::NumericSum, SenderId::new(-5));
        assert_eq!(key.user_id(CounterKind::NumericSum), Some(SenderId::new(-5)));
        assert_eq!(key.user_id(CounterKind::Pattern), None);
    }

    #[rstest]
    fn garbage_suffix_is_not_a_user() {
        let key = RecordKey::from_raw("acrostic:pattern:user:someone");
        assert_eq!(key.user_id(CounterKind::Pattern), None);
    }
}
