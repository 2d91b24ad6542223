//! Domain primitives and services.
//!
//! Purpose: detect the hidden pattern in chat messages, mask it in the echoed
//! text, and keep per-user and global scores. Nothing here knows about HTTP,
//! Redis or the chat platform's API; adapters reach the domain through the
//! traits in [`ports`].
//!
//! Public surface:
//! - [`SequenceMatcher`] and [`obfuscate`]: pure text algorithms.
//! - [`ScoreLedger`]: counter updates and the ranked leaderboard.
//! - [`MessagePipeline`]: per-message orchestration behind [`ports::ChatCommand`].
//! - [`GatedReplySink`]: optional per-chat cooldown in front of a reply sink.

pub mod error;
pub mod ledger;
pub mod markdown;
pub mod matcher;
pub mod message;
pub mod numeric;
pub mod obfuscate;
pub mod pattern;
pub mod pipeline;
pub mod ports;
pub mod reply_gate;
pub mod score;

pub use self::error::{Error, ErrorCode};
pub use self::ledger::{DEFAULT_LEADERBOARD_SIZE, ScoreLedger};
pub use self::matcher::{
    DisplayText, MatchResult, Scan, SequenceMatcher, match_letters, match_token_initials,
};
pub use self::message::{
    ChatId, Formatting, InboundMessage, MalformedInput, Reply, Sender, SenderId,
};
pub use self::numeric::{NumericSum, NumericTarget, find_numbers};
pub use self::obfuscate::{MARKER, obfuscate, obfuscate_with};
pub use self::pattern::{MatchingMode, Pattern, PatternValidationError, UnknownMatchingMode};
pub use self::pipeline::{MessagePipeline, Outcome, PipelineError};
pub use self::reply_gate::{ChatCooldownGate, GatedReplySink};
pub use self::score::{
    COUNT_FIELD, CounterKind, LeaderboardEntry, NAME_FIELD, RecordKey, ScoreEvent, ScoreUpdate,
};
