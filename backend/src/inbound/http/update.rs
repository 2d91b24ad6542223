//! Wire types for chat platform webhook updates.
//!
//! Only the fields the service reads are modelled; unknown fields are
//! ignored by serde so new platform additions never break decoding.

use serde::Deserialize;

use crate::domain::{
    ChatId, CounterKind, InboundMessage, MalformedInput, Sender, SenderId,
};

const LEADERBOARD_COMMAND: &str = "leaderboard";

/// Top-level webhook payload.
#[derive(Debug, Deserialize)]
pub struct UpdateDto {
    /// Monotonic update identifier assigned by the platform.
    pub update_id: i64,
    /// New incoming message, absent for edits, callbacks and the like.
    #[serde(default)]
    pub message: Option<MessageDto>,
}

/// Message carried by an update.
#[derive(Debug, Deserialize)]
pub struct MessageDto {
    /// Message identifier within the chat.
    pub message_id: i64,
    /// Conversation the message belongs to.
    pub chat: ChatDto,
    /// Author; absent for channel posts.
    #[serde(default)]
    pub from: Option<UserDto>,
    /// Text body; absent for stickers, photos and other media.
    #[serde(default)]
    pub text: Option<String>,
}

/// Chat reference.
#[derive(Debug, Deserialize)]
pub struct ChatDto {
    /// Chat identifier.
    pub id: i64,
}

/// Message author.
#[derive(Debug, Deserialize)]
pub struct UserDto {
    /// User identifier.
    pub id: i64,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Handle without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
}

/// What the webhook should do with a decoded update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Run the message through the detection pipeline.
    Text(InboundMessage),
    /// Answer with a leaderboard.
    Leaderboard(InboundMessage, CounterKind),
    /// A command this service does not handle.
    Ignored,
}

impl UpdateDto {
    /// Convert the update into a domain message.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInput`] when the update lacks a message, a sender
    /// or non-blank text.
    pub fn into_inbound(self) -> Result<InboundMessage, MalformedInput> {
        let message = self.message.ok_or(MalformedInput::MissingMessage)?;
        let from = message.from.ok_or(MalformedInput::MissingSender)?;
        let text = message.text.ok_or(MalformedInput::MissingText)?;
        let sender = Sender::from_parts(
            SenderId::new(from.id),
            from.first_name.as_deref(),
            from.last_name.as_deref(),
            from.username.as_deref(),
        );
        InboundMessage::new(
            ChatId::new(message.chat.id),
            Some(message.message_id),
            sender,
            text,
        )
    }

    /// Decode and classify the update in one step.
    ///
    /// # Errors
    ///
    /// Propagates [`UpdateDto::into_inbound`] failures.
    pub fn into_dispatch(self) -> Result<Dispatch, MalformedInput> {
        let message = self.into_inbound()?;
        Ok(classify(message))
    }
}

/// Route a message to the leaderboard, the pipeline, or nowhere.
///
/// Commands look like `/name[@bot] [args]`. `/leaderboard sums` selects the
/// numeric board; any other argument selects the pattern board.
pub fn classify(message: InboundMessage) -> Dispatch {
    let Some(command_line) = message.text.trim_start().strip_prefix('/') else {
        return Dispatch::Text(message);
    };
    let mut words = command_line.split_whitespace();
    let name = words
        .next()
        .and_then(|word| word.split('@').next())
        .unwrap_or_default();
    if !name.eq_ignore_ascii_case(LEADERBOARD_COMMAND) {
        return Dispatch::Ignored;
    }

    let kind = match words.next().map(str::to_ascii_lowercase).as_deref() {
        Some("sums" | "sum" | "numeric") => CounterKind::NumericSum,
        _ => CounterKind::Pattern,
    };
    Dispatch::Leaderboard(message, kind)
}
