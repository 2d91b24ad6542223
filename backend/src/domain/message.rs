//! Chat-facing value types shared by the pipeline and its adapters.

use std::fmt;

use thiserror::Error;

/// Identifier of the chat a message arrived in and replies go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(i64);

impl ChatId {
    /// Wrap a raw chat identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier as delivered by the chat platform.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderId(i64);

impl SenderId {
    /// Wrap a raw user identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier as delivered by the chat platform.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SenderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Stable identifier used as the score key.
    pub id: SenderId,
    /// Human readable name; overwritten in the store on every score update.
    pub display_name: String,
    /// Optional `@handle` without the leading `@`.
    pub handle: Option<String>,
}

impl Sender {
    /// Build a sender from the name parts a chat platform usually exposes.
    ///
    /// The display name is `first last` when present, otherwise `@handle`,
    /// otherwise the numeric identifier.
    ///
    /// # Examples
    /// ```
    /// use acrostic::domain::{Sender, SenderId};
    ///
    /// let sender = Sender::from_parts(SenderId::new(7), Some("Ada"), None, Some("ada"));
    /// assert_eq!(sender.display_name, "Ada");
    ///
    /// let anonymous = Sender::from_parts(SenderId::new(7), None, None, Some("ada"));
    /// assert_eq!(anonymous.display_name, "@ada");
    /// ```
    pub fn from_parts(
        id: SenderId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        handle: Option<&str>,
    ) -> Self {
        let full_name = [first_name, last_name]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let handle = handle
            .map(|raw| raw.trim().trim_start_matches('@').to_owned())
            .filter(|raw| !raw.is_empty());

        let display_name = if !full_name.is_empty() {
            full_name
        } else if let Some(handle) = handle.as_deref() {
            format!("@{handle}")
        } else {
            id.to_string()
        };

        Self {
            id,
            display_name,
            handle,
        }
    }
}

/// A text message that reached the core after transport authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message was posted in.
    pub chat_id: ChatId,
    /// Platform identifier of the message, used to quote it in replies.
    pub message_id: Option<i64>,
    /// Author of the message.
    pub sender: Sender,
    /// Raw message text.
    pub text: String,
}

/// Reasons an inbound event cannot be processed. These are skipped
/// silently rather than reported to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedInput {
    /// The update carries no message.
    #[error("update carries no message")]
    MissingMessage,
    /// The message has no author.
    #[error("message has no sender")]
    MissingSender,
    /// The message has no text, or only whitespace.
    #[error("message has no text")]
    MissingText,
}

impl InboundMessage {
    /// Assemble a message, rejecting blank text.
    ///
    /// # Examples
    /// ```
    /// use acrostic::domain::{ChatId, InboundMessage, MalformedInput, Sender, SenderId};
    ///
    /// let sender = Sender::from_parts(SenderId::new(1), Some("Ada"), None, None);
    /// let err = InboundMessage::new(ChatId::new(9), None, sender, "   ").unwrap_err();
    /// assert_eq!(err, MalformedInput::MissingText);
    /// ```
    pub fn new(
        chat_id: ChatId,
        message_id: Option<i64>,
        sender: Sender,
        text: impl Into<String>,
    ) -> Result<Self, MalformedInput> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(MalformedInput::MissingText);
        }
        Ok(Self {
            chat_id,
            message_id,
            sender,
            text,
        })
    }
}

/// Formatting mode requested from the delivery sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    /// Deliver the text verbatim.
    Plain,
    /// Text is already escaped for the sink's rich-text dialect.
    RichText,
}

/// Outbound message handed to a [`crate::domain::ports::ReplySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Destination chat.
    pub chat_id: ChatId,
    /// Message to quote, when the platform supports threading replies.
    pub reply_to: Option<i64>,
    /// Payload text.
    pub text: String,
    /// How the sink should interpret `text`.
    pub formatting: Formatting,
}

impl Reply {
    /// Build a rich-text reply quoting `message`.
    pub fn rich_text_to(message: &InboundMessage, text: String) -> Self {
        Self {
            chat_id: message.chat_id,
            reply_to: message.message_id,
            text,
            formatting: Formatting::RichText,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Ada"), Some("Lovelace"), Some("ada"), "Ada Lovelace")]
    #[case(Some("  Ada "), None, None, "Ada")]
    #[case(None, Some("Lovelace"), None, "Lovelace")]
    #[case(Some(" "), None, Some("@ada"), "@ada")]
    #[case(None, None, None, "42")]
    fn display_name_falls_back_in_order(
        #[case] first: Option<&str>,
        #[case] last: Option<&str>,
        #[case] handle: Option<&str>,
        #[case] expected: &str,
    ) {
        let sender = Sender::from_parts(SenderId::new(42), first, last, handle);
        assert_eq!(sender.display_name, expected);
    }

    #[rstest]
    fn handle_is_stored_without_at_sign() {
        let sender = Sender::from_parts(SenderId::new(1), None, None, Some("@owlfan"));
        assert_eq!(sender.handle.as_deref(), Some("owlfan"));
    }

    #[rstest]
    fn message_keeps_text_verbatim() {
        let sender = Sender::from_parts(SenderId::new(3), Some("Ada"), None, None);
        let message = InboundMessage::new(ChatId::new(-10), Some(77), sender, " Orange Was ")
            .expect("non-blank text");
        assert_eq!(message.text, " Orange Was ");
        assert_eq!(message.message_id, Some(77));
    }

    #[rstest]
    fn sender_id_parses_from_key_segments() {
        let id: SenderId = "-100123".parse().expect("numeric id");
        assert_eq!(id.get(), -100_123);
        assert!("abc".parse::<SenderId>().is_err());
    }
}
