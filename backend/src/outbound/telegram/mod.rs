//! Telegram outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `ReplySink` port
//! over the Bot API.

mod dto;
mod http_sink;

pub use http_sink::{DEFAULT_API_URL, TelegramReplySink, TelegramSinkBuildError};
