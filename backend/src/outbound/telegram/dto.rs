//! Bot API request and response bodies used by the reply sink.

use serde::{Deserialize, Serialize};

use crate::domain::{Formatting, Reply};

#[derive(Debug, Serialize)]
pub(super) struct SendMessageDto<'a> {
    pub(super) chat_id: i64,
    pub(super) text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) reply_parameters: Option<ReplyParametersDto>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReplyParametersDto {
    pub(super) message_id: i64,
    pub(super) allow_sending_without_reply: bool,
}

impl<'a> From<&'a Reply> for SendMessageDto<'a> {
    fn from(reply: &'a Reply) -> Self {
        Self {
            chat_id: reply.chat_id.get(),
            text: reply.text.as_str(),
            parse_mode: match reply.formatting {
                Formatting::Plain => None,
                Formatting::RichText => Some("MarkdownV2"),
            },
            reply_parameters: reply.reply_to.map(|message_id| ReplyParametersDto {
                message_id,
                allow_sending_without_reply: true,
            }),
        }
    }
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub(super) struct ApiResponseDto {
    pub(super) ok: bool,
    #[serde(default)]
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) parameters: Option<ResponseParametersDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseParametersDto {
    #[serde(default)]
    pub(super) retry_after: Option<u64>,
}

impl ApiResponseDto {
    pub(super) fn retry_after(&self) -> Option<u64> {
        self.parameters.as_ref().and_then(|params| params.retry_after)
    }
}
