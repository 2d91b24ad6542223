//! Reqwest-backed Telegram reply sink.
//!
//! This adapter owns transport details only: building the `sendMessage`
//! request, timeout handling and mapping Bot API failures onto
//! [`ReplySinkError`]. The bot token is part of the request path and never
//! appears in errors or logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{ApiResponseDto, SendMessageDto};
use crate::domain::Reply;
use crate::domain::ports::{ReplySink, ReplySinkError};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Errors raised while building the sink.
#[derive(Debug, thiserror::Error)]
pub enum TelegramSinkBuildError {
    /// Base URL or token produced an unusable endpoint.
    #[error("invalid Bot API endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`ReplySink`] posting to the Bot API `sendMessage` method.
pub struct TelegramReplySink {
    client: Client,
    send_message: Zeroizing<String>,
}

impl TelegramReplySink {
    /// Build a sink for `token` against `api_url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint does not parse or the client
    /// cannot be constructed.
    pub fn new(
        api_url: &Url,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, TelegramSinkBuildError> {
        let base = api_url.as_str().trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/bot{token}/sendMessage"))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            send_message: Zeroizing::new(endpoint.into()),
        })
    }
}

#[async_trait]
impl ReplySink for TelegramReplySink {
    async fn send(&self, reply: &Reply) -> Result<(), ReplySinkError> {
        let response = self
            .client
            .post(self.send_message.as_str())
            .json(&SendMessageDto::from(reply))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let decoded: ApiResponseDto = serde_json::from_slice(&body).map_err(|error| {
            ReplySinkError::transport(format!("invalid Bot API response: {error}"))
        })?;
        if decoded.ok {
            Ok(())
        } else {
            Err(map_status_error(StatusCode::BAD_REQUEST, body.as_ref()))
        }
    }
}

fn map_transport_error(error: reqwest::Error) -> ReplySinkError {
    ReplySinkError::transport(error.without_url().to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ReplySinkError {
    let decoded = serde_json::from_slice::<ApiResponseDto>(body).ok();
    let detail = decoded
        .as_ref()
        .and_then(|response| response.description.clone())
        .unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {detail}", status.as_u16())
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => ReplySinkError::rate_limited(
            decoded
                .as_ref()
                .and_then(ApiResponseDto::retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        ),
        _ if status.is_client_error() => ReplySinkError::rejected(message),
        _ => ReplySinkError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network Bot API mapping helpers.

    use super::*;
    use crate::domain::{ChatId, Formatting};
    use rstest::rstest;
    use serde_json::json;

    fn reply(formatting: Formatting, reply_to: Option<i64>) -> Reply {
        Reply {
            chat_id: ChatId::new(-1001),
            reply_to,
            text: "*o*wl".to_owned(),
            formatting,
        }
    }

    #[test]
    fn rich_text_reply_quotes_the_trigger() {
        let value = serde_json::to_value(SendMessageDto::from(&reply(
            Formatting::RichText,
            Some(42),
        )))
        .expect("serialise");

        assert_eq!(
            value,
            json!({
                "chat_id": -1001,
                "text": "*o*wl",
                "parse_mode": "MarkdownV2",
                "reply_parameters": { "message_id": 42, "allow_sending_without_reply": true }
            })
        );
    }

    #[test]
    fn plain_reply_omits_optional_fields() {
        let value = serde_json::to_value(SendMessageDto::from(&reply(Formatting::Plain, None)))
            .expect("serialise");

        assert_eq!(value, json!({ "chat_id": -1001, "text": "*o*wl" }));
    }

    #[test]
    fn endpoint_embeds_token_in_path() {
        let base = Url::parse(DEFAULT_API_URL).expect("valid url");
        let sink = TelegramReplySink::new(&base, "123:abc", Duration::from_secs(5))
            .expect("sink builds");

        assert_eq!(
            sink.send_message.as_str(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn rate_limit_uses_retry_after_hint() {
        let body = br#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 7","parameters":{"retry_after":7}}"#;
        let error = map_status_error(StatusCode::TOO_MANY_REQUESTS, body);

        assert_eq!(error, ReplySinkError::rate_limited(7_u64));
    }

    #[rstest]
    #[case::bad_markup(StatusCode::BAD_REQUEST, false)]
    #[case::forbidden(StatusCode::FORBIDDEN, false)]
    #[case::server_error(StatusCode::BAD_GATEWAY, true)]
    fn maps_statuses_by_class(#[case] status: StatusCode, #[case] transient: bool) {
        let error = map_status_error(
            status,
            br#"{"ok":false,"description":"Bad Request: can't parse entities"}"#,
        );

        assert_eq!(error.is_transient(), transient);
        if !transient {
            assert!(error.to_string().contains("can't parse entities"));
        }
    }

    #[test]
    fn non_json_bodies_fall_back_to_a_preview() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"<html>\n  upstream down\n</html>");
        assert_eq!(
            error,
            ReplySinkError::transport("status 502: <html> upstream down </html>")
        );
    }
}
