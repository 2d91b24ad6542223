//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::domain::ports::ChatCommand;

/// Expected value of the webhook secret-token header.
///
/// Only a SHA-256 digest of the secret is kept. Presented tokens are hashed
/// and compared digest to digest, so the comparison always walks 32 bytes
/// regardless of the presented token's length.
///
/// # Examples
/// ```
/// use acrostic::inbound::http::state::WebhookSecret;
///
/// let secret = WebhookSecret::new("s3cret");
/// assert!(secret.matches("s3cret"));
/// assert!(!secret.matches("s3cre"));
/// ```
#[derive(Clone)]
pub struct WebhookSecret {
    digest: Zeroizing<[u8; 32]>,
}

impl WebhookSecret {
    /// Hash `secret` for later comparison.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Zeroizing::new(Self::hash(secret)),
        }
    }

    /// Whether `presented` equals the configured secret.
    pub fn matches(&self, presented: &str) -> bool {
        let presented = Zeroizing::new(Self::hash(presented));
        bool::from(self.digest.as_slice().ct_eq(presented.as_slice()))
    }

    fn hash(value: &str) -> [u8; 32] {
        Sha256::digest(value.as_bytes()).into()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Use-case handling text messages and leaderboard commands.
    pub chat: Arc<dyn ChatCommand>,
    /// Expected secret header; `None` accepts every request.
    pub secret: Option<WebhookSecret>,
}

impl HttpState {
    /// Construct state around the chat use-case.
    pub fn new(chat: Arc<dyn ChatCommand>) -> Self {
        Self { chat, secret: None }
    }

    /// Require requests to present `secret`.
    #[must_use]
    pub fn with_secret(mut self, secret: Option<WebhookSecret>) -> Self {
        self.secret = secret;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s3cret", true)]
    #[case("S3CRET", false)]
    #[case("", false)]
    #[case("s3cret-and-more", false)]
    fn secret_matching(#[case] presented: &str, #[case] expected: bool) {
        assert_eq!(WebhookSecret::new("s3cret").matches(presented), expected);
    }

    #[rstest]
    fn debug_output_is_redacted() {
        let rendered = format!("{:?}", WebhookSecret::new("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
