//! Webhook-level error type.

use thiserror::Error;

/// Errors returned by [`crate::WebhookClient::invoke`].
///
/// Only transport-level failures are errors; any body the webhook sends back
/// is a successful [`crate::WebhookResponse`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// Connection failure, timeout, or a body that could not be read.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for WebhookError {
    fn from(err: reqwest::Error) -> Self {
        WebhookError::Transport(err.to_string())
    }
}
