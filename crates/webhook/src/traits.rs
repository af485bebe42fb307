//! The `WebhookClient` trait: the contract every webhook transport must fulfil.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::WebhookError;

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub asset: String,
    pub language: String,
    /// Impact levels of an economic-calendar run; absent for plain asset runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impacts: Option<Vec<String>>,
}

impl AssetRequest {
    pub fn new(asset: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            language: language.into(),
            impacts: None,
        }
    }

    pub fn with_impacts(mut self, impacts: Vec<String>) -> Self {
        self.impacts = Some(impacts);
        self
    }
}

/// What the webhook answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookResponse {
    /// The body was valid JSON.
    Structured(Value),
    /// The body was not JSON; kept verbatim and never ingested.
    Text(String),
}

impl WebhookResponse {
    /// Classify a raw response body.
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Text(body),
        }
    }
}

/// The outbound call to the workflow-automation webhook.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// Post `request` to the webhook and return its answer.
    async fn invoke(&self, request: &AssetRequest) -> Result<WebhookResponse, WebhookError>;
}
