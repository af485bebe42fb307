//! `MockWebhook`: a test double for `WebhookClient`.
//!
//! Useful in unit and integration tests where the real webhook is either
//! unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::{AssetRequest, WebhookClient, WebhookError, WebhookResponse};

/// Behaviour injected into `MockWebhook` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Answer with a JSON body.
    Structured(Value),
    /// Answer with a non-JSON body.
    Text(String),
    /// Fail at the transport level.
    Transport(String),
}

/// A mock webhook that records every call it receives and answers with a
/// programmer-specified response.
#[derive(Debug, Clone)]
pub struct MockWebhook {
    behaviour: Arc<Mutex<MockBehaviour>>,
    calls: Arc<Mutex<Vec<AssetRequest>>>,
}

impl MockWebhook {
    fn with(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour: Arc::new(Mutex::new(behaviour)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always answers with the given JSON.
    pub fn structured(value: Value) -> Self {
        Self::with(MockBehaviour::Structured(value))
    }

    /// Create a mock that always answers with the given plain text.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with(MockBehaviour::Text(body.into()))
    }

    /// Create a mock that always fails with a transport error.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self::with(MockBehaviour::Transport(msg.into()))
    }

    /// Change what subsequent calls answer with.
    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        *self.behaviour.lock().unwrap_or_else(|e| e.into_inner()) = behaviour;
    }

    /// All requests seen so far, in call order.
    pub fn calls(&self) -> Vec<AssetRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of times the webhook has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl WebhookClient for MockWebhook {
    async fn invoke(&self, request: &AssetRequest) -> Result<WebhookResponse, WebhookError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let behaviour = self.behaviour.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match behaviour {
            MockBehaviour::Structured(v) => Ok(WebhookResponse::Structured(v)),
            MockBehaviour::Text(t) => Ok(WebhookResponse::Text(t)),
            MockBehaviour::Transport(msg) => Err(WebhookError::Transport(msg)),
        }
    }
}
