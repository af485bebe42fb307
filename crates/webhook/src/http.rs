//! reqwest-backed [`WebhookClient`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{AssetRequest, WebhookClient, WebhookError, WebhookResponse};

/// Upper bound on a single webhook call, connect through body.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts to a fixed webhook URL.
///
/// The webhook's HTTP status is not inspected: automation webhooks commonly
/// answer 200 even when the workflow failed, and whatever body comes back is
/// handed to the caller.
#[derive(Debug, Clone)]
pub struct HttpWebhookClient {
    client: reqwest::Client,
    url: String,
}

impl HttpWebhookClient {
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        Self::with_timeout(url, WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn invoke(&self, request: &AssetRequest) -> Result<WebhookResponse, WebhookError> {
        let resp = self.client.post(&self.url).json(request).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(%status, bytes = text.len(), "webhook answered");

        Ok(WebhookResponse::from_body(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    #[tokio::test]
    async fn json_body_is_structured_and_request_is_forwarded() {
        let app = Router::new().route(
            "/hook",
            post(|Json(req): Json<AssetRequest>| async move {
                Json(json!([{ "result": format!("{}-{}", req.asset, req.language) }]))
            }),
        );
        let url = spawn_server(app).await;
        let client = HttpWebhookClient::new(url).unwrap();

        let resp = client.invoke(&AssetRequest::new("BTC", "en")).await.unwrap();
        assert_eq!(resp, WebhookResponse::Structured(json!([{ "result": "BTC-en" }])));
    }

    #[tokio::test]
    async fn impacts_are_posted_only_when_set() {
        let app = Router::new().route(
            "/hook",
            post(|Json(body): Json<Value>| async move { Json(body) }),
        );
        let url = spawn_server(app).await;
        let client = HttpWebhookClient::new(url).unwrap();

        let plain = client.invoke(&AssetRequest::new("BTC", "en")).await.unwrap();
        assert_eq!(plain, WebhookResponse::Structured(json!({ "asset": "BTC", "language": "en" })));

        let calendar = AssetRequest::new("ECONOMIC_CALENDAR", "en")
            .with_impacts(vec!["high".into(), "medium".into()]);
        let echoed = client.invoke(&calendar).await.unwrap();
        assert_eq!(
            echoed,
            WebhookResponse::Structured(json!({
                "asset": "ECONOMIC_CALENDAR",
                "language": "en",
                "impacts": ["high", "medium"],
            }))
        );
    }

    #[tokio::test]
    async fn non_json_body_is_text() {
        let app = Router::new().route("/hook", post(|| async { "Workflow was started" }));
        let url = spawn_server(app).await;
        let client = HttpWebhookClient::new(url).unwrap();

        let resp = client.invoke(&AssetRequest::new("ETH", "de")).await.unwrap();
        assert_eq!(resp, WebhookResponse::Text("Workflow was started".into()));
    }

    #[tokio::test]
    async fn error_status_body_is_still_returned() {
        let app = Router::new().route(
            "/hook",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "workflow failed" })),
                )
            }),
        );
        let url = spawn_server(app).await;
        let client = HttpWebhookClient::new(url).unwrap();

        let resp = client.invoke(&AssetRequest::new("ETH", "en")).await.unwrap();
        assert_eq!(resp, WebhookResponse::Structured(json!({ "message": "workflow failed" })));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpWebhookClient::new(format!("http://{addr}/hook")).unwrap();
        let err = client.invoke(&AssetRequest::new("BTC", "en")).await.unwrap_err();
        assert!(matches!(err, WebhookError::Transport(_)));
    }

    #[tokio::test]
    async fn slow_webhook_times_out() {
        let app = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(Value::Null)
            }),
        );
        let url = spawn_server(app).await;
        let client = HttpWebhookClient::with_timeout(url, Duration::from_millis(100)).unwrap();

        let err = client.invoke(&AssetRequest::new("BTC", "en")).await.unwrap_err();
        assert!(matches!(err, WebhookError::Transport(_)));
    }

    #[test]
    fn body_classification() {
        assert_eq!(
            WebhookResponse::from_body(r#"{"a":1}"#.into()),
            WebhookResponse::Structured(json!({ "a": 1 }))
        );
        assert_eq!(
            WebhookResponse::from_body("plain".into()),
            WebhookResponse::Text("plain".into())
        );
    }
}
