use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;
use crate::ApiError;
use db::NewsSource;
use engine::EngineError;
use webhook::{AssetRequest, WebhookResponse};

/// Forward the request to the webhook, store what it produced, and hand
/// the webhook's answer back.
///
/// A transport failure is still a 200 carrying `{"error": ...}`; a non-JSON
/// answer comes back as `{"output": ...}`.
pub async fn get_asset_value(
    State(state): State<AppState>,
    Json(req): Json<AssetRequest>,
) -> Result<Json<Value>, ApiError> {
    match state.ingestor.run(&req, NewsSource::Manual).await {
        Ok(report) => match report.response {
            WebhookResponse::Structured(payload) => Ok(Json(payload)),
            WebhookResponse::Text(output) => Ok(Json(json!({ "output": output }))),
        },
        Err(EngineError::Webhook(e)) => {
            warn!(asset = %req.asset, error = %e, "webhook call failed");
            Ok(Json(json!({ "error": e.to_string() })))
        }
        Err(e) => Err(e.into()),
    }
}
