use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::ApiError;
use db::repository::schedules as schedule_repo;
use db::{NewsSource, ScheduleRow};
use engine::{EngineError, ScheduleMode, ScheduleSpec, CALENDAR_ASSET};
use webhook::WebhookResponse;

const SCHEDULE_NOT_FOUND: &str = "Schedule not found";

/// Body of `POST /schedules`.
///
/// `mode` defaults to `asset`. Calendar schedules may leave `asset` empty and
/// must name at least one impact level; asset schedules ignore `impacts`.
#[derive(Debug, Deserialize)]
pub struct CreateScheduleDto {
    #[serde(default)]
    pub asset: String,
    pub language: String,
    pub days: Vec<String>,
    pub times: Vec<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub impacts: Vec<String>,
}

fn schedule_error(err: EngineError) -> ApiError {
    match err {
        EngineError::Database(e) => ApiError::not_found_as(SCHEDULE_NOT_FOUND)(e),
        other => other.into(),
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ScheduleRow>>, ApiError> {
    let rows = schedule_repo::list_schedules(&state.pool).await?;
    Ok(Json(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateScheduleDto>,
) -> Result<(StatusCode, Json<ScheduleRow>), ApiError> {
    let mode = match payload.mode.as_deref() {
        Some(raw) => raw.parse::<ScheduleMode>()?,
        None => ScheduleMode::default(),
    };
    let asset = match mode {
        ScheduleMode::Calendar if payload.asset.trim().is_empty() => CALENDAR_ASSET,
        _ => payload.asset.as_str(),
    };
    let spec = ScheduleSpec::parse(asset, &payload.language, &payload.days, &payload.times)?
        .with_mode(mode, &payload.impacts)?;

    let row = state.scheduler.create(&spec).await?;
    info!(schedule_id = row.id, asset = %row.asset, mode = %row.mode, "schedule created");

    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state.scheduler.remove(id).await.map_err(schedule_error)?;
    Ok(Json(json!({ "message": "Schedule deleted" })))
}

pub async fn toggle(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let row = state.scheduler.toggle(id).await.map_err(schedule_error)?;
    Ok(Json(json!({ "id": row.id, "is_active": row.is_active })))
}

/// Run a schedule's ingest right now, outside the trigger registry.
pub async fn run(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let row = schedule_repo::get_schedule(&state.pool, id)
        .await
        .map_err(ApiError::not_found_as(SCHEDULE_NOT_FOUND))?;

    let request = ScheduleSpec::from_row(&row)?.request();
    let report = state.ingestor.run(&request, NewsSource::Scheduled).await?;

    match report.response {
        WebhookResponse::Structured(_) => Ok(Json(json!({
            "status": "success",
            "stored": report.stored.len(),
        }))),
        WebhookResponse::Text(_) => Err(ApiError::BadGateway(
            "webhook answered with a non-JSON body".into(),
        )),
    }
}
