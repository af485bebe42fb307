use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::ApiError;
use db::models::{NewsFilter, NewsPatch};
use db::repository::news as news_repo;
use db::NewsRow;

const NEWS_NOT_FOUND: &str = "News not found";

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub asset: Option<String>,
    pub source: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<NewsRow>>, ApiError> {
    let filter = NewsFilter {
        asset: non_empty(query.asset),
        source: non_empty(query.source),
    };
    let rows = news_repo::list_news(&state.pool, &filter).await?;
    Ok(Json(rows))
}

pub async fn delete_all(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let deleted = news_repo::delete_all_news(&state.pool).await?;
    info!(deleted, "all news deleted");
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn delete(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    news_repo::delete_news(&state.pool, id)
        .await
        .map_err(ApiError::not_found_as(NEWS_NOT_FOUND))?;
    Ok(Json(json!({ "message": "News deleted" })))
}

pub async fn update(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(patch): Json<NewsPatch>,
) -> Result<Json<NewsRow>, ApiError> {
    let row = news_repo::update_news(&state.pool, id, &patch)
        .await
        .map_err(ApiError::not_found_as(NEWS_NOT_FOUND))?;
    Ok(Json(row))
}

pub async fn publish(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<NewsRow>, ApiError> {
    let row = news_repo::publish_news(&state.pool, id)
        .await
        .map_err(ApiError::not_found_as(NEWS_NOT_FOUND))?;
    Ok(Json(row))
}
