//! `api` crate: HTTP REST API layer.
//!
//! Exposes:
//!   GET    /news?asset=&source=
//!   DELETE /news/all
//!   PUT    /news/{id}
//!   DELETE /news/{id}
//!   POST   /news/{id}/publish
//!   GET    /schedules
//!   POST   /schedules
//!   DELETE /schedules/{id}
//!   PUT    /schedules/{id}/toggle
//!   POST   /schedules/{id}/run
//!   POST   /get-asset-value

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use db::DbPool;
use engine::{Ingestor, Scheduler};

pub use error::ApiError;
use handlers::{assets, news, schedules};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub ingestor: Ingestor,
    pub scheduler: Arc<Scheduler>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/news", get(news::list))
        .route("/news/all", delete(news::delete_all))
        .route("/news/{id}", put(news::update).delete(news::delete))
        .route("/news/{id}/publish", post(news::publish))
        .route("/schedules", get(schedules::list).post(schedules::create))
        .route("/schedules/{id}", delete(schedules::delete))
        .route("/schedules/{id}/toggle", put(schedules::toggle))
        .route("/schedules/{id}/run", post(schedules::run))
        .route("/get-asset-value", post(assets::get_asset_value))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
