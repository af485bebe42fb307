//! HTTP error mapping.
//!
//! Every error answers `{"detail": "<message>"}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use db::DbError;
use engine::EngineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    /// The webhook failed or answered with something unusable.
    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a db error, naming the missing entity on `NotFound`.
    pub fn not_found_as(what: &'static str) -> impl FnOnce(DbError) -> ApiError {
        move |err| match err {
            DbError::NotFound => ApiError::NotFound(what),
            other => ApiError::from(other),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("Not found"),
            DbError::Sqlx(e) => {
                error!("database error: {e}");
                ApiError::Internal("database error".into())
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidSchedule(msg) => ApiError::BadRequest(msg),
            EngineError::Webhook(e) => ApiError::BadGateway(e.to_string()),
            EngineError::Database(e) => ApiError::from(e),
        }
    }
}
