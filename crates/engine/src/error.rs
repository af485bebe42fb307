//! Engine-level error types.

use thiserror::Error;

/// Errors produced by schedule validation and the ingest pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A schedule request failed validation.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// The webhook call failed at the transport level.
    #[error("webhook error: {0}")]
    Webhook(#[from] webhook::WebhookError),

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),
}
