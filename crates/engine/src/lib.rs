//! `engine` crate: ingestion parsing, the ingest pipeline, schedule tokens
//! and the trigger scheduler.

pub mod models;
pub mod error;
pub mod envelope;
pub mod schedule;
pub mod ingest;
pub mod scheduler;

pub use models::NewsDraft;
pub use error::EngineError;
pub use envelope::parse_payload;
pub use schedule::{DayToken, Impact, ScheduleMode, ScheduleSpec, TimeToken, CALENDAR_ASSET};
pub use ingest::{IngestReport, Ingestor};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock};
