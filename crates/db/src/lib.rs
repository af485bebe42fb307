//! `db` crate: pure persistence layer.
//!
//! Provides a SQLite connection pool, schema bootstrap, typed row structs and
//! repository functions for the `news` and `schedules` tables.  No business
//! logic lives here.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;

pub use pool::DbPool;
pub use error::DbError;
pub use models::{NewsRow, NewsSource, ScheduleRow};
