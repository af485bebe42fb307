//! Route handlers, one module per resource.

pub mod assets;
pub mod news;
pub mod schedules;

pub(crate) use crate::AppState;
