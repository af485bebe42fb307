//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models; they carry no domain behaviour.
//! List-valued columns (`assets`, `days`, `times`, `impacts`) are stored and
//! served as JSON-encoded text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// news
// ---------------------------------------------------------------------------

/// Where a news row came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NewsSource {
    /// Produced by an operator-initiated `/get-asset-value` call.
    #[default]
    Manual,
    /// Produced by a schedule, either fired by the scheduler or run by hand.
    Scheduled,
}

impl NewsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        }
    }
}

impl std::fmt::Display for NewsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted news item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NewsRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// JSON array of asset tickers, e.g. `["BTC","ETH"]`.
    pub assets: String,
    pub language: String,
    pub published: bool,
    pub source: NewsSource,
    pub created_at: DateTime<Utc>,
}

/// Column values for a news row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewNews<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub assets: &'a str,
    pub language: &'a str,
    pub source: NewsSource,
}

/// Partial update of a news row; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
}

/// Optional filters for listing news.
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    /// Case-insensitive substring of the serialized `assets` column.
    pub asset: Option<String>,
    /// Exact `source` value.
    pub source: Option<String>,
}

// ---------------------------------------------------------------------------
// schedules
// ---------------------------------------------------------------------------

/// A persisted schedule.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleRow {
    pub id: i64,
    pub asset: String,
    pub language: String,
    /// JSON array of weekday tokens, e.g. `["Mon","Wed"]`.
    pub days: String,
    /// JSON array of `HH:MM` tokens and/or `"now"`.
    pub times: String,
    /// `asset` or `calendar`.
    pub mode: String,
    /// JSON array of impact levels; `[]` outside calendar mode.
    pub impacts: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduleRow {
    /// Decoded `days` column. A corrupt column decodes as empty.
    pub fn day_list(&self) -> Vec<String> {
        serde_json::from_str(&self.days).unwrap_or_default()
    }

    /// Decoded `times` column. A corrupt column decodes as empty.
    pub fn time_list(&self) -> Vec<String> {
        serde_json::from_str(&self.times).unwrap_or_default()
    }

    /// Decoded `impacts` column. A corrupt column decodes as empty.
    pub fn impact_list(&self) -> Vec<String> {
        serde_json::from_str(&self.impacts).unwrap_or_default()
    }
}

/// Column values for a schedule row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewSchedule<'a> {
    pub asset: &'a str,
    pub language: &'a str,
    pub days: &'a str,
    pub times: &'a str,
    pub mode: &'a str,
    pub impacts: &'a str,
}
