//! Domain models produced by the ingestion parser.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used when an envelope carries none.
pub const DEFAULT_TITLE: &str = "No Title";

/// A news item extracted from one webhook envelope, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDraft {
    pub title: String,
    /// Newlines are preserved verbatim.
    pub description: String,
    /// The article's `assets` value as sent, normally a list of tickers.
    pub assets: Value,
    pub language: String,
}

impl NewsDraft {
    /// The asset list in its stored form, re-serialized JSON.
    pub fn assets_json(&self) -> String {
        self.assets.to_string()
    }
}
