//! Webhook envelope parsing.
//!
//! The webhook answers with one envelope or a list of envelopes. Each envelope
//! carries the generated article as JSON *inside a string* under `result`,
//! sometimes prefixed with the `=` expression marker of the automation tool:
//!
//! ```text
//! [{ "result": "={\"title\":\"T\",\"description\":\"D\",\"assets\":[\"BTC\"]}" }]
//! ```
//!
//! Envelopes whose `result` is missing, not a string, or not a JSON object
//! are skipped; the rest of the batch is still parsed.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{NewsDraft, DEFAULT_TITLE};

/// Map one webhook payload to zero or more drafts.
///
/// `default_language` fills in drafts whose envelope names no language.
pub fn parse_payload(payload: &Value, default_language: &str) -> Vec<NewsDraft> {
    let envelopes: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![payload],
        _ => {
            debug!("payload is neither an object nor a list; nothing to ingest");
            return Vec::new();
        }
    };

    envelopes
        .into_iter()
        .enumerate()
        .filter_map(|(index, envelope)| {
            let draft = parse_envelope(envelope, default_language);
            if draft.is_none() {
                debug!(index, "skipping malformed envelope");
            }
            draft
        })
        .collect()
}

fn parse_envelope(envelope: &Value, default_language: &str) -> Option<NewsDraft> {
    let raw = envelope.get("result")?.as_str()?;
    let raw = raw.strip_prefix('=').unwrap_or(raw);

    let article: Map<String, Value> = match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };

    Some(NewsDraft {
        title: string_field(&article, "title").unwrap_or(DEFAULT_TITLE).to_owned(),
        description: string_field(&article, "description").unwrap_or_default().to_owned(),
        assets: article
            .get("assets")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
        language: string_field(&article, "language")
            .unwrap_or(default_language)
            .to_owned(),
    })
}

fn string_field<'a>(article: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    article.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(result: &str) -> Value {
        json!({ "result": result })
    }

    #[test]
    fn expression_marker_is_stripped() {
        let payload = envelope(r#"={"title":"T","description":"D","assets":["BTC"]}"#);
        let drafts = parse_payload(&payload, "en");

        assert_eq!(
            drafts,
            vec![NewsDraft {
                title: "T".into(),
                description: "D".into(),
                assets: json!(["BTC"]),
                language: "en".into(),
            }]
        );
        assert_eq!(drafts[0].assets_json(), r#"["BTC"]"#);
    }

    #[test]
    fn unmarked_result_parses_too() {
        let payload = json!([envelope(r#"{"title":"Plain","language":"de"}"#)]);
        let drafts = parse_payload(&payload, "en");

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Plain");
        assert_eq!(drafts[0].language, "de");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let drafts = parse_payload(&envelope("{}"), "fr");

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "No Title");
        assert_eq!(drafts[0].description, "");
        assert_eq!(drafts[0].assets_json(), "[]");
        assert_eq!(drafts[0].language, "fr");
    }

    #[test]
    fn description_newlines_survive() {
        let inner = json!({ "description": "first paragraph\n\nsecond\nline" }).to_string();
        let drafts = parse_payload(&envelope(&format!("={inner}")), "en");

        assert_eq!(drafts[0].description, "first paragraph\n\nsecond\nline");
    }

    #[test]
    fn bad_entries_are_skipped_and_the_rest_continue() {
        let payload = json!([
            envelope("not json"),
            { "output": "no result field" },
            { "result": 42 },
            envelope("=[1,2,3]"),
            envelope(r#"={"title":"kept"}"#),
            "not even an object",
        ]);
        let drafts = parse_payload(&payload, "en");

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "kept");
    }

    #[test]
    fn one_draft_per_good_entry_in_order() {
        let payload = json!([
            envelope(r#"={"title":"a","assets":["BTC","ETH"]}"#),
            envelope(r#"={"title":"b","assets":"SOL"}"#),
        ]);
        let drafts = parse_payload(&payload, "en");

        let titles: Vec<&str> = drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(drafts[0].assets_json(), r#"["BTC","ETH"]"#);
        assert_eq!(drafts[1].assets_json(), r#""SOL""#);
    }

    #[test]
    fn assets_are_stored_as_sent() {
        let drafts = parse_payload(&envelope(r#"={"assets":[1,"BTC",null]}"#), "en");
        assert_eq!(drafts[0].assets_json(), r#"[1,"BTC",null]"#);
    }

    #[test]
    fn only_one_marker_is_stripped() {
        assert!(parse_payload(&envelope(r#"=={"title":"T"}"#), "en").is_empty());
    }

    #[test]
    fn scalar_payload_yields_nothing() {
        assert!(parse_payload(&json!("hello"), "en").is_empty());
        assert!(parse_payload(&Value::Null, "en").is_empty());
        assert!(parse_payload(&json!([]), "en").is_empty());
    }
}
