//! Tolerant field decoders for source payloads
//!
//! Sources are loosely typed in practice (page counts as strings, identifier
//! entries without a value, descriptions as objects). Each decoder reads the
//! raw JSON value and yields "absent" for anything it cannot use, so one bad
//! field never fails the whole document. Use with
//! `#[serde(default, deserialize_with = "...")]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String, or a number rendered as text
pub(crate) fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Plain string or `{"type": ..., "value": "..."}` text object
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

/// Non-negative count given as a number or a numeric string
pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// List of strings; non-string elements are skipped, a lone string is a
/// one-element list
pub(crate) fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    })
}

/// List of objects; elements that do not decode as `T` are skipped
pub(crate) fn elements<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "text")]
        blurb: Option<String>,
        #[serde(default, deserialize_with = "count")]
        pages: Option<u32>,
        #[serde(default, deserialize_with = "strings")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "elements")]
        refs: Vec<Ref>,
    }

    #[derive(Debug, Deserialize)]
    struct Ref {
        key: String,
    }

    #[test]
    fn test_well_typed_values_pass_through() {
        let sample: Sample = serde_json::from_str(
            r#"{
                "name": "Sapiens",
                "blurb": {"type": "/type/text", "value": "A brief history"},
                "pages": 443,
                "tags": ["History"],
                "refs": [{"key": "/authors/OL1A"}]
            }"#,
        )
        .unwrap();

        assert_eq!(sample.name.as_deref(), Some("Sapiens"));
        assert_eq!(sample.blurb.as_deref(), Some("A brief history"));
        assert_eq!(sample.pages, Some(443));
        assert_eq!(sample.tags, vec!["History"]);
        assert_eq!(sample.refs.len(), 1);
        assert_eq!(sample.refs[0].key, "/authors/OL1A");
    }

    #[test]
    fn test_wrong_types_become_absent() {
        let sample: Sample = serde_json::from_str(
            r#"{
                "name": ["not", "a", "string"],
                "blurb": 42,
                "pages": -3,
                "tags": {"History": true},
                "refs": "nope"
            }"#,
        )
        .unwrap();

        assert!(sample.name.is_none());
        assert!(sample.blurb.is_none());
        assert!(sample.pages.is_none());
        assert!(sample.tags.is_empty());
        assert!(sample.refs.is_empty());
    }

    #[test]
    fn test_coercions_and_partial_lists() {
        let sample: Sample = serde_json::from_str(
            r#"{
                "name": 2015,
                "blurb": "plain",
                "pages": " 443 ",
                "tags": ["History", 7, null, "Civilization"],
                "refs": [{"key": "/authors/OL1A"}, {"type": "OTHER"}, {"key": "/authors/OL2A"}]
            }"#,
        )
        .unwrap();

        assert_eq!(sample.name.as_deref(), Some("2015"));
        assert_eq!(sample.blurb.as_deref(), Some("plain"));
        assert_eq!(sample.pages, Some(443));
        assert_eq!(sample.tags, vec!["History", "Civilization"]);
        assert_eq!(sample.refs.len(), 2);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let sample: Sample = serde_json::from_str(r#"{"name": null}"#).unwrap();

        assert!(sample.name.is_none());
        assert!(sample.pages.is_none());
        assert!(sample.tags.is_empty());
    }
}
