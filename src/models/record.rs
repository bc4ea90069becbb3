//! Extracted page record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A link collected from a `Links` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Link {
    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "Title")]
    pub title: String,
}

impl Link {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Value stored under a record field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain cell text, or the `href` of a `Download` row
    Text(String),
    /// Every `Links` row, in page order
    Links(Vec<Link>),
    /// Every `Related` or `Program` row, in page order
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Option<&[Link]> {
        match self {
            FieldValue::Links(links) => Some(links),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Field name to value mapping for a single page.
///
/// Keys are kept sorted so the emitted JSON has a stable key order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let mut record = Record::new();
        record.insert("Title", "Bedrock geology");
        record.insert(
            "Links",
            FieldValue::Links(vec![Link::new("https://a.example/x", "X")]),
        );
        record.insert("Related", FieldValue::List(vec!["Map 1 /m1".into()]));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Links":[{"URL":"https://a.example/x","Title":"X"}],"Related":["Map 1 /m1"],"Title":"Bedrock geology"}"#
        );
    }

    #[test]
    fn test_empty_links_serialize_as_array() {
        let mut record = Record::new();
        record.insert("Links", FieldValue::Links(Vec::new()));
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"Links":[]}"#);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut record = Record::new();
        record.insert("Foo", "first");
        record.insert("Foo", "second");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Foo").and_then(FieldValue::as_text), Some("second"));
    }
}
