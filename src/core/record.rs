/// Collection records, page results and form payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single item of a managed collection.
///
/// Records are opaque field maps; the only guaranteed field is `id`, which is
/// always assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for Record {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get("id") {
            None | Some(Value::Null) => Err("record is missing an `id` field".to_string()),
            Some(_) => Ok(Self { fields }),
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

impl Record {
    pub fn id(&self) -> &Value {
        // Presence is checked on construction
        &self.fields["id"]
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Display text for one field, empty when the field is absent
    pub fn display(&self, key: &str) -> String {
        self.fields.get(key).map(display_value).unwrap_or_default()
    }
}

/// Render a scalar JSON value the way a table cell shows it
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        other => other.to_string(),
    }
}

/// Pagination metadata of one list response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub total_pages: Option<u32>,
    pub total_count: Option<u64>,
    /// Set when the server reported no totals; a full page implies more data
    pub page_full: bool,
}

impl PageMeta {
    /// Total pages, derived from the total count when only that is known
    pub fn pages(&self) -> Option<u32> {
        self.total_pages.or_else(|| {
            self.total_count.map(|count| {
                let size = u64::from(self.page_size.max(1));
                (count.div_ceil(size)).max(1) as u32
            })
        })
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        match self.pages() {
            Some(pages) => self.page < pages,
            None => self.page_full,
        }
    }
}

/// Records plus metadata returned by one list request
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub records: Vec<Record>,
    pub meta: PageMeta,
}

/// Typed value of one form input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Validated user input for one create request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormPayload {
    values: BTreeMap<String, FieldValue>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flattened string pairs for form-encoded bodies
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(page: u32, total_count: Option<u64>, total_pages: Option<u32>, page_full: bool) -> PageMeta {
        PageMeta { page, page_size: 10, total_pages, total_count, page_full }
    }

    #[test]
    fn test_record_requires_id() {
        let ok: Record = serde_json::from_value(json!({"id": 3, "code": "x64"})).unwrap();
        assert_eq!(ok.id(), &json!(3));
        assert_eq!(ok.display("code"), "x64");
        assert_eq!(ok.display("missing"), "");

        assert!(serde_json::from_value::<Record>(json!({"code": "x64"})).is_err());
        assert!(serde_json::from_value::<Record>(json!({"id": null})).is_err());
    }

    #[test]
    fn test_pages_derived_from_count() {
        assert_eq!(meta(1, Some(25), None, false).pages(), Some(3));
        assert_eq!(meta(1, Some(0), None, false).pages(), Some(1));
        assert_eq!(meta(1, Some(20), Some(7), false).pages(), Some(7));
        assert_eq!(meta(1, None, None, true).pages(), None);
    }

    #[test]
    fn test_navigation_bounds() {
        let first = meta(1, Some(25), None, false);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = meta(3, Some(25), None, false);
        assert!(last.has_prev());
        assert!(!last.has_next());

        // Without totals the page fill decides
        assert!(meta(2, None, None, true).has_next());
        assert!(!meta(2, None, None, false).has_next());
    }

    #[test]
    fn test_payload_serializes_typed_values() {
        let mut payload = FormPayload::new();
        payload.insert("code", FieldValue::Text("armv7".into()));
        payload.insert("build", FieldValue::Integer(42));
        payload.insert("active", FieldValue::Boolean(true));

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"code": "armv7", "build": 42, "active": true})
        );
        assert_eq!(payload.to_form_pairs()[1], ("build".to_string(), "42".to_string()));
    }
}
