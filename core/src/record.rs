//! Publication records and the searchable-field extraction applied before normalization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed set of indexed fields. Declaration order is the order fields are
/// merged into the index, which decides the posting field tag on overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Title,
    Authors,
    Year,
    Abstract,
    Keywords,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Title, Field::Authors, Field::Year, Field::Abstract, Field::Keywords];

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Authors => "authors",
            Field::Year => "year",
            Field::Abstract => "abstract",
            Field::Keywords => "keywords",
        }
    }
}

/// A single record value. Arrays of strings keep their order; anything the
/// indexer cannot read as text is kept verbatim as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    /// Number in its JSON textual form, e.g. `2023`.
    Number(String),
    Text(String),
    List(Vec<String>),
    Json(String),
}

impl FieldValue {
    /// Flat text used for indexing. Sequences are joined with a space.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::List(items) => Some(items.join(" ")),
            FieldValue::Number(n) => Some(n.clone()),
            FieldValue::Null | FieldValue::Bool(_) | FieldValue::Json(_) => None,
        }
    }

    pub fn from_json(value: serde_json::Value) -> FieldValue {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n.to_string()),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) if items.iter().all(Value::is_string) => FieldValue::List(
                items.into_iter().filter_map(|v| v.as_str().map(str::to_owned)).collect(),
            ),
            other => FieldValue::Json(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => n
                .parse::<serde_json::Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(n.clone())),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            FieldValue::Json(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_owned).collect())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// A publication record: field name to value. Stored verbatim; only the
/// fields in [`Field::ALL`] are indexed, the rest (links, crawl time) pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text of a string-valued field, or empty.
    pub fn text(&self, name: &str) -> &str {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Flat text of one indexed field, `None` when missing, non-text or empty.
    pub fn field_text(&self, field: Field) -> Option<String> {
        self.fields
            .get(field.name())
            .and_then(FieldValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// Indexed fields with their flat text, in merge order.
    pub fn searchable_fields(&self) -> Vec<(Field, String)> {
        Field::ALL
            .into_iter()
            .filter_map(|f| self.field_text(f).map(|text| (f, text)))
            .collect()
    }

    /// Author names when `authors` is a list. A scalar author string is not split.
    pub fn authors(&self) -> Vec<&str> {
        match self.fields.get(Field::Authors.name()) {
            Some(FieldValue::List(items)) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The year as text, "N/A" when absent.
    pub fn year_label(&self) -> String {
        self.fields
            .get(Field::Year.name())
            .and_then(FieldValue::as_text)
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// Build a record from a JSON object. Non-object values yield `None`.
    pub fn from_json(value: serde_json::Value) -> Option<Record> {
        match value {
            serde_json::Value::Object(map) => Some(Record {
                fields: map.into_iter().map(|(k, v)| (k, FieldValue::from_json(v))).collect(),
            }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_fields_in_merge_order() {
        let rec = Record::new()
            .with("keywords", vec!["graphs", "networks"])
            .with("title", "Spectral Methods")
            .with("year", "2021")
            .with("authors", vec!["A. Turing", "E. Noether"]);
        let fields = rec.searchable_fields();
        let order: Vec<Field> = fields.iter().map(|(f, _)| *f).collect();
        assert_eq!(order, vec![Field::Title, Field::Authors, Field::Year, Field::Keywords]);
        assert_eq!(fields[1].1, "A. Turing E. Noether");
    }

    #[test]
    fn json_round_trip_keeps_passthrough_fields() {
        let value = json!({
            "title": "Graph Theory",
            "year": 2022,
            "authors": ["Ada Lovelace"],
            "publication_link": "https://example.org/p/1",
            "meta": {"pages": 12},
            "flags": [1, 2]
        });
        let rec = Record::from_json(value.clone()).unwrap();
        assert_eq!(rec.field_text(Field::Year).as_deref(), Some("2022"));
        assert_eq!(rec.get("meta"), Some(&FieldValue::Json("{\"pages\":12}".into())));
        assert_eq!(rec.to_json(), value);
    }

    #[test]
    fn non_text_values_are_not_indexed() {
        let rec = Record::from_json(json!({"title": null, "abstract": true, "keywords": []})).unwrap();
        assert!(rec.searchable_fields().is_empty());
        assert_eq!(rec.year_label(), "N/A");
        assert!(Record::from_json(json!(["not", "an", "object"])).is_none());
    }
}
