//! Field schemas and their wire representation.
//!
//! A [`FieldSchema`] is the engine-side mapping for one index: field names to
//! [`FieldKind`]s. Schemas are produced by the derivation path in [`entity`]
//! and consumed by index creation, mapping updates, and query validation.
//!
//! Serializing a [`FieldSchema`] yields the engine's `properties` object
//! verbatim, so schema values can be embedded directly into index-create and
//! mapping-update request bodies.

use serde::Serialize;
use std::collections::BTreeMap;

/// Schema derivation from record type declarations.
pub mod entity;

/// Engine-side field kinds.
///
/// Serializes to the engine's mapping definition for one field, e.g.
/// `{"type": "text", "fields": {"keyword": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Exact-match field for filtering and aggregations.
    Keyword,
    /// Full-text searchable field, optionally with a `keyword` sub-field.
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<TextSubFields>,
    },
    /// 64-bit integer.
    Long,
    /// Double-precision floating point.
    Double,
    /// Date/time field.
    Date,
    /// Boolean field.
    Boolean,
    /// One level of scalar sub-object fields, addressed with dotted paths.
    Object {
        properties: BTreeMap<String, FieldKind>,
    },
}

impl FieldKind {
    /// Full-text field with the default `keyword` sub-field, so the same
    /// value also supports exact matches and aggregations.
    pub fn text() -> Self {
        FieldKind::Text {
            fields: Some(TextSubFields::keyword()),
        }
    }

    /// Full-text field without the secondary keyword sub-field.
    pub fn plain_text() -> Self {
        FieldKind::Text { fields: None }
    }
}

/// The `keyword` multi-field attached to text fields by default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSubFields {
    keyword: KeywordSubField,
}

impl TextSubFields {
    fn keyword() -> Self {
        TextSubFields {
            keyword: KeywordSubField {
                kind: "keyword",
                ignore_above: 256,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct KeywordSubField {
    #[serde(rename = "type")]
    kind: &'static str,
    ignore_above: u32,
}

/// Mapping from field names to kinds for one index.
///
/// Immutable once derived; extending an index happens by deriving a second,
/// small schema for the new fields and passing it to a mapping update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldSchema {
    properties: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    pub(crate) fn new(properties: BTreeMap<String, FieldKind>) -> Self {
        FieldSchema { properties }
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolves a field path against this schema.
    ///
    /// Sub-object fields are addressed with dots, e.g. `home.province`.
    pub fn resolve(&self, path: &str) -> Option<&FieldKind> {
        let mut properties = &self.properties;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let kind = properties.get(segment)?;
            if segments.peek().is_none() {
                return Some(kind);
            }
            match kind {
                FieldKind::Object { properties: nested } => properties = nested,
                _ => return None,
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> FieldSchema {
        let mut home = BTreeMap::new();
        home.insert("province".to_string(), FieldKind::text());
        home.insert("city".to_string(), FieldKind::text());

        let mut properties = BTreeMap::new();
        properties.insert("id".to_string(), FieldKind::Long);
        properties.insert("name".to_string(), FieldKind::text());
        properties.insert("home".to_string(), FieldKind::Object { properties: home });
        FieldSchema::new(properties)
    }

    #[test]
    fn text_serializes_with_keyword_subfield() {
        assert_eq!(
            serde_json::to_value(FieldKind::text()).unwrap(),
            json!({
                "type": "text",
                "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
            })
        );
    }

    #[test]
    fn plain_text_serializes_without_subfields() {
        assert_eq!(
            serde_json::to_value(FieldKind::plain_text()).unwrap(),
            json!({ "type": "text" })
        );
    }

    #[test]
    fn schema_serializes_as_properties_object() {
        let value = serde_json::to_value(sample_schema()).unwrap();
        assert_eq!(value["id"], json!({ "type": "long" }));
        assert_eq!(value["home"]["type"], json!("object"));
        assert_eq!(value["home"]["properties"]["city"]["type"], json!("text"));
    }

    #[test]
    fn resolve_finds_top_level_fields() {
        assert_eq!(sample_schema().resolve("id"), Some(&FieldKind::Long));
    }

    #[test]
    fn resolve_follows_dotted_paths() {
        assert_eq!(
            sample_schema().resolve("home.province"),
            Some(&FieldKind::text())
        );
    }

    #[test]
    fn resolve_rejects_unknown_and_overshot_paths() {
        let schema = sample_schema();
        assert_eq!(schema.resolve("salary"), None);
        assert_eq!(schema.resolve("home.street"), None);
        // A scalar cannot be descended into.
        assert_eq!(schema.resolve("name.keyword.extra"), None);
        assert_eq!(schema.resolve(""), None);
    }
}
