//! Query intents and their compilation to the engine's wire form.
//!
//! Intents are plain values built by the caller and compiled against the
//! schema the target index was derived from. Compilation is pure — no
//! network dependency — so structural mistakes and unknown field paths
//! fail before a request is ever sent.

use crate::error::{Error, Result};
use crate::schema::{FieldKind, FieldSchema};
use serde_json::{Map, Value, json};

/// A structured query intent.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryIntent {
    /// Every document in the index.
    MatchAll,
    /// Documents whose `field` lies between the given bounds. Bounds are
    /// independently optional, but at least one must be set; inclusivity is
    /// always explicit, never inferred.
    Range {
        field: String,
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    /// Tokenized full-text match: a document containing any of the query's
    /// tokens may match, ranked by the engine.
    Match { field: String, text: String },
    /// Exact-phrase match: the query's tokens must appear contiguously and
    /// in order. Strictly narrower than [`QueryIntent::Match`].
    MatchPhrase { field: String, text: String },
}

impl QueryIntent {
    pub fn match_all() -> Self {
        QueryIntent::MatchAll
    }

    pub fn range(field: impl Into<String>, lower: Option<Bound>, upper: Option<Bound>) -> Self {
        QueryIntent::Range {
            field: field.into(),
            lower,
            upper,
        }
    }

    pub fn matching(field: impl Into<String>, text: impl Into<String>) -> Self {
        QueryIntent::Match {
            field: field.into(),
            text: text.into(),
        }
    }

    pub fn phrase(field: impl Into<String>, text: impl Into<String>) -> Self {
        QueryIntent::MatchPhrase {
            field: field.into(),
            text: text.into(),
        }
    }
}

/// One end of a range, with explicit inclusivity.
///
/// Values are wire values: numbers go in as numbers, dates as their RFC 3339
/// rendering (`timestamp.to_rfc3339()`).
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    value: Value,
    inclusive: bool,
}

impl Bound {
    pub fn inclusive(value: impl Into<Value>) -> Self {
        Bound {
            value: value.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(value: impl Into<Value>) -> Self {
        Bound {
            value: value.into(),
            inclusive: false,
        }
    }
}

/// Compiles an intent into the engine's query representation.
///
/// Field paths — dotted for sub-object fields — are validated against
/// `schema`, the schema the index was built from, so mismatches surface
/// here as [`Error::UnknownField`] instead of after a network round trip.
/// Structurally invalid intents fail with [`Error::InvalidQuery`].
pub fn compile(intent: &QueryIntent, schema: &FieldSchema) -> Result<Value> {
    match intent {
        QueryIntent::MatchAll => Ok(json!({ "match_all": {} })),

        QueryIntent::Range {
            field,
            lower,
            upper,
        } => {
            resolve_field(schema, field)?;
            if lower.is_none() && upper.is_none() {
                return Err(Error::invalid_query(format!(
                    "range over '{field}' sets neither bound"
                )));
            }

            let mut bounds = Map::new();
            if let Some(bound) = lower {
                let key = if bound.inclusive { "gte" } else { "gt" };
                bounds.insert(key.to_string(), bound.value.clone());
            }
            if let Some(bound) = upper {
                let key = if bound.inclusive { "lte" } else { "lt" };
                bounds.insert(key.to_string(), bound.value.clone());
            }

            Ok(json!({ "range": { field: Value::Object(bounds) } }))
        }

        QueryIntent::Match { field, text } => {
            resolve_field(schema, field)?;
            require_text(text, "match")?;
            Ok(json!({ "match": { field: { "query": text } } }))
        }

        QueryIntent::MatchPhrase { field, text } => {
            resolve_field(schema, field)?;
            require_text(text, "match_phrase")?;
            Ok(json!({ "match_phrase": { field: { "query": text } } }))
        }
    }
}

fn resolve_field<'a>(schema: &'a FieldSchema, path: &str) -> Result<&'a FieldKind> {
    schema
        .resolve(path)
        .ok_or_else(|| Error::unknown_field(path))
}

fn require_text(text: &str, clause: &str) -> Result<()> {
    if text.trim().is_empty() {
        Err(Error::invalid_query(format!(
            "{clause} requires non-empty query text"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::entity::{FieldDecl, MappingOverrides, derive_schema};
    use chrono::{TimeZone, Utc};

    fn schema() -> FieldSchema {
        derive_schema(
            &[
                FieldDecl::integer("id"),
                FieldDecl::string("name"),
                FieldDecl::timestamp("join_date"),
                FieldDecl::float("salary"),
                FieldDecl::object(
                    "home",
                    vec![FieldDecl::string("province"), FieldDecl::string("city")],
                ),
            ],
            &MappingOverrides::new(),
        )
        .unwrap()
    }

    #[test]
    fn match_all_compiles_to_the_universal_query() {
        assert_eq!(
            compile(&QueryIntent::match_all(), &schema()).unwrap(),
            json!({ "match_all": {} })
        );
    }

    #[test]
    fn range_honors_explicit_inclusivity_flags() {
        let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        let intent = QueryIntent::range(
            "join_date",
            Some(Bound::inclusive(start.to_rfc3339())),
            Some(Bound::exclusive("2019-06-01T00:00:00+00:00")),
        );

        let compiled = compile(&intent, &schema()).unwrap();
        let clause = &compiled["range"]["join_date"];
        assert_eq!(clause["gte"], json!("2018-01-01T00:00:00+00:00"));
        assert_eq!(clause["lt"], json!("2019-06-01T00:00:00+00:00"));
        assert!(clause.get("gt").is_none());
        assert!(clause.get("lte").is_none());
    }

    #[test]
    fn range_bounds_are_independently_optional() {
        let intent = QueryIntent::range("salary", Some(Bound::exclusive(10_000)), None);
        let compiled = compile(&intent, &schema()).unwrap();
        assert_eq!(compiled["range"]["salary"], json!({ "gt": 10_000 }));
    }

    #[test]
    fn range_with_neither_bound_is_invalid() {
        assert!(matches!(
            compile(&QueryIntent::range("salary", None, None), &schema()),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn match_and_phrase_compile_to_distinct_clauses() {
        let s = schema();
        let tokenized = compile(&QueryIntent::matching("name", "jim shao"), &s).unwrap();
        let exact = compile(&QueryIntent::phrase("name", "jim shao"), &s).unwrap();

        assert_eq!(tokenized, json!({ "match": { "name": { "query": "jim shao" } } }));
        assert_eq!(
            exact,
            json!({ "match_phrase": { "name": { "query": "jim shao" } } })
        );
    }

    #[test]
    fn empty_query_text_is_invalid() {
        assert!(matches!(
            compile(&QueryIntent::matching("name", "  "), &schema()),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            compile(&QueryIntent::phrase("name", ""), &schema()),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn sub_object_fields_are_addressed_with_dotted_paths() {
        let compiled = compile(&QueryIntent::phrase("home.province", "江西省"), &schema()).unwrap();
        assert_eq!(
            compiled,
            json!({ "match_phrase": { "home.province": { "query": "江西省" } } })
        );
    }

    #[test]
    fn unknown_fields_fail_before_any_request_is_built() {
        for intent in [
            QueryIntent::matching("nickname", "jim"),
            QueryIntent::phrase("home.street", "elm"),
            QueryIntent::range("hired_on", Some(Bound::inclusive(1)), None),
        ] {
            match compile(&intent, &schema()) {
                Err(Error::UnknownField(_)) => {}
                other => panic!("expected UnknownField, got {other:?}"),
            }
        }
    }
}
