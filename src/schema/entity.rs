//! Schema derivation from record type declarations.
//!
//! Record types implement [`Entity`] to declare their fields once; the
//! derivation walks those declarations and applies a fixed inference table:
//!
//! | Declared kind | Mapped kind |
//! |---------------|-------------|
//! | Integer       | `long` |
//! | Float         | `double` |
//! | String        | `text` + `keyword` sub-field (unless overridden) |
//! | Boolean       | `boolean` |
//! | Timestamp     | `date` |
//! | Object        | `object` with recursed properties |
//! | Binary        | rejected — convert or exclude the field |
//!
//! Per-field behavior is adjusted through an explicit [`MappingOverrides`]
//! table keyed by dotted field path, not through annotations on the type,
//! so derivation stays a pure data transformation.
//!
//! Derived schemas are cached per type for the lifetime of the process and
//! are immutable afterwards; there is no hot schema reload.

use super::{FieldKind, FieldSchema};
use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock, RwLock};

/// One declared field of a record type.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    kind: ValueKind,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        FieldDecl {
            name: name.into(),
            kind,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Timestamp)
    }

    /// A sub-object field with its own declarations.
    pub fn object(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self::new(name, ValueKind::Object(fields))
    }
}

/// Source-side value kinds a record field can declare.
#[derive(Debug, Clone)]
pub enum ValueKind {
    Integer,
    Float,
    String,
    Boolean,
    Timestamp,
    Object(Vec<FieldDecl>),
    /// Raw binary values. No mapping rule exists for these; derivation
    /// fails so the caller converts or excludes the field.
    Binary,
}

/// Per-field mapping overrides, keyed by dotted field path.
#[derive(Debug, Clone, Default)]
pub struct MappingOverrides {
    overrides: HashMap<String, FieldOverride>,
}

impl MappingOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the string field at `path` as full text without the secondary
    /// keyword sub-field.
    pub fn plain_text(mut self, path: impl Into<String>) -> Self {
        self.overrides.insert(path.into(), FieldOverride::PlainText);
        self
    }

    /// Map the string field at `path` as a pure keyword (exact matches only).
    pub fn keyword(mut self, path: impl Into<String>) -> Self {
        self.overrides.insert(path.into(), FieldOverride::Keyword);
        self
    }

    fn get(&self, path: &str) -> Option<FieldOverride> {
        self.overrides.get(path).copied()
    }

    fn paths(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }
}

/// How a single string field deviates from the default text mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldOverride {
    PlainText,
    Keyword,
}

/// A record type that can be indexed and searched.
///
/// Implementations declare their fields once; the mapping for the type is
/// derived from those declarations and nothing else. Records are serialized
/// at write time (an owned copy crosses into the request), so a caller
/// mutating its record concurrently cannot tear an in-flight write.
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Field declarations this type's index mapping is derived from.
    fn declared_fields() -> Vec<FieldDecl>;

    /// Mapping overrides, keyed by dotted field path. Defaults to none.
    fn mapping_overrides() -> MappingOverrides {
        MappingOverrides::default()
    }

    /// Stable identifier under which the record is indexed. Writing the same
    /// identifier twice replaces the document.
    fn document_id(&self) -> String;
}

/// Derives the index mapping for a list of field declarations.
///
/// Every override path must name a declared string field; unknown paths fail
/// with [`Error::UnknownField`] and overrides on non-string fields with
/// [`Error::UnsupportedFieldKind`].
pub fn derive_schema(fields: &[FieldDecl], overrides: &MappingOverrides) -> Result<FieldSchema> {
    for path in overrides.paths() {
        if !declares_path(fields, path) {
            return Err(Error::unknown_field(path));
        }
    }

    Ok(FieldSchema::new(derive_properties(fields, overrides, "")?))
}

fn derive_properties(
    fields: &[FieldDecl],
    overrides: &MappingOverrides,
    prefix: &str,
) -> Result<BTreeMap<String, FieldKind>> {
    let mut properties = BTreeMap::new();

    for field in fields {
        let path = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{prefix}.{}", field.name)
        };

        if !matches!(field.kind, ValueKind::String) && overrides.get(&path).is_some() {
            return Err(Error::UnsupportedFieldKind {
                field: path,
                detail: "mapping overrides apply to string fields only".to_string(),
            });
        }

        let kind = match &field.kind {
            ValueKind::Integer => FieldKind::Long,
            ValueKind::Float => FieldKind::Double,
            ValueKind::Boolean => FieldKind::Boolean,
            ValueKind::Timestamp => FieldKind::Date,
            ValueKind::String => match overrides.get(&path) {
                None => FieldKind::text(),
                Some(FieldOverride::PlainText) => FieldKind::plain_text(),
                Some(FieldOverride::Keyword) => FieldKind::Keyword,
            },
            ValueKind::Object(nested) => FieldKind::Object {
                properties: derive_properties(nested, overrides, &path)?,
            },
            ValueKind::Binary => {
                return Err(Error::UnsupportedFieldKind {
                    field: path,
                    detail: "raw binary values have no mapping rule; convert or exclude the field"
                        .to_string(),
                });
            }
        };

        if properties.insert(field.name.clone(), kind).is_some() {
            return Err(Error::config(format!("field '{path}' is declared twice")));
        }
    }

    Ok(properties)
}

fn declares_path(fields: &[FieldDecl], path: &str) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    fields.iter().any(|field| {
        field.name == head
            && match (&field.kind, rest) {
                (_, None) => true,
                (ValueKind::Object(nested), Some(rest)) => declares_path(nested, rest),
                _ => false,
            }
    })
}

static DERIVED_SCHEMAS: LazyLock<RwLock<HashMap<TypeId, Arc<FieldSchema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the mapping for `T`, deriving it on first use.
///
/// The schema for a type is derived exactly once per process and shared
/// afterwards; only a process restart invalidates it.
pub fn schema_of<T: Entity>() -> Result<Arc<FieldSchema>> {
    let type_id = TypeId::of::<T>();

    {
        let cache = DERIVED_SCHEMAS
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(schema) = cache.get(&type_id) {
            return Ok(Arc::clone(schema));
        }
    }

    let schema = Arc::new(derive_schema(
        &T::declared_fields(),
        &T::mapping_overrides(),
    )?);

    let mut cache = DERIVED_SCHEMAS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(Arc::clone(cache.entry(type_id).or_insert(schema)))
}
