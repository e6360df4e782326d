//! Index lifecycle operations: creation, mapping growth, settings changes.
//!
//! Indices are created under the strict dynamic-mapping policy, so writes
//! that introduce undeclared fields are rejected by the engine instead of
//! silently widening the mapping. Existing fields are never removed or
//! retyped here — the engine forbids destructive in-place mapping changes,
//! and a rejected update is reported with the engine's diagnostic rather
//! than worked around.
//!
//! From this crate's point of view an index only ever moves forward:
//! absent, then created, then active with an additively growing mapping.
//! Deletion is not exposed.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::schema::FieldSchema;
use opensearch::http::response::Response;
use opensearch::indices::{
    IndicesCreateParts, IndicesExistsParts, IndicesPutMappingParts, IndicesPutSettingsParts,
};
use serde::{Deserialize, Serialize};

/// Index-level settings applied at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSettings {
    /// Number of primary shards.
    pub number_of_shards: u32,
    /// Number of replica shards.
    pub number_of_replicas: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        IndexSettings {
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

/// Settings changes that do not require a reindex.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_replicas: Option<u32>,
    /// Engine-side delay between a write being acknowledged and becoming
    /// visible to search, e.g. `"1s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
}

impl IndexSettingsUpdate {
    pub fn replicas(count: u32) -> Self {
        IndexSettingsUpdate {
            number_of_replicas: Some(count),
            ..Self::default()
        }
    }
}

/// Dynamic-mapping policy for an index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamicMapping {
    /// Reject writes that introduce undeclared fields.
    Strict,
    /// Let the engine absorb undeclared fields into the mapping.
    Dynamic,
    /// Store undeclared fields without indexing them.
    False,
}

impl Serialize for DynamicMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            DynamicMapping::Strict => "strict",
            DynamicMapping::Dynamic => "true",
            DynamicMapping::False => "false",
        })
    }
}

/// Outcome of [`IndexManager::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnsureOutcome {
    Created,
    AlreadyExists,
}

/// Engine verdict on an in-place mapping or settings change.
#[derive(Debug, Clone, PartialEq)]
pub enum Acknowledgement {
    Acknowledged,
    /// The engine refused the change; carries its diagnostic body.
    Rejected(String),
}

#[derive(Serialize)]
struct CreateIndexBody<'a> {
    settings: &'a IndexSettings,
    mappings: MappingBody<'a>,
}

#[derive(Serialize)]
struct MappingBody<'a> {
    dynamic: DynamicMapping,
    properties: &'a FieldSchema,
}

/// Manages the lifecycle of engine indices.
pub struct IndexManager {
    connection: Connection,
}

impl IndexManager {
    pub fn new(connection: &Connection) -> Self {
        IndexManager {
            connection: connection.clone(),
        }
    }

    /// Creates `name` with the given mapping unless it already exists.
    ///
    /// Idempotent: calling twice never errors, the second call reports
    /// [`EnsureOutcome::AlreadyExists`]. The index is created under
    /// [`DynamicMapping::Strict`] with default settings.
    pub async fn ensure_index(&self, name: &str, schema: &FieldSchema) -> Result<EnsureOutcome> {
        let exists = self
            .connection
            .client()
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await?;

        if exists.status_code().is_success() {
            tracing::info!("Index '{}' already exists.", name);
            return Ok(EnsureOutcome::AlreadyExists);
        }

        tracing::info!("Index '{}' does not exist. Creating...", name);
        let body = CreateIndexBody {
            settings: &IndexSettings::default(),
            mappings: MappingBody {
                dynamic: DynamicMapping::Strict,
                properties: schema,
            },
        };

        let response = self
            .connection
            .client()
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(body)
            .send()
            .await?;

        if response.status_code().is_success() {
            tracing::info!("Index '{}' was created.", name);
            return Ok(EnsureOutcome::Created);
        }

        let diagnostic = response.text().await?;
        if diagnostic.contains("resource_already_exists_exception") {
            // Lost a creation race; the index is there either way.
            tracing::info!("Index '{}' was created concurrently.", name);
            Ok(EnsureOutcome::AlreadyExists)
        } else {
            Err(Error::engine(diagnostic))
        }
    }

    /// Extends an existing index's mapping with additional fields.
    ///
    /// The update keeps the strict dynamic policy in place. Attempts to
    /// remove or retype existing fields come back as
    /// [`Acknowledgement::Rejected`] with the engine diagnostic; the index
    /// mapping is unchanged in that case.
    pub async fn update_mapping(
        &self,
        name: &str,
        additional_fields: &FieldSchema,
    ) -> Result<Acknowledgement> {
        let body = MappingBody {
            dynamic: DynamicMapping::Strict,
            properties: additional_fields,
        };

        let response = self
            .connection
            .client()
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[name]))
            .body(body)
            .send()
            .await?;

        let acknowledgement = read_acknowledgement(response).await?;
        match &acknowledgement {
            Acknowledgement::Acknowledged => {
                tracing::info!("Mapping of index '{}' was extended.", name)
            }
            Acknowledgement::Rejected(diagnostic) => {
                tracing::warn!("Mapping update for index '{}' was rejected: {}", name, diagnostic)
            }
        }
        Ok(acknowledgement)
    }

    /// Applies settings changes that do not require reindexing.
    pub async fn update_settings(
        &self,
        name: &str,
        update: &IndexSettingsUpdate,
    ) -> Result<Acknowledgement> {
        let response = self
            .connection
            .client()
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&[name]))
            .body(serde_json::json!({ "index": update }))
            .send()
            .await?;

        read_acknowledgement(response).await
    }
}

async fn read_acknowledgement(response: Response) -> Result<Acknowledgement> {
    let status = response.status_code();
    let text = response.text().await?;
    decode_acknowledgement(status.is_success(), text)
}

fn decode_acknowledgement(success: bool, text: String) -> Result<Acknowledgement> {
    if !success {
        return Ok(Acknowledgement::Rejected(text));
    }

    #[derive(Deserialize)]
    struct Acked {
        acknowledged: bool,
    }

    let body: Acked = serde_json::from_str(&text)
        .map_err(|err| Error::deserialization(format!("acknowledgement body: {err}")))?;

    if body.acknowledged {
        Ok(Acknowledgement::Acknowledged)
    } else {
        Ok(Acknowledgement::Rejected(text))
    }
}
