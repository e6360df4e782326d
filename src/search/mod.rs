//! Query execution and typed result materialization.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::query::{self, QueryIntent};
use crate::schema::entity::{Entity, schema_of};
use opensearch::SearchParts;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Typed hits in the engine's relevance order, plus the total match count.
///
/// `total` counts every matching document, not only the page of hits the
/// engine returned.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    pub records: Vec<T>,
    pub total: u64,
}

/// Executes query intents and decodes hits into record types.
pub struct SearchExecutor {
    connection: Connection,
}

impl SearchExecutor {
    pub fn new(connection: &Connection) -> Self {
        SearchExecutor {
            connection: connection.clone(),
        }
    }

    /// Compiles `intent` against `T`'s derived schema and runs it on `index`.
    ///
    /// Failures split along the retry boundary: [`Error::Engine`] covers
    /// engine-side faults a caller may choose to retry, while
    /// [`Error::Deserialization`] means the response no longer matches `T`
    /// and a retry cannot help.
    pub async fn execute<T: Entity>(
        &self,
        index: &str,
        intent: &QueryIntent,
    ) -> Result<SearchResult<T>> {
        let schema = schema_of::<T>()?;
        let body = json!({ "query": query::compile(intent, &schema)? });

        let response = self
            .connection
            .client()
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await?;

        let status = response.status_code();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::engine(text));
        }

        decode_search_response(&text)
    }
}

#[derive(Deserialize)]
struct SearchResponseBody<T> {
    hits: HitsEnvelope<T>,
}

#[derive(Deserialize)]
struct HitsEnvelope<T> {
    total: TotalHits,
    hits: Vec<Hit<T>>,
}

#[derive(Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Deserialize)]
struct Hit<T> {
    #[serde(rename = "_source")]
    source: T,
}

fn decode_search_response<T: DeserializeOwned>(text: &str) -> Result<SearchResult<T>> {
    let body: SearchResponseBody<T> = serde_json::from_str(text)
        .map_err(|err| Error::deserialization(format!("search response: {err}")))?;

    Ok(SearchResult {
        total: body.hits.total.value,
        records: body.hits.hits.into_iter().map(|hit| hit.source).collect(),
    })
}
