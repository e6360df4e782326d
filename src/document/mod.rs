//! Document ingestion: single upserts and bulk batches.
//!
//! Writes become visible to search only after the engine's refresh interval
//! elapses — callers must not assume read-after-write visibility.
//!
//! Nothing here retries. A repeated `put` is idempotent because documents
//! are addressed by their identifier, but re-submitting a whole batch after
//! a timeout can double-report items the engine had already applied, so the
//! decision stays with the caller.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::schema::entity::Entity;
use opensearch::http::request::JsonBody;
use opensearch::{BulkParts, IndexParts};
use serde::Deserialize;
use serde_json::{Value, json};

/// Per-document result of a write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Identifier the document was addressed under.
    pub id: String,
    pub success: bool,
    /// Engine diagnostic for failed writes.
    pub error: Option<String>,
}

impl WriteOutcome {
    fn accepted(id: String) -> Self {
        WriteOutcome {
            id,
            success: true,
            error: None,
        }
    }

    fn rejected(id: String, error: String) -> Self {
        WriteOutcome {
            id,
            success: false,
            error: Some(error),
        }
    }
}

/// Writes records into their routed index as documents.
pub struct DocumentWriter {
    connection: Connection,
}

impl DocumentWriter {
    pub fn new(connection: &Connection) -> Self {
        DocumentWriter {
            connection: connection.clone(),
        }
    }

    /// Create-or-replace one record under its document identifier.
    ///
    /// Engine rejections (a strict-mapping violation, a malformed value)
    /// come back as a failed [`WriteOutcome`] carrying the diagnostic;
    /// `Err` is reserved for transport-level faults.
    pub async fn put<T: Entity>(&self, record: &T) -> Result<WriteOutcome> {
        let index = self.connection.default_index::<T>()?;
        let id = record.document_id();

        let response = self
            .connection
            .client()
            .index(IndexParts::IndexId(index, &id))
            .body(record)
            .send()
            .await?;

        if response.status_code().is_success() {
            Ok(WriteOutcome::accepted(id))
        } else {
            Ok(WriteOutcome::rejected(id, response.text().await?))
        }
    }

    /// Submits all records as one bulk operation.
    ///
    /// Partial failure is expected and normal: one record's rejection does
    /// not abort its siblings. The returned outcomes preserve input order,
    /// one per submitted record.
    pub async fn put_batch<T: Entity>(&self, records: &[T]) -> Result<Vec<WriteOutcome>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.connection.default_index::<T>()?;
        let body: Vec<JsonBody<Value>> = bulk_lines(records)?
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .connection
            .client()
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await?;

        let status = response.status_code();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::engine(text));
        }

        decode_bulk_response(&text, records.len())
    }
}

/// Action/source line pairs for the bulk request, in input order.
fn bulk_lines<T: Entity>(records: &[T]) -> Result<Vec<Value>> {
    let mut lines = Vec::with_capacity(records.len() * 2);
    for record in records {
        let id = record.document_id();
        let source = serde_json::to_value(record)
            .map_err(|err| Error::config(format!("record '{id}' is not serializable: {err}")))?;
        lines.push(json!({ "index": { "_id": id } }));
        lines.push(source);
    }
    Ok(lines)
}

#[derive(Deserialize)]
struct BulkResponseBody {
    items: Vec<BulkResponseItem>,
}

/// One entry per submitted record, keyed by the action that produced it.
#[derive(Deserialize)]
struct BulkResponseItem {
    index: BulkItemStatus,
}

#[derive(Deserialize)]
struct BulkItemStatus {
    #[serde(rename = "_id")]
    id: String,
    status: u16,
    error: Option<BulkItemError>,
}

#[derive(Deserialize)]
struct BulkItemError {
    #[serde(rename = "type")]
    kind: String,
    reason: Option<String>,
}

fn decode_bulk_response(text: &str, submitted: usize) -> Result<Vec<WriteOutcome>> {
    let body: BulkResponseBody = serde_json::from_str(text)
        .map_err(|err| Error::deserialization(format!("bulk response: {err}")))?;

    if body.items.len() != submitted {
        return Err(Error::deserialization(format!(
            "bulk response reported {} items for {} submitted records",
            body.items.len(),
            submitted
        )));
    }

    Ok(body
        .items
        .into_iter()
        .map(|item| {
            let status = item.index;
            match status.error {
                Some(error) => {
                    let reason = error.reason.unwrap_or_else(|| "unspecified".to_string());
                    WriteOutcome::rejected(status.id, format!("{}: {reason}", error.kind))
                }
                None if status.status < 300 => WriteOutcome::accepted(status.id),
                None => WriteOutcome::rejected(status.id, format!("status {}", status.status)),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::entity::{FieldDecl, MappingOverrides};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Reading {
        id: i64,
        sensor: String,
        value: f64,
    }

    impl Entity for Reading {
        fn declared_fields() -> Vec<FieldDecl> {
            vec![
                FieldDecl::integer("id"),
                FieldDecl::string("sensor"),
                FieldDecl::float("value"),
            ]
        }

        fn document_id(&self) -> String {
            self.id.to_string()
        }
    }

    fn reading(id: i64, value: f64) -> Reading {
        Reading {
            id,
            sensor: format!("sensor-{id}"),
            value,
        }
    }

    #[test]
    fn bulk_lines_pair_actions_with_sources_in_order() {
        let lines = bulk_lines(&[reading(1, 20.5), reading(2, 21.0)]).unwrap();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], json!({ "index": { "_id": "1" } }));
        assert_eq!(lines[1]["sensor"], json!("sensor-1"));
        assert_eq!(lines[2], json!({ "index": { "_id": "2" } }));
        assert_eq!(lines[3]["value"], json!(21.0));
    }

    #[test]
    fn bulk_response_reports_per_item_outcomes_in_order() {
        let text = r#"{
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "index": { "_id": "2", "status": 400, "error": {
                    "type": "strict_dynamic_mapping_exception",
                    "reason": "mapping set to strict, dynamic introduction of [wibble] is not allowed"
                } } },
                { "index": { "_id": "3", "status": 200 } }
            ]
        }"#;

        let outcomes = decode_bulk_response(text, 3).unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[2].success);
        assert_eq!(outcomes[1].id, "2");
        assert!(
            outcomes[1]
                .error
                .as_deref()
                .unwrap()
                .contains("strict_dynamic_mapping_exception")
        );
    }

    #[test]
    fn bulk_response_with_wrong_item_count_is_rejected() {
        let text = r#"{ "items": [ { "index": { "_id": "1", "status": 201 } } ] }"#;
        assert!(matches!(
            decode_bulk_response(text, 2),
            Err(Error::Deserialization(_))
        ));
    }

    #[test]
    fn unreadable_bulk_response_is_a_deserialization_error() {
        assert!(matches!(
            decode_bulk_response("<html>bad gateway</html>", 1),
            Err(Error::Deserialization(_))
        ));
    }

    mod live {
        //! Tests against a running engine; `cargo test -- --ignored` with
        //! `OPENSEARCH_URL` pointing at it.

        use super::super::*;
        use super::Reading;
        use crate::index::IndexManager;
        use crate::schema::entity::schema_of;

        fn unique_index(label: &str) -> String {
            format!("ponzu-test-{label}-{}", std::process::id())
        }

        fn live_connection(index: &str) -> Connection {
            let url = std::env::var("OPENSEARCH_URL")
                .unwrap_or_else(|_| "http://localhost:9200".to_string());
            Connection::builder()
                .host(url)
                .route::<Reading>(index)
                .open()
                .unwrap()
        }

        #[tokio::test]
        #[ignore]
        async fn put_upserts_by_document_id() {
            let index = unique_index("put");
            let connection = live_connection(&index);
            let schema = schema_of::<Reading>().unwrap();
            IndexManager::new(&connection)
                .ensure_index(&index, &schema)
                .await
                .unwrap();

            let writer = DocumentWriter::new(&connection);

            let first = writer.put(&super::reading(7, 20.5)).await.unwrap();
            let second = writer.put(&super::reading(7, 23.0)).await.unwrap();

            assert!(first.success);
            assert!(second.success);
            assert_eq!(second.id, "7");
        }

        #[tokio::test]
        #[ignore]
        async fn batch_failures_do_not_abort_sibling_writes() {
            // A looser sibling type writing into the same strictly-mapped
            // index: its extra field violates the strict policy.
            #[derive(Debug, serde::Serialize, serde::Deserialize)]
            struct WideReading {
                id: i64,
                sensor: String,
                value: f64,
                #[serde(skip_serializing_if = "Option::is_none")]
                comment: Option<String>,
            }

            impl Entity for WideReading {
                fn declared_fields() -> Vec<crate::schema::entity::FieldDecl> {
                    Reading::declared_fields()
                }

                fn document_id(&self) -> String {
                    self.id.to_string()
                }
            }

            let index = unique_index("batch");
            let url = std::env::var("OPENSEARCH_URL")
                .unwrap_or_else(|_| "http://localhost:9200".to_string());
            let connection = Connection::builder()
                .host(url)
                .route::<WideReading>(&index)
                .open()
                .unwrap();

            let schema = schema_of::<WideReading>().unwrap();
            IndexManager::new(&connection)
                .ensure_index(&index, &schema)
                .await
                .unwrap();

            let records = vec![
                WideReading { id: 1, sensor: "a".into(), value: 1.0, comment: None },
                WideReading { id: 2, sensor: "b".into(), value: 2.0, comment: Some("oops".into()) },
                WideReading { id: 3, sensor: "c".into(), value: 3.0, comment: None },
            ];

            let outcomes = DocumentWriter::new(&connection)
                .put_batch(&records)
                .await
                .unwrap();

            assert_eq!(outcomes.len(), 3);
            assert!(outcomes[0].success);
            assert!(!outcomes[1].success);
            assert!(outcomes[2].success);
            assert!(outcomes[1].error.as_deref().unwrap().contains("strict"));
        }
    }
}
