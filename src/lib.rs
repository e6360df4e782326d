//! # Ponzu
//!
//! A typed client layer for an OpenSearch/Elasticsearch-style document
//! search engine.
//!
//! Ponzu manages the lifecycle of an index for an application record type
//! — deriving its field mapping, creating the index under a strict
//! dynamic-mapping policy, growing the mapping additively — and exposes a
//! typed query surface over it: structured query intents compile to the
//! engine's wire queries, and hits come back as typed records.
//!
//! The engine itself stays remote; no state of record lives in this crate.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ponzu::connection::Connection;
//! use ponzu::document::DocumentWriter;
//! use ponzu::index::IndexManager;
//! use ponzu::query::QueryIntent;
//! use ponzu::schema::entity::{Entity, FieldDecl, schema_of};
//! use ponzu::search::SearchExecutor;
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Employee {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Entity for Employee {
//!     fn declared_fields() -> Vec<FieldDecl> {
//!         vec![FieldDecl::integer("id"), FieldDecl::string("name")]
//!     }
//!
//!     fn document_id(&self) -> String {
//!         self.id.to_string()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ponzu::error::Error> {
//!     let connection = Connection::builder()
//!         .host("http://localhost:9200")
//!         .route::<Employee>("employees")
//!         .open()?;
//!
//!     let schema = schema_of::<Employee>()?;
//!     IndexManager::new(&connection)
//!         .ensure_index("employees", &schema)
//!         .await?;
//!
//!     let employee = Employee { id: 1, name: "jim shao".into() };
//!     DocumentWriter::new(&connection).put(&employee).await?;
//!
//!     let hits = SearchExecutor::new(&connection)
//!         .execute::<Employee>("employees", &QueryIntent::phrase("name", "jim shao"))
//!         .await?;
//!     assert!(hits.total >= 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`connection`] - Endpoint pool, timeout policy, per-type index routing
//! - [`schema`] - Field schemas, derivation from record declarations
//! - [`index`] - Index creation, mapping growth, settings changes
//! - [`document`] - Single and bulk document writes with per-item outcomes
//! - [`query`] - Query intents and pure compilation to wire queries
//! - [`search`] - Query execution and typed result materialization
//! - [`error`] - The crate-wide error taxonomy
//! - [`logging`] - Tracing setup for drivers and tests
//!
//! ## Concurrency
//!
//! Every engine operation is an async suspension point; all local work
//! (schema derivation, query compilation) is synchronous. A [`connection::Connection`]
//! may be shared freely across tasks. Concurrent mapping updates against the
//! same index are not serialized by this crate — callers that extend one
//! index from several places must coordinate that themselves.

/// Endpoint pool, timeout policy, and per-type index routing.
pub mod connection;

/// Single and bulk document writes.
pub mod document;

/// Error taxonomy shared across the crate.
pub mod error;

/// Index lifecycle operations.
pub mod index;

/// Tracing and logging setup.
pub mod logging;

/// Query intents and compilation.
pub mod query;

/// Field schemas and derivation.
pub mod schema;

/// Query execution and typed results.
pub mod search;
