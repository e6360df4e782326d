//! Connection management for the search engine.
//!
//! A [`Connection`] owns the pooled transport, the request timeout policy,
//! and the per-type default routing table. Every other module in this crate
//! reaches the network exclusively through it.
//!
//! The handle is built explicitly by the caller and shared from there —
//! there is no process-wide singleton:
//!
//! ```rust,ignore
//! let connection = Connection::builder()
//!     .host("http://localhost:9200")
//!     .timeout(Duration::from_secs(30))
//!     .route::<Employee>("employees")
//!     .open()?;
//! ```
//!
//! # Environment Variables
//!
//! [`ConnectionBuilder::from_env`] seeds a builder from the environment:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `OPENSEARCH_URL` | Engine endpoint URL (required) |
//! | `OPENSEARCH_USER` | Username for basic auth (optional) |
//! | `OPENSEARCH_PASS` | Password for basic auth (optional) |
//! | `OPENSEARCH_TIMEOUT_SECS` | Request timeout in seconds (optional) |

use crate::error::{Error, Result};
use crate::schema::entity::Entity;
use opensearch::OpenSearch;
use opensearch::auth::Credentials;
use opensearch::http::transport::{
    MultiNodeConnectionPool, SingleNodeConnectionPool, TransportBuilder,
};
use std::any::TypeId;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`Connection`].
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    hosts: Vec<String>,
    timeout: Option<Duration>,
    basic_auth: Option<(String, String)>,
    routing: HashMap<TypeId, String>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from environment variables.
    ///
    /// Routing is not read from the environment; add routes before `open`.
    pub fn from_env() -> Result<Self> {
        let url =
            env::var("OPENSEARCH_URL").map_err(|_| Error::config("OPENSEARCH_URL is not set"))?;
        let mut builder = Self::new().host(url);

        if let Ok(user) = env::var("OPENSEARCH_USER") {
            let pass = env::var("OPENSEARCH_PASS").unwrap_or_default();
            builder = builder.basic_auth(user, pass);
        }

        if let Ok(seconds) = env::var("OPENSEARCH_TIMEOUT_SECS") {
            let seconds: u64 = seconds
                .parse()
                .map_err(|_| Error::config("OPENSEARCH_TIMEOUT_SECS must be a whole number"))?;
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(builder)
    }

    /// Adds one engine endpoint.
    pub fn host(mut self, url: impl Into<String>) -> Self {
        self.hosts.push(url.into());
        self
    }

    /// Adds several engine endpoints; requests rotate across them.
    pub fn hosts<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts.extend(urls.into_iter().map(Into::into));
        self
    }

    /// Per-request deadline. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    /// Routes documents of `T` to the given index by default.
    pub fn route<T: Entity>(mut self, index: impl Into<String>) -> Self {
        self.routing.insert(TypeId::of::<T>(), index.into());
        self
    }

    /// Validates the configuration and assembles the pooled handle.
    ///
    /// No network I/O happens here; connections are established lazily on
    /// the first request.
    pub fn open(self) -> Result<Connection> {
        if self.hosts.is_empty() {
            return Err(Error::config("at least one engine host is required"));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(Error::config("request timeout must be greater than zero"));
        }

        let mut urls = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let url = host
                .parse()
                .map_err(|err| Error::config(format!("malformed engine host '{host}': {err}")))?;
            urls.push(url);
        }

        let mut builder = if urls.len() == 1 {
            TransportBuilder::new(SingleNodeConnectionPool::new(urls.remove(0)))
        } else {
            TransportBuilder::new(MultiNodeConnectionPool::round_robin(urls, None))
        };
        builder = builder.timeout(timeout);

        if let Some((user, password)) = self.basic_auth {
            builder = builder.auth(Credentials::Basic(user, password));
        }

        let transport = builder
            .build()
            .map_err(|err| Error::config(format!("failed to assemble transport: {err}")))?;

        Ok(Connection {
            client: OpenSearch::new(transport),
            routing: Arc::new(self.routing),
        })
    }
}

/// Shared handle to the engine.
///
/// Cloning is cheap: all clones share one transport and connection pool, and
/// the handle is safe for concurrent use without caller-side locking. Failed
/// requests surface exactly once — retrying is the caller's decision.
#[derive(Clone)]
pub struct Connection {
    client: OpenSearch,
    routing: Arc<HashMap<TypeId, String>>,
}

impl Connection {
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// The underlying engine client. All network I/O in this crate flows
    /// through it.
    pub fn client(&self) -> &OpenSearch {
        &self.client
    }

    /// Default index for documents of `T`, as configured via
    /// [`ConnectionBuilder::route`].
    pub fn default_index<T: Entity>(&self) -> Result<&str> {
        self.routing
            .get(&TypeId::of::<T>())
            .map(String::as_str)
            .ok_or_else(|| {
                Error::config(format!(
                    "no default index routed for type {}",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Cheap reachability probe against the engine root endpoint.
    pub async fn ping(&self) -> Result<bool> {
        let response = self.client.ping().send().await?;
        Ok(response.status_code().is_success())
    }
}
