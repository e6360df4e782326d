//! Error taxonomy shared across the crate.
//!
//! Local validation errors ([`Error::Config`], [`Error::UnsupportedFieldKind`],
//! [`Error::UnknownField`], [`Error::InvalidQuery`]) are raised before any
//! network round trip and indicate a caller-side problem. Engine and transport
//! errors ([`Error::Engine`], [`Error::Timeout`], [`Error::Transport`]) surface
//! exactly once per request; nothing is retried by this crate.

use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of this crate.
#[derive(Debug)]
pub enum Error {
    /// Bad local setup: malformed hosts, missing routing, invalid timeouts.
    /// Not retryable without a caller-side fix.
    Config(String),
    /// A declared field has no mapping rule (e.g. raw binary values), or an
    /// override was applied to a field it cannot apply to.
    UnsupportedFieldKind {
        /// Dotted path of the offending field.
        field: String,
        /// What made the field unmappable.
        detail: String,
    },
    /// A field path that does not exist in the schema the index was built from.
    UnknownField(String),
    /// A structurally invalid query intent (e.g. a range with no bounds).
    InvalidQuery(String),
    /// The engine refused an operation. Carries the engine's diagnostic body;
    /// whether a retry makes sense depends on its content.
    Engine(String),
    /// The configured request deadline elapsed before a response arrived.
    Timeout,
    /// Transport-level failure below the engine (DNS, TCP, TLS).
    Transport(opensearch::Error),
    /// A response body did not match the expected shape. Not retryable;
    /// usually indicates drift between the schema and the record type.
    Deserialization(String),
}

impl Error {
    pub fn config(message: impl ToString) -> Self {
        Error::Config(message.to_string())
    }

    pub fn unknown_field(path: impl ToString) -> Self {
        Error::UnknownField(path.to_string())
    }

    pub fn invalid_query(message: impl ToString) -> Self {
        Error::InvalidQuery(message.to_string())
    }

    pub fn engine(diagnostic: impl ToString) -> Self {
        Error::Engine(diagnostic.to_string())
    }

    pub fn deserialization(message: impl ToString) -> Self {
        Error::Deserialization(message.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(message) => write!(f, "invalid configuration: {message}"),
            Error::UnsupportedFieldKind { field, detail } => {
                write!(f, "field '{field}' cannot be mapped: {detail}")
            }
            Error::UnknownField(path) => write!(f, "unknown field '{path}'"),
            Error::InvalidQuery(message) => write!(f, "invalid query intent: {message}"),
            Error::Engine(diagnostic) => write!(f, "engine rejected the request: {diagnostic}"),
            Error::Timeout => write!(f, "request exceeded the configured timeout"),
            Error::Transport(err) => write!(f, "transport failure: {err}"),
            Error::Deserialization(message) => {
                write!(f, "response did not match the expected shape: {message}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<opensearch::Error> for Error {
    fn from(err: opensearch::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(err)
        }
    }
}
