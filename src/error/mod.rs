//! Error types for the catalog MCP server.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` conversions.

use std::borrow::Cow;
use thiserror::Error;

/// Main error type for the catalog MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: Cow<'static, str> },
}

/// JSON-RPC 2.0 and MCP protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Parse error: invalid JSON")]
    ParseError,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(Cow<'static, str>),

    #[error("Internal error: {0}")]
    InternalError(Cow<'static, str>),
}

impl ProtocolError {
    /// Returns the JSON-RPC 2.0 error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::InternalError(_) => -32603,
        }
    }
}

/// Errors raised while loading or looking up the crawled catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read catalog snapshot {path}: {source}")]
    SnapshotUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog snapshot: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),
}

/// Errors from the live database connection collaborator.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// The connection has no rows for the table; sampling skips it.
    #[error("Table not found: {0}")]
    TableNotFound(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(Cow<'static, str>),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
    },
}

/// Recoverable failures raised by a tool executor.
///
/// The invoker turns every one of these into an error outcome; panics are
/// left to propagate.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("No database connection was supplied, but this tool needs one")]
    ConnectionRequired,

    #[error("Missing required argument: {0}")]
    MissingArgument(Cow<'static, str>),

    #[error("Invalid argument {name}: {message}")]
    InvalidArgument {
        name: Cow<'static, str>,
        message: String,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Cannot serialize tool result: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot render tool result")]
    Render(#[from] std::fmt::Error),

    #[error("{0}")]
    Failed(String),
}

/// Result type alias for McpError.
pub type Result<T> = std::result::Result<T, McpError>;

/// Result type alias for DatabaseError.
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

/// Result type alias for ProtocolError.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Result type alias for CatalogError.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result type alias for ExecutionError.
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
