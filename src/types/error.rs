//! Error types for H2GIS native binding operations.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, H2gisError>;

/// Error type for every operation that crosses the native boundary.
///
/// Each variant is a distinct failure the caller can match on; none of them
/// are swallowed except inside teardown and `ping`.
#[derive(Error, Debug)]
pub enum H2gisError {
    /// Shared library or one of its symbols could not be loaded
    #[error("Failed to load native library: {0}")]
    Library(String),

    /// `graal_create_isolate` returned a non-zero status
    #[error("Failed to create GraalVM isolate (code {code})")]
    IsolateCreation { code: i32 },

    /// Argument rejected before any native call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Native connect returned the zero handle, or no connection is open
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement returned a negative code
    #[error("Execution failed (code {code}): {message}")]
    Execution { code: i64, message: String },

    /// Fetch returned the zero query handle
    #[error("Query failed: {0}")]
    Query(String),

    /// In-band `Error:` sentinel read from the result stream
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// Chunk was neither blank, an error sentinel, nor decodable rows
    #[error("Failed to decode result chunk ({reason}): {chunk}")]
    ResultDecoding { chunk: String, reason: String },

    /// Call attempted after the isolate was torn down
    #[error("Session closed: isolate already torn down")]
    SessionClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error outside the result stream (config files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl H2gisError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a decoding error carrying the raw chunk.
    pub fn decoding(chunk: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResultDecoding {
            chunk: chunk.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the session can still be used after this error.
    ///
    /// # Returns
    ///
    /// `false` only for isolate creation failures and teardown
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::IsolateCreation { .. } | Self::SessionClosed | Self::Library(_))
    }
}
