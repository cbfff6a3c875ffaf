//! Core error types.

use thiserror::Error;

/// Errors raised by drivers and connection handles.
///
/// The schema and connection APIs do not return these directly; they keep the
/// last error on the [`Database`](crate::Database) or [`Query`](crate::Query)
/// and report a boolean outcome instead.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The handle does not refer to any connection.
    #[error("invalid connection handle")]
    InvalidHandle,

    /// The connection has not been opened.
    #[error("connection is not open")]
    NotOpen,

    /// Opening the connection failed.
    #[error("connection error: {0}")]
    Connect(String),

    /// The driver rejected or failed to run a statement.
    #[error("statement error: {message}")]
    Statement {
        /// Driver error text.
        message: String,
        /// Native driver error code, when the driver reports one.
        code: Option<i32>,
    },

    /// SQLite driver error.
    #[error("sqlite error: {0}")]
    Sqlite(String),

    /// Invalid model definition.
    #[error("schema error: {0}")]
    Schema(String),
}

impl Error {
    /// Build a statement error without a native code.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
            code: None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message) => Self::Statement {
                message: message.unwrap_or_else(|| code.to_string()),
                code: Some(code.extended_code),
            },
            other => Self::Sqlite(other.to_string()),
        }
    }
}

/// Result alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;
