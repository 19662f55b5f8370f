//! Unified error type for the DAO layer.

use thiserror::Error;

/// SQLSTATE raised by Postgres on unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised by Postgres when a serializable transaction cannot commit.
const SERIALIZATION_FAILURE: &str = "40001";

/// Unified error type for DAO operations.
#[derive(Error, Debug)]
pub enum DaoError {
    /// An update matched no rows.
    #[error("record not found")]
    NotFound,

    /// A driver error wrapped with the operation that produced it.
    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Unwrapped driver error.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Unique constraint violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A record could not be mapped to columns.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The SQL builder rejected the statement.
    #[error("Query builder error: {0}")]
    Builder(String),

    /// Transaction misuse (nested begin, commit without begin).
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The query context deadline elapsed.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error returned by caller code, e.g. from a transaction body.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DaoError {
    /// Wraps a driver error with a short description of the failed operation.
    #[must_use]
    pub fn query(context: &'static str, source: sqlx::Error) -> Self {
        Self::Query { context, source }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a transaction error.
    #[must_use]
    pub fn transaction<T: Into<String>>(message: T) -> Self {
        Self::Transaction(message.into())
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Query { .. } | Self::Database(_) => "DATABASE_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Mapping(_) => "MAPPING_ERROR",
            Self::Builder(_) => "QUERY_BUILDER_ERROR",
            Self::Transaction(_) => "TRANSACTION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the underlying driver error, if any.
    #[must_use]
    pub fn sqlx_error(&self) -> Option<&sqlx::Error> {
        match self {
            Self::Query { source, .. } => Some(source),
            Self::Database(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the Postgres SQLSTATE code of the underlying error, if any.
    #[must_use]
    pub fn sqlstate(&self) -> Option<String> {
        match self.sqlx_error()? {
            sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
            _ => None,
        }
    }

    /// Checks whether a serializable transaction lost a conflict and may be retried.
    #[must_use]
    pub fn is_serialization_failure(&self) -> bool {
        self.sqlstate().as_deref() == Some(SERIALIZATION_FAILURE)
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Query { source, .. } | Self::Database(source) => matches!(
                source,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ) || self.is_serialization_failure(),
            _ => false,
        }
    }

    /// Returns true for the not-found condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<sqlx::Error> for DaoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return Self::Conflict(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}

impl From<sea_query::error::Error> for DaoError {
    fn from(err: sea_query::error::Error) -> Self {
        Self::Builder(err.to_string())
    }
}

impl From<serde_json::Error> for DaoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Mapping(format!("JSON serialization error: {}", err))
    }
}
