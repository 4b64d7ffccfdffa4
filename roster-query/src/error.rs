//! Error types for search and pagination
//!
//! Two layers, mirroring how the store and the caller see a failure:
//!
//! - [`ExecutionError`]: structured failure reported by a [`QueryExecutor`]
//!   (connectivity, syntax, constraint). Carries the operation that failed and
//!   a coarse category so callers that own retry policy can decide.
//! - [`Error`]: what repository operations return. Adds argument validation and
//!   configuration failures on top of execution errors.
//!
//! An inconsistent total (count smaller than the rows already seen) is not an
//! error; see [`crate::count::InconsistentTotal`].
//!
//! [`QueryExecutor`]: crate::executor::QueryExecutor

use std::fmt;
use thiserror::Error;

// ============================================================================
// Structured Execution Errors
// ============================================================================

/// Query operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperation {
    /// Establishing a connection or acquiring one from the pool
    Connect,
    /// Creating tables and indexes
    Migrate,
    /// Running the content query
    Fetch,
    /// Running the total-count query
    Count,
    /// Inserting a member or team
    Insert,
    /// Removing a member
    Delete,
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Migrate => write!(f, "migrate"),
            Self::Fetch => write!(f, "fetch"),
            Self::Count => write!(f, "count"),
            Self::Insert => write!(f, "insert"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of execution error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionErrorKind {
    /// Failed to establish or keep a connection
    ConnectionFailed,
    /// Constraint violation (unique, foreign key, check)
    ConstraintViolation,
    /// The store rejected the statement
    QueryFailed,
    /// A column could not be decoded into the projected type
    TypeConversion,
    /// Operation timed out
    Timeout,
    /// Other/unknown error
    Other,
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::TypeConversion => write!(f, "type_conversion"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured execution error with operation context
///
/// # Example
///
/// ```rust
/// use roster_query::error::{ExecutionError, ExecutionErrorKind, QueryOperation};
///
/// let error = ExecutionError::new(
///     QueryOperation::Count,
///     ExecutionErrorKind::QueryFailed,
///     "no such table: member",
/// );
/// assert!(!error.is_retriable());
/// assert_eq!(error.to_string(), "Execution query_failed error during count: no such table: member");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    /// The operation being performed when the error occurred
    pub operation: QueryOperation,
    /// The category of error
    pub kind: ExecutionErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl ExecutionError {
    /// Create a new execution error
    pub fn new(
        operation: QueryOperation,
        kind: ExecutionErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            QueryOperation::Connect,
            ExecutionErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a constraint violation error
    pub fn constraint_violation(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ExecutionErrorKind::ConstraintViolation, message)
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: QueryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient. This crate never retries; the flag is
    /// for the transaction layer that does.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            ExecutionErrorKind::ConnectionFailed | ExecutionErrorKind::Timeout
        )
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Execution {} error during {}: {}",
            self.kind, self.operation, self.message
        )
    }
}

impl std::error::Error for ExecutionError {}

// ============================================================================
// Repository Errors
// ============================================================================

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type returned by repository operations
#[derive(Debug, Error)]
pub enum Error {
    /// Negative offset, negative page index, non-positive page size, or an
    /// otherwise unusable argument. Never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying store failed; propagated unchanged
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// The execution error behind this error, if any
    pub fn as_execution(&self) -> Option<&ExecutionError> {
        match self {
            Self::Execution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

// Conversion from sqlx::Error to ExecutionError
#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::PoolTimedOut => Self::new(
                QueryOperation::Connect,
                ExecutionErrorKind::Timeout,
                "Connection pool timed out",
            ),
            E::PoolClosed => Self::connection_failed("Connection pool is closed"),
            E::WorkerCrashed => Self::connection_failed("Database worker crashed"),
            E::Io(e) => Self::connection_failed(e.to_string()),
            E::Tls(e) => Self::connection_failed(format!("TLS error: {}", e)),
            E::Configuration(e) => Self::new(
                QueryOperation::Connect,
                ExecutionErrorKind::ConnectionFailed,
                e.to_string(),
            ),
            E::Protocol(msg) => Self::new(
                QueryOperation::Fetch,
                ExecutionErrorKind::QueryFailed,
                msg,
            ),
            E::ColumnNotFound(col) => Self::new(
                QueryOperation::Fetch,
                ExecutionErrorKind::QueryFailed,
                format!("Column not found: {}", col),
            ),
            E::ColumnDecode { index, source } => Self::new(
                QueryOperation::Fetch,
                ExecutionErrorKind::TypeConversion,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::Decode(e) => Self::new(
                QueryOperation::Fetch,
                ExecutionErrorKind::TypeConversion,
                e.to_string(),
            ),
            E::Database(db_err) => {
                let kind = if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                {
                    ExecutionErrorKind::ConstraintViolation
                } else {
                    ExecutionErrorKind::QueryFailed
                };
                Self::new(QueryOperation::Fetch, kind, db_err.to_string())
            }
            _ => Self::new(
                QueryOperation::Fetch,
                ExecutionErrorKind::Other,
                err.to_string(),
            ),
        }
    }
}
