//! Error types for miniweb operations.

use std::fmt;

/// The primary error type for all miniweb operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (open, disconnect)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Configuration errors
    Config(ConfigError),
    /// Template rendering errors
    Template(TemplateError),
    /// Missing controller or action.
    ///
    /// This is a normal control-flow outcome of dispatch, not a fatal
    /// condition: the dispatcher routes it to the error controller, which
    /// surfaces it as HTTP 404 in production.
    NotFound(NotFoundError),
    /// I/O errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Connection lost during operation
    Disconnected,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Unique or primary-key constraint violation
    Duplicate,
    /// Other constraint violation (foreign key, check, not null)
    Constraint,
    /// Named parameter missing from the parameter set
    MissingParameter,
    /// Cursor operation the rowset does not support
    Unsupported,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct TemplateError {
    pub template: String,
    pub message: String,
}

/// A missing controller or action.
#[derive(Debug, Clone)]
pub struct NotFoundError {
    pub message: String,
}

impl NotFoundError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Error {
    /// Shorthand for a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
            source: None,
        })
    }

    /// Shorthand for a missing controller/action outcome.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(NotFoundError::new(message))
    }

    /// Is this a duplicate-key violation?
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Error::Query(QueryError {
                kind: QueryErrorKind::Duplicate,
                ..
            })
        )
    }

    /// Is this the missing controller/action outcome?
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Get the SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl QueryError {
    /// Build a query error without SQL context.
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            sql: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the SQL text that produced this error.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Is this a unique or primary-key constraint violation?
    pub fn is_unique_violation(&self) -> bool {
        self.kind == QueryErrorKind::Duplicate
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Template(e) => write!(f, "Template error in '{}': {}", e.template, e.message),
            Error::NotFound(e) => write!(f, "Not found: {}", e.message),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.template, self.message)
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<TemplateError> for Error {
    fn from(err: TemplateError) -> Self {
        Error::Template(err)
    }
}

impl From<NotFoundError> for Error {
    fn from(err: NotFoundError) -> Self {
        Error::NotFound(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for miniweb operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_helpers() {
        let query = QueryError::new(QueryErrorKind::Duplicate, "UNIQUE constraint failed")
            .with_sql("INSERT INTO users (email) VALUES (:v)");

        assert!(query.is_unique_violation());

        let err = Error::Query(query);
        assert!(err.is_duplicate());
        assert_eq!(err.sql(), Some("INSERT INTO users (email) VALUES (:v)"));

        let generic = Error::Query(QueryError::new(QueryErrorKind::Database, "boom"));
        assert!(!generic.is_duplicate());
    }

    #[test]
    fn not_found_is_not_duplicate() {
        let err = Error::not_found("Controller not found: blog:index");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
        assert_eq!(err.to_string(), "Not found: Controller not found: blog:index");
    }
}
