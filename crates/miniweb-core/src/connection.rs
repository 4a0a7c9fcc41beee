//! Database connection trait.
//!
//! Drivers implement [`Connection`]; the access layer in `miniweb-db`
//! expands identifier placeholders and logs statements before delegating
//! here. All operations are synchronous: the framework handles one request
//! start-to-finish per process, so there is no overlapping I/O to manage.

use crate::dialect::Dialect;
use crate::error::Result;
use crate::params::Params;
use crate::row::Row;

/// A database connection capable of executing parameterized statements.
///
/// The SQL passed to these methods has already had its `::name` identifier
/// placeholders expanded; only `:name` bound parameters remain, and the
/// driver resolves them by name.
pub trait Connection: Send + Sync {
    /// Execute a statement that returns rows.
    fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>>;

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &Params) -> Result<u64>;

    /// Execute an INSERT and return the last inserted row id.
    fn insert(&self, sql: &str, params: &Params) -> Result<i64>;

    /// The SQL dialect of this driver.
    fn dialect(&self) -> Dialect;
}
