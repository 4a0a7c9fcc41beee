//! Database access layer for miniweb.
//!
//! [`Database`] owns one lazily-opened driver connection per process and
//! fronts it with the framework's statement conventions: `::name`
//! identifier placeholders are expanded with per-dialect quoting before
//! the SQL reaches the driver, `:name` value parameters are left for the
//! driver to bind, and every statement is logged (truncated) outside
//! production.

pub mod database;
pub mod statement;
pub mod url;

pub use database::Database;
pub use statement::expand_identifiers;
pub use url::DbUrl;
