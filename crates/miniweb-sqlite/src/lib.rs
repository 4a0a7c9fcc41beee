//! SQLite driver for miniweb.
//!
//! Implements the [`miniweb_core::Connection`] trait on top of the bundled
//! SQLite C library. Statements use SQLite's native `:name` parameter
//! syntax; the driver resolves each declared parameter against the supplied
//! parameter set and refuses to run a statement with unbound parameters.

pub mod connection;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection};
