//! Core types for miniweb.
//!
//! This crate provides the foundational pieces shared by every layer of the
//! framework:
//!
//! - [`Value`] for dynamically-typed SQL values
//! - [`Row`] for fetched result rows
//! - [`Error`] and the framework-wide error taxonomy
//! - [`Dialect`] for driver-specific identifier quoting
//! - [`Params`] for named statement parameters
//! - [`Connection`] trait implemented by database drivers
//! - [`AppConfig`] for explicit, environment-derived configuration

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod params;
pub mod row;
pub mod value;

pub use config::AppConfig;
pub use connection::Connection;
pub use dialect::Dialect;
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, NotFoundError, QueryError,
    QueryErrorKind, Result, TemplateError, TypeError,
};
pub use params::Params;
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
