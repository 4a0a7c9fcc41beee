//! The per-process database handle.

use crate::statement::{expand_identifiers, log_statement};
use crate::url::DbUrl;
use miniweb_core::{AppConfig, Connection, Dialect, Error, Params, Result, Row};
use miniweb_sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

/// A lazily-connected database handle.
///
/// The framework serves one request per process, so a single connection
/// is opened on first use and reused for the rest of the process
/// lifetime. Cloning the handle is cheap; clones share the connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    url: DbUrl,
    production: bool,
    conn: Mutex<Option<Arc<dyn Connection>>>,
}

impl Database {
    /// Create a handle from a connection URL. No connection is opened yet.
    pub fn new(url: &str, production: bool) -> Result<Self> {
        let url = DbUrl::parse(url)?;
        // Reject unknown schemes up front rather than on first query.
        Dialect::from_scheme(&url.scheme)?;
        Ok(Self {
            inner: Arc::new(DatabaseInner {
                url,
                production,
                conn: Mutex::new(None),
            }),
        })
    }

    /// Create a handle from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.database_url, config.production)
    }

    /// Wrap an already-open driver connection.
    pub fn with_connection(conn: Arc<dyn Connection>, production: bool) -> Self {
        let scheme = match conn.dialect() {
            Dialect::Postgres => "pgsql",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        Self {
            inner: Arc::new(DatabaseInner {
                url: DbUrl {
                    scheme: scheme.to_string(),
                    user: None,
                    password: None,
                    host: None,
                    port: None,
                    database: String::new(),
                },
                production,
                conn: Mutex::new(Some(conn)),
            }),
        }
    }

    /// The SQL dialect for this handle, known without connecting.
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_scheme(&self.inner.url.scheme)
    }

    fn connection(&self) -> Result<Arc<dyn Connection>> {
        let mut guard = self.inner.conn.lock().unwrap();
        if let Some(conn) = guard.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let conn: Arc<dyn Connection> = match self.inner.url.scheme.as_str() {
            "sqlite" => {
                let conn = if self.inner.url.database == ":memory:" {
                    SqliteConnection::open_memory()?
                } else {
                    SqliteConnection::open_file(self.inner.url.database.clone())?
                };
                Arc::new(conn)
            }
            other => {
                return Err(Error::config(format!(
                    "No driver available for scheme: {other}"
                )));
            }
        };

        tracing::debug!(target: "miniweb::db", database = %self.inner.url.database, "connected");
        *guard = Some(Arc::clone(&conn));
        Ok(conn)
    }

    fn prepare(&self, sql: &str, params: &Params) -> Result<(Arc<dyn Connection>, String)> {
        let conn = self.connection()?;
        let expanded = expand_identifiers(sql, params, conn.dialect())?;
        log_statement(&expanded, params, self.inner.production);
        Ok((conn, expanded))
    }

    /// Run a statement that returns rows.
    pub fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        let (conn, expanded) = self.prepare(sql, params)?;
        conn.query(&expanded, params)
    }

    /// Run a statement and return the number of affected rows.
    pub fn execute(&self, sql: &str, params: &Params) -> Result<u64> {
        let (conn, expanded) = self.prepare(sql, params)?;
        conn.execute(&expanded, params)
    }

    /// Run an INSERT and return the last inserted row id.
    pub fn insert(&self, sql: &str, params: &Params) -> Result<i64> {
        let (conn, expanded) = self.prepare(sql, params)?;
        conn.insert(&expanded, params)
    }
}
