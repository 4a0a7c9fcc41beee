//! SQLite connection implementation.
//!
//! Safe wrappers around SQLite's C API implementing the Connection trait
//! from miniweb-core. All access to the raw handle goes through a mutex.

// Allow casts in FFI code where we need to match C types exactly
#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::result_large_err)] // Error type is defined in miniweb-core
#![allow(clippy::borrow_as_ptr)] // FFI requires raw pointers

use crate::types;
use libsqlite3_sys as ffi;
use miniweb_core::{
    Connection, Dialect, Error, Params, Row,
    error::{ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind},
    params::ParamValue,
    row::ColumnInfo,
};
use std::ffi::{CStr, CString, c_int};
use std::ptr;
use std::sync::{Arc, Mutex};

// libsqlite3-sys blocklists this binding; the symbol is present in the
// bundled SQLite library it links, so declare it here.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut ffi::sqlite3) -> c_int;
}

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create, etc.)
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
    /// Open in serialized mode (connections can be shared).
    pub full_mutex: bool,
}

impl OpenFlags {
    /// Create flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Create flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }
        if self.full_mutex {
            flags |= ffi::SQLITE_OPEN_FULLMUTEX;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a new config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// Inner state of the SQLite connection, protected by a mutex.
struct SqliteInner {
    db: *mut ffi::sqlite3,
}

// SAFETY: SQLite handles can be sent between threads when properly
// synchronized. All access goes through the Mutex.
unsafe impl Send for SqliteInner {}

/// A connection to a SQLite database.
///
/// Thread-safe wrapper around a SQLite database handle.
pub struct SqliteConnection {
    inner: Mutex<SqliteInner>,
    path: String,
}

// SqliteConnection is Send + Sync because all access goes through the Mutex
unsafe impl Send for SqliteConnection {}
unsafe impl Sync for SqliteConnection {}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "Invalid path: contains null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if db.is_null() {
                format!("Failed to open database (code {rc})")
            } else {
                // SAFETY: db is valid, errmsg returns a valid C string
                unsafe {
                    let err_ptr = ffi::sqlite3_errmsg(db);
                    let msg = CStr::from_ptr(err_ptr).to_string_lossy().into_owned();
                    ffi::sqlite3_close(db);
                    msg
                }
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!("Failed to open database: {}", msg),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int);
            }
        }

        Ok(Self {
            inner: Mutex::new(SqliteInner { db }),
            path: config.path.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, Error> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self, Error> {
        Self::open(&SqliteConfig::file(path))
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Execute SQL directly without binding (for DDL, etc.)
    pub fn execute_raw(&self, sql: &str) -> Result<(), Error> {
        let inner = self.inner.lock().unwrap();
        let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;

        let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_exec(inner.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg)
        };

        if rc != ffi::SQLITE_OK {
            let msg = if errmsg.is_null() {
                format!("SQLite error code {rc}")
            } else {
                // SAFETY: errmsg is valid
                let msg = unsafe { CStr::from_ptr(errmsg).to_string_lossy().into_owned() };
                unsafe { ffi::sqlite3_free(errmsg.cast()) };
                msg
            };

            return Err(Error::Query(
                QueryError::new(error_kind(inner.db, rc), msg).with_sql(sql),
            ));
        }

        Ok(())
    }

    /// Get the last insert rowid.
    pub fn last_insert_rowid(&self) -> i64 {
        let inner = self.inner.lock().unwrap();
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_last_insert_rowid(inner.db) }
    }

    /// Prepare and execute a query, returning all rows.
    fn query_sync(&self, sql: &str, params: &Params) -> Result<Vec<Row>, Error> {
        let inner = self.inner.lock().unwrap();
        let stmt = prepare_stmt(inner.db, sql)?;

        if let Err(e) = bind_params(inner.db, stmt, sql, params) {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(e);
        }

        // Fetch column names
        // SAFETY: stmt is valid
        let col_count = unsafe { ffi::sqlite3_column_count(stmt) };
        let mut col_names = Vec::with_capacity(col_count as usize);
        for i in 0..col_count {
            let name =
                unsafe { types::column_name(stmt, i) }.unwrap_or_else(|| format!("col{}", i));
            col_names.push(name);
        }
        let columns = Arc::new(ColumnInfo::new(col_names));

        // Fetch rows
        let mut rows = Vec::new();
        loop {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt) };
            match rc {
                ffi::SQLITE_ROW => {
                    let mut values = Vec::with_capacity(col_count as usize);
                    for i in 0..col_count {
                        // SAFETY: stmt is valid, we just got SQLITE_ROW
                        values.push(unsafe { types::read_column(stmt, i) });
                    }
                    rows.push(Row::with_columns(Arc::clone(&columns), values));
                }
                ffi::SQLITE_DONE => break,
                _ => {
                    // SAFETY: stmt is valid
                    unsafe { ffi::sqlite3_finalize(stmt) };
                    return Err(step_error(inner.db, sql));
                }
            }
        }

        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };

        Ok(rows)
    }

    /// Prepare and execute a statement, returning rows affected.
    fn execute_sync(&self, sql: &str, params: &Params) -> Result<u64, Error> {
        let inner = self.inner.lock().unwrap();
        let stmt = prepare_stmt(inner.db, sql)?;

        if let Err(e) = bind_params(inner.db, stmt, sql, params) {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(e);
        }

        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(stmt) };

        // Step errors report through the db handle, so finalize first
        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };

        match rc {
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                // SAFETY: db is valid
                let changes = unsafe { ffi::sqlite3_changes(inner.db) };
                Ok(changes as u64)
            }
            _ => Err(step_error(inner.db, sql)),
        }
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            if !inner.db.is_null() {
                // SAFETY: db is valid
                unsafe {
                    sqlite3_close_v2(inner.db);
                }
            }
        }
    }
}

impl Connection for SqliteConnection {
    fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>, Error> {
        self.query_sync(sql, params)
    }

    fn execute(&self, sql: &str, params: &Params) -> Result<u64, Error> {
        self.execute_sync(sql, params)
    }

    fn insert(&self, sql: &str, params: &Params) -> Result<i64, Error> {
        self.execute_sync(sql, params)?;
        Ok(self.last_insert_rowid())
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

// Helper functions

fn prepare_stmt(db: *mut ffi::sqlite3, sql: &str) -> Result<*mut ffi::sqlite3_stmt, Error> {
    let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;

    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

    // SAFETY: All pointers are valid
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            c_sql.as_ptr(),
            c_sql.as_bytes().len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };

    if rc != ffi::SQLITE_OK {
        return Err(step_error(db, sql));
    }

    Ok(stmt)
}

/// Resolve every `:name` parameter declared by the statement against the
/// parameter set and bind it. A declared parameter with no matching entry
/// is an error before any row is touched.
fn bind_params(
    db: *mut ffi::sqlite3,
    stmt: *mut ffi::sqlite3_stmt,
    sql: &str,
    params: &Params,
) -> Result<(), Error> {
    // SAFETY: stmt is valid
    let count = unsafe { ffi::sqlite3_bind_parameter_count(stmt) };

    for i in 1..=count {
        // SAFETY: stmt is valid, index is within the declared parameter count
        let name_ptr = unsafe { ffi::sqlite3_bind_parameter_name(stmt, i) };
        if name_ptr.is_null() {
            return Err(Error::Query(
                QueryError::new(
                    QueryErrorKind::Unsupported,
                    format!("Positional parameter {} is not supported; use :name", i),
                )
                .with_sql(sql),
            ));
        }
        // SAFETY: name_ptr is a valid C string owned by the statement
        let name = unsafe { CStr::from_ptr(name_ptr).to_string_lossy().into_owned() };

        let value = match params.get(&name) {
            Some(ParamValue::Bound(value)) => value,
            Some(ParamValue::Ident(_)) | None => {
                return Err(Error::Query(
                    QueryError::new(
                        QueryErrorKind::MissingParameter,
                        format!("Missing value for parameter {}", name),
                    )
                    .with_sql(sql),
                ));
            }
        };

        // SAFETY: stmt is valid, index is 1-based
        let rc = unsafe { types::bind_value(stmt, i, value) };
        if rc != ffi::SQLITE_OK {
            return Err(bind_error(db, sql, &name));
        }
    }

    Ok(())
}

fn null_byte_error(sql: &str) -> Error {
    Error::Query(QueryError::new(QueryErrorKind::Syntax, "SQL contains null byte").with_sql(sql))
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, name: &str) -> Error {
    // SAFETY: db is valid
    let msg = unsafe {
        let ptr = ffi::sqlite3_errmsg(db);
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    };

    Error::Query(
        QueryError::new(
            QueryErrorKind::Database,
            format!("Failed to bind parameter {}: {}", name, msg),
        )
        .with_sql(sql),
    )
}

fn step_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let msg = unsafe {
        let ptr = ffi::sqlite3_errmsg(db);
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    };
    // SAFETY: db is valid
    let code = unsafe { ffi::sqlite3_errcode(db) };

    Error::Query(QueryError::new(error_kind(db, code), msg).with_sql(sql))
}

/// Map a SQLite result code to a query error kind.
///
/// Unique and primary-key violations are distinguished from other
/// constraint failures through the extended result code.
fn error_kind(db: *mut ffi::sqlite3, code: c_int) -> QueryErrorKind {
    if code == ffi::SQLITE_CONSTRAINT {
        // SAFETY: db is valid
        let extended = unsafe { ffi::sqlite3_extended_errcode(db) };
        if extended == ffi::SQLITE_CONSTRAINT_UNIQUE || extended == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return QueryErrorKind::Duplicate;
        }
        return QueryErrorKind::Constraint;
    }
    if code == ffi::SQLITE_ERROR {
        return QueryErrorKind::Syntax;
    }
    QueryErrorKind::Database
}
