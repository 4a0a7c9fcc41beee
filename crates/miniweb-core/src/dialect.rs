//! SQL dialects and identifier quoting.
//!
//! Identifier quoting is distinct from value parameter binding: table and
//! column names are substituted into the SQL text, quoted per-driver, and
//! never sent as bound parameters.

use crate::error::{Error, Result};

/// The SQL dialect of a database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL (double-quoted identifiers)
    #[default]
    Postgres,
    /// MySQL (backtick-quoted identifiers)
    Mysql,
    /// SQLite (double-quoted identifiers)
    Sqlite,
}

impl Dialect {
    /// Resolve a dialect from a connection URL scheme.
    ///
    /// Unsupported schemes are a hard configuration error.
    pub fn from_scheme(scheme: &str) -> Result<Self> {
        match scheme {
            "pgsql" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(Error::config(format!(
                "Unsupported database driver: {other}"
            ))),
        }
    }

    /// Quote an identifier for this dialect.
    ///
    /// Embedded quote characters are escaped by doubling them, so the
    /// result is safe for any input string.
    pub fn quote_ident(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_resolution() {
        assert_eq!(Dialect::from_scheme("pgsql").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_scheme("mysql").unwrap(), Dialect::Mysql);
        assert_eq!(Dialect::from_scheme("sqlite").unwrap(), Dialect::Sqlite);
        assert!(Dialect::from_scheme("oracle").is_err());
    }

    #[test]
    fn quoting_simple() {
        assert_eq!(Dialect::Postgres.quote_ident("users"), "\"users\"");
        assert_eq!(Dialect::Sqlite.quote_ident("users"), "\"users\"");
        assert_eq!(Dialect::Mysql.quote_ident("users"), "`users`");
    }

    #[test]
    fn quoting_keywords_and_spaces() {
        assert_eq!(Dialect::Postgres.quote_ident("select"), "\"select\"");
        assert_eq!(Dialect::Mysql.quote_ident("first name"), "`first name`");
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(
            Dialect::Postgres.quote_ident("user\"name"),
            "\"user\"\"name\""
        );
        assert_eq!(Dialect::Mysql.quote_ident("user`name"), "`user``name`");
    }

    #[test]
    fn quoting_injection_attempt() {
        let malicious = "users\"; DROP TABLE secrets; --";
        assert_eq!(
            Dialect::Postgres.quote_ident(malicious),
            "\"users\"\"; DROP TABLE secrets; --\""
        );
    }
}
