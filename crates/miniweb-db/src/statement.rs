//! Statement preparation helpers.
//!
//! SQL written against the framework uses two placeholder forms:
//! `::name` for identifiers (table and column names) and `:name` for
//! bound values. Identifiers are expanded here, quoted for the target
//! dialect, before the statement reaches the driver; bound values pass
//! through untouched for the driver to resolve.

use miniweb_core::params::ParamValue;
use miniweb_core::{Dialect, Error, Params, Result};
use miniweb_core::error::{QueryError, QueryErrorKind};
use regex::Regex;
use std::sync::LazyLock;

static IDENT_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"::[A-Za-z0-9_]+").unwrap());

/// Replace every `::name` placeholder with the quoted identifier from the
/// parameter set.
///
/// A placeholder with no matching identifier entry fails the whole
/// statement before any SQL is sent.
pub fn expand_identifiers(sql: &str, params: &Params, dialect: Dialect) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;

    for found in IDENT_PLACEHOLDER.find_iter(sql) {
        out.push_str(&sql[last..found.start()]);
        let key = found.as_str();
        match params.get(key) {
            Some(ParamValue::Ident(name)) => out.push_str(&dialect.quote_ident(name)),
            Some(ParamValue::Bound(_)) | None => {
                return Err(Error::Query(
                    QueryError::new(
                        QueryErrorKind::MissingParameter,
                        format!("Missing identifier for placeholder {}", key),
                    )
                    .with_sql(sql),
                ));
            }
        }
        last = found.end();
    }
    out.push_str(&sql[last..]);

    Ok(out)
}

/// Log text truncated to 300 characters.
pub(crate) fn log_excerpt(text: &str) -> &str {
    match text.char_indices().nth(300) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The bound parameters as one JSON object, in insertion order.
pub(crate) fn render_params(params: &Params) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in params.bound().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&serde_json::Value::String(key.to_string()).to_string());
        out.push(':');
        out.push_str(&value.to_json().to_string());
    }
    out.push('}');
    out
}

/// Log a statement before execution. Suppressed in production.
pub(crate) fn log_statement(sql: &str, params: &Params, production: bool) {
    if !production {
        let rendered = render_params(params);
        tracing::debug!(
            target: "miniweb::db",
            sql = log_excerpt(sql),
            params = log_excerpt(&rendered),
        );
    }
}
