//! Named statement parameters.
//!
//! A [`Params`] set carries two kinds of entries for one statement:
//!
//! - identifier parameters, keyed `::name`: table/column names that are
//!   quoted per-dialect and substituted into the SQL text;
//! - bound parameters, keyed `:name`: ordinary values bound by the driver.
//!
//! Insertion order is preserved so log output stays deterministic.

use crate::value::Value;

/// An ordered set of named statement parameters.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

/// One parameter entry: an identifier to splice or a value to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A table or column name, quoted per-dialect at expansion time.
    Ident(String),
    /// An ordinary bound value.
    Bound(Value),
}

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier parameter. The key must start with `::`.
    pub fn ident(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        let key = key.into();
        debug_assert!(key.starts_with("::"), "identifier keys start with '::'");
        self.entries.push((key, ParamValue::Ident(name.into())));
        self
    }

    /// Add a bound value parameter. The key must start with a single `:`.
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        debug_assert!(
            key.starts_with(':') && !key.starts_with("::"),
            "bound keys start with a single ':'"
        );
        self.entries.push((key, ParamValue::Bound(value.into())));
        self
    }

    /// In-place variants for loop-driven construction.
    pub fn push_ident(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.entries
            .push((key.into(), ParamValue::Ident(name.into())));
    }

    pub fn push_bind(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries
            .push((key.into(), ParamValue::Bound(value.into())));
    }

    /// Look up an entry by exact key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterate over the bound (non-identifier) parameters in order.
    pub fn bound(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            ParamValue::Bound(value) => Some((k.as_str(), value)),
            ParamValue::Ident(_) => None,
        })
    }

    /// Iterate over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
