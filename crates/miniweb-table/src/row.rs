//! Hydrated table rows and the ordered field store behind them.

use crate::encode::{encode_value, write_expr};
use crate::rowset::{Rowset, SearchTerm};
use crate::schema::RelationKind;
use crate::table::Table;
use miniweb_core::error::TypeError;
use miniweb_core::row::FromValue;
use miniweb_core::{Error, Params, Result, Value};

/// An ordered field name to value store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion for literal records.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any existing value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Typed field access.
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("field '{}' not found", name),
                column: Some(name.to_string()),
            })
        })?;
        T::from_value(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The fields as a JSON object, in insertion order of the keys.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(n, v)| (n.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

/// The result of resolving a declared relation.
pub enum Related {
    /// Has-one target, absent when the foreign key is NULL or unmatched.
    One(Option<TableRow>),
    /// Has-many target as a deferred rowset.
    Many(Rowset),
}

/// One hydrated record of a table.
///
/// Keeps the values as fetched (`origin`) next to the current values, so
/// `save` can write exactly the fields that changed and skip the
/// statement entirely when nothing did.
#[derive(Clone)]
pub struct TableRow {
    table: Table,
    current: Record,
    origin: Record,
}

impl std::fmt::Debug for TableRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRow")
            .field("table", &self.table.schema().name())
            .field("current", &self.current)
            .field("origin", &self.origin)
            .finish()
    }
}

impl TableRow {
    pub(crate) fn hydrated(table: Table, record: Record) -> Self {
        Self {
            table,
            origin: record.clone(),
            current: record,
        }
    }

    pub fn fields(&self) -> &Record {
        &self.current
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.current.get(name)
    }

    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        self.current.get_named(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.current.set(name, value);
    }

    /// Write changed fields back, targeting the row by its origin primary
    /// key. No statement runs when nothing changed. Primary key columns
    /// never appear in the SET list.
    pub fn save(&mut self) -> Result<()> {
        let schema = self.table.schema();

        let mut changed: Vec<(String, Value)> = Vec::new();
        for (name, value) in self.current.iter() {
            if schema.is_primary_key(name) {
                continue;
            }
            if self.origin.get(name) != Some(value) {
                changed.push((name.to_string(), value.clone()));
            }
        }
        if changed.is_empty() {
            return Ok(());
        }

        let mut params = Params::new().ident("::t", schema.name());
        let mut assignments = Vec::with_capacity(changed.len());
        for (i, (name, value)) in changed.into_iter().enumerate() {
            let column_type = schema.column_type(&name);
            params.push_ident(format!("::s{i}"), name.clone());
            params.push_bind(format!(":sv{i}"), encode_value(schema, &name, value));
            assignments.push(format!(
                "::s{i} = {}",
                write_expr(column_type, &format!(":sv{i}"))
            ));
        }

        let predicate = key_predicate(&self.table, &self.origin, &mut params)?;
        let sql = format!(
            "UPDATE ::t SET {} WHERE {}",
            assignments.join(", "),
            predicate
        );
        self.table.database().execute(&sql, &params)?;

        self.origin = self.current.clone();
        Ok(())
    }

    /// Set several fields, then save.
    pub fn update<I, K, V>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in fields {
            self.set(name, value);
        }
        self.save()
    }

    /// Delete the row, targeting by its origin primary key.
    pub fn delete(self) -> Result<()> {
        let schema = self.table.schema();
        let mut params = Params::new().ident("::t", schema.name());
        let predicate = key_predicate(&self.table, &self.origin, &mut params)?;
        let sql = format!("DELETE FROM ::t WHERE {}", predicate);
        self.table.database().execute(&sql, &params)?;
        Ok(())
    }

    /// Resolve a declared relation. Each call re-queries; nothing is
    /// cached on the row.
    pub fn related(&self, name: &str) -> Result<Related> {
        let schema = self.table.schema();
        let relation = schema
            .relation(name)
            .ok_or_else(|| Error::Custom(format!("Unknown relation: {name}")))?
            .clone();
        let related_table = self.table.sibling(&relation.table)?;

        match relation.kind {
            RelationKind::HasOne => {
                let fk = self.get(&relation.foreign_key);
                match fk {
                    None | Some(Value::Null) => Ok(Related::One(None)),
                    Some(value) => Ok(Related::One(related_table.find(value.clone())?)),
                }
            }
            RelationKind::HasMany => {
                let keys = schema.primary_key_columns();
                if keys.len() != 1 {
                    return Err(Error::Custom(format!(
                        "Relation '{name}' needs a single-column primary key"
                    )));
                }
                let value = self.get(&keys[0]).cloned().ok_or_else(|| {
                    Error::Custom(format!("Row is missing primary key column '{}'", keys[0]))
                })?;
                Ok(Related::Many(
                    related_table.all().search(SearchTerm::eq(
                        relation.foreign_key.clone(),
                        value,
                    )),
                ))
            }
        }
    }

    /// The current fields as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.current.to_json()
    }
}

/// Append primary-key equality parameters and return the WHERE fragment.
fn key_predicate(table: &Table, origin: &Record, params: &mut Params) -> Result<String> {
    let schema = table.schema();
    let mut parts = Vec::new();
    for (i, key) in schema.primary_key_columns().iter().enumerate() {
        let value = origin.get(key).cloned().ok_or_else(|| {
            Error::Custom(format!("Row is missing primary key column '{key}'"))
        })?;
        params.push_ident(format!("::k{i}"), key.clone());
        params.push_bind(format!(":kv{i}"), value);
        parts.push(format!("::k{i} = :kv{i}"));
    }
    if parts.is_empty() {
        return Err(Error::Custom(format!(
            "Table '{}' declares no primary key",
            schema.name()
        )));
    }
    Ok(parts.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ordering_and_replacement() {
        let mut record = Record::new().with("a", 1i64).with("b", "two");
        record.set("a", 3i64);

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Int(3)));
        assert_eq!(record.get_named::<String>("b").unwrap(), "two");
        assert!(record.get_named::<i64>("missing").is_err());
    }

    #[test]
    fn record_to_json() {
        let record = Record::new()
            .with("id", 7i64)
            .with("name", "Ada")
            .with("meta", serde_json::json!({"x": 1}));
        assert_eq!(
            record.to_json(),
            serde_json::json!({"id": 7, "name": "Ada", "meta": {"x": 1}})
        );
    }
}
