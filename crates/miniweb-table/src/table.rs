//! The ORM context and table handles.

use crate::bulk::BulkInserter;
use crate::encode::{encode_value, write_expr};
use crate::row::{Record, TableRow};
use crate::rowset::{Rowset, SearchTerm};
use crate::schema::{ColumnType, SchemaRegistry, TableSchema};
use miniweb_core::{Dialect, Error, Params, Result, Value};
use miniweb_db::Database;
use std::sync::Arc;

/// The ORM context: database handle, schema registry, bulk-insert buffer.
///
/// One context per request; nothing here is process-global.
pub struct Orm {
    db: Database,
    registry: Arc<SchemaRegistry>,
    bulk: BulkInserter,
}

impl Orm {
    pub fn new(db: Database, registry: SchemaRegistry) -> Self {
        let registry = Arc::new(registry);
        let bulk = BulkInserter::new(db.clone(), Arc::clone(&registry));
        Self { db, registry, bulk }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Hand out a handle for a registered table.
    pub fn table(&self, name: &str) -> Result<Table> {
        let schema = self
            .registry
            .get(name)
            .ok_or_else(|| Error::Custom(format!("Unknown table: {name}")))?;
        Ok(Table {
            db: self.db.clone(),
            registry: Arc::clone(&self.registry),
            schema,
        })
    }

    /// The request-scoped bulk inserter.
    pub fn bulk(&self) -> &BulkInserter {
        &self.bulk
    }
}

/// A handle on one registered table. Cheap to clone.
#[derive(Clone)]
pub struct Table {
    db: Database,
    registry: Arc<SchemaRegistry>,
    schema: Arc<TableSchema>,
}

impl Table {
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    /// A handle on another registered table, for relation resolution.
    pub(crate) fn sibling(&self, name: &str) -> Result<Table> {
        let schema = self
            .registry
            .get(name)
            .ok_or_else(|| Error::Custom(format!("Unknown table: {name}")))?;
        Ok(Table {
            db: self.db.clone(),
            registry: Arc::clone(&self.registry),
            schema,
        })
    }

    /// A rowset over the whole table.
    pub fn all(&self) -> Rowset {
        Rowset::new(self.clone())
    }

    /// Start a deferred query with one search term.
    pub fn search(&self, term: SearchTerm) -> Rowset {
        self.all().search(term)
    }

    /// Primary-key lookup for a single-column key.
    pub fn find(&self, id: impl Into<Value>) -> Result<Option<TableRow>> {
        self.find_keys(&[id.into()])
    }

    /// Primary-key lookup; `keys` must match the declared key arity.
    pub fn find_keys(&self, keys: &[Value]) -> Result<Option<TableRow>> {
        let declared = self.schema.primary_key_columns();
        if keys.len() != declared.len() {
            return Err(Error::Custom(format!(
                "Table '{}' has {} primary key column(s), got {} value(s)",
                self.schema.name(),
                declared.len(),
                keys.len()
            )));
        }

        let mut rowset = self.all();
        for (column, value) in declared.iter().zip(keys) {
            rowset = rowset.search(SearchTerm::eq(column.clone(), value.clone()));
        }
        rowset.first()
    }

    /// Insert one record and return the row as stored.
    ///
    /// The inserted row is re-read by primary key: from the record when
    /// it supplies every key column, otherwise from the driver's
    /// last-insert id for a single-column key.
    pub fn insert(&self, record: Record) -> Result<TableRow> {
        if record.is_empty() {
            return Err(Error::Custom(format!(
                "Cannot insert an empty record into '{}'",
                self.schema.name()
            )));
        }

        let mut params = Params::new().ident("::t", self.schema.name());
        let mut columns = Vec::with_capacity(record.len());
        let mut exprs = Vec::with_capacity(record.len());
        for (i, (name, value)) in record.iter().enumerate() {
            let column_type = self.schema.column_type(name);
            params.push_ident(format!("::i{i}"), name.to_string());
            params.push_bind(
                format!(":v{i}"),
                encode_value(&self.schema, name, value.clone()),
            );
            columns.push(format!("::i{i}"));
            exprs.push(write_expr(column_type, &format!(":v{i}")));
        }

        let sql = format!(
            "INSERT INTO ::t ({}) VALUES ({})",
            columns.join(", "),
            exprs.join(", ")
        );
        let insert_id = self.db.insert(&sql, &params)?;

        let declared = self.schema.primary_key_columns();
        let keys: Vec<Value> = if declared.iter().all(|k| record.contains(k)) {
            declared
                .iter()
                .map(|k| record.get(k).cloned().unwrap_or(Value::Null))
                .collect()
        } else if declared.len() == 1 {
            vec![Value::Int(insert_id)]
        } else {
            return Err(Error::Custom(format!(
                "Cannot determine the primary key of the row inserted into '{}'",
                self.schema.name()
            )));
        };

        self.find_keys(&keys)?.ok_or_else(|| {
            Error::Custom(format!(
                "Inserted row could not be re-read from '{}'",
                self.schema.name()
            ))
        })
    }

    /// Create the table from its schema metadata.
    pub fn create_table(&self) -> Result<()> {
        let dialect = self.db.dialect()?;
        let keys = self.schema.primary_key_columns();
        let inline_serial_key = dialect == Dialect::Sqlite
            && keys.len() == 1
            && self.schema.column_type(&keys[0]) == Some(ColumnType::Serial);

        let mut defs = Vec::with_capacity(self.schema.columns().len() + 1);
        for col in self.schema.columns() {
            let mut def = format!(
                "{} {}",
                dialect.quote_ident(&col.name),
                column_sql(col.column_type, dialect)
            );
            if inline_serial_key && col.name == keys[0] {
                // SQLite's rowid alias is its auto-increment form.
                def.push_str(" PRIMARY KEY");
            }
            defs.push(def);
        }
        if !inline_serial_key && !keys.is_empty() {
            let quoted: Vec<String> = keys.iter().map(|k| dialect.quote_ident(k)).collect();
            defs.push(format!("PRIMARY KEY ({})", quoted.join(", ")));
        }

        let sql = format!(
            "CREATE TABLE {} ({})",
            dialect.quote_ident(self.schema.name()),
            defs.join(", ")
        );
        self.db.execute(&sql, &Params::new())?;
        Ok(())
    }

    /// Create the declared indexes.
    pub fn create_indexes(&self) -> Result<()> {
        let dialect = self.db.dialect()?;
        for index in self.schema.indexes() {
            let columns: Vec<String> = index
                .columns
                .iter()
                .map(|c| dialect.quote_ident(c))
                .collect();
            let unique = if index.unique { "UNIQUE " } else { "" };
            let sql = format!(
                "CREATE {}INDEX {} ON {} ({})",
                unique,
                dialect.quote_ident(&index.name),
                dialect.quote_ident(self.schema.name()),
                columns.join(", ")
            );
            self.db.execute(&sql, &Params::new())?;
        }
        Ok(())
    }
}

fn column_sql(column_type: ColumnType, dialect: Dialect) -> String {
    match column_type {
        ColumnType::Serial => match dialect {
            Dialect::Postgres => "SERIAL".to_string(),
            Dialect::Mysql => "INT NOT NULL AUTO_INCREMENT".to_string(),
            Dialect::Sqlite => "INTEGER".to_string(),
        },
        ColumnType::Integer => "INT".to_string(),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::Varchar(n) => format!("VARCHAR({n})"),
        ColumnType::Jsonb => match dialect {
            Dialect::Postgres => "JSONB".to_string(),
            _ => "TEXT".to_string(),
        },
        ColumnType::Geometry => "GEOMETRY".to_string(),
    }
}
