//! Buffered multi-row inserts.

use crate::encode::{encode_value, write_expr};
use crate::row::Record;
use crate::schema::SchemaRegistry;
use miniweb_core::{Error, Params, Result};
use miniweb_db::Database;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Rows buffered per table before an automatic flush.
pub const BULK_THRESHOLD: usize = 1000;

/// Request-scoped buffer that turns many queued records into few
/// multi-row INSERT statements.
///
/// Records queue per table; reaching the threshold flushes that table.
/// Anything still buffered must be drained with `flush` before the
/// buffer is dropped, or it is lost.
pub struct BulkInserter {
    db: Database,
    registry: Arc<SchemaRegistry>,
    threshold: usize,
    buffers: Mutex<HashMap<String, Vec<Record>>>,
}

impl BulkInserter {
    pub fn new(db: Database, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            db,
            registry,
            threshold: BULK_THRESHOLD,
            buffers: Mutex::new(HashMap::new()),
        }
    }

    /// Override the flush threshold.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    /// Queue one record; flushes the table when the threshold is reached.
    pub fn queue(&self, table: &str, record: Record) -> Result<()> {
        if !self.registry.contains(table) {
            return Err(Error::Custom(format!("Unknown table: {table}")));
        }

        let drained = {
            let mut buffers = self.buffers.lock().unwrap();
            let buffer = buffers.entry(table.to_string()).or_default();
            buffer.push(record);
            if buffer.len() >= self.threshold {
                buffers.remove(table)
            } else {
                None
            }
        };

        match drained {
            Some(records) => self.insert_batch(table, records),
            None => Ok(()),
        }
    }

    /// Number of records currently buffered for a table.
    pub fn pending(&self, table: &str) -> usize {
        self.buffers
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, Vec::len)
    }

    /// Force-drain one table's buffer.
    pub fn flush_table(&self, table: &str) -> Result<()> {
        let drained = self.buffers.lock().unwrap().remove(table);
        match drained {
            Some(records) if !records.is_empty() => self.insert_batch(table, records),
            _ => Ok(()),
        }
    }

    /// Force-drain every buffered table.
    pub fn flush(&self) -> Result<()> {
        let drained: Vec<(String, Vec<Record>)> =
            self.buffers.lock().unwrap().drain().collect();
        for (table, records) in drained {
            if !records.is_empty() {
                self.insert_batch(&table, records)?;
            }
        }
        Ok(())
    }

    fn insert_batch(&self, table: &str, records: Vec<Record>) -> Result<()> {
        let schema = self
            .registry
            .get(table)
            .ok_or_else(|| Error::Custom(format!("Unknown table: {table}")))?;

        let columns: Vec<String> = records[0].keys().map(str::to_string).collect();
        for record in &records[1..] {
            let keys: Vec<&str> = record.keys().collect();
            if keys != columns.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(Error::Custom(format!(
                    "Bulk-queued records for '{table}' must share the same columns"
                )));
            }
        }

        let mut params = Params::new().ident("::t", table);
        let mut column_list = Vec::with_capacity(columns.len());
        for (ci, column) in columns.iter().enumerate() {
            params.push_ident(format!("::i{ci}"), column.clone());
            column_list.push(format!("::i{ci}"));
        }

        let mut tuples = Vec::with_capacity(records.len());
        for (ri, record) in records.iter().enumerate() {
            let mut exprs = Vec::with_capacity(columns.len());
            for (ci, column) in columns.iter().enumerate() {
                let value = record.get(column).cloned().unwrap_or(miniweb_core::Value::Null);
                params.push_bind(
                    format!(":v{ri}_{ci}"),
                    encode_value(&schema, column, value),
                );
                exprs.push(write_expr(
                    schema.column_type(column),
                    &format!(":v{ri}_{ci}"),
                ));
            }
            tuples.push(format!("({})", exprs.join(", ")));
        }

        let sql = format!(
            "INSERT INTO ::t ({}) VALUES {}",
            column_list.join(", "),
            tuples.join(", ")
        );
        let count = records.len();
        self.db.execute(&sql, &params)?;
        tracing::debug!(target: "miniweb::table", table, rows = count, "bulk insert flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, TableSchema};
    use crate::table::Orm;
    use miniweb_core::Params;

    fn setup() -> (Database, Arc<SchemaRegistry>) {
        let mut registry = SchemaRegistry::new();
        registry.register(
            TableSchema::new("events")
                .column("id", ColumnType::Serial)
                .column("kind", ColumnType::Text)
                .index("events_kind_key", ["kind"], true),
        );
        let registry = Arc::new(registry);

        let db = Database::new("sqlite::memory:", false).unwrap();
        let orm = Orm::new(db.clone(), (*registry).clone());
        let table = orm.table("events").unwrap();
        table.create_table().unwrap();
        table.create_indexes().unwrap();
        (db, registry)
    }

    fn count(db: &Database) -> i64 {
        db.query("SELECT COUNT(*) AS n FROM events", &Params::new())
            .unwrap()[0]
            .get_named::<i64>("n")
            .unwrap()
    }

    #[test]
    fn flushes_at_threshold() {
        let (db, registry) = setup();
        let bulk = BulkInserter::new(db.clone(), registry).with_threshold(3);

        bulk.queue("events", Record::new().with("kind", "a")).unwrap();
        bulk.queue("events", Record::new().with("kind", "b")).unwrap();
        assert_eq!(bulk.pending("events"), 2);
        assert_eq!(count(&db), 0);

        bulk.queue("events", Record::new().with("kind", "c")).unwrap();
        assert_eq!(bulk.pending("events"), 0);
        assert_eq!(count(&db), 3);
    }

    #[test]
    fn manual_flush_drains_everything() {
        let (db, registry) = setup();
        let bulk = BulkInserter::new(db.clone(), registry);

        bulk.queue("events", Record::new().with("kind", "a")).unwrap();
        bulk.queue("events", Record::new().with("kind", "b")).unwrap();
        assert_eq!(count(&db), 0);

        bulk.flush().unwrap();
        assert_eq!(count(&db), 2);
        assert_eq!(bulk.pending("events"), 0);

        // Flushing an empty buffer is a no-op.
        bulk.flush().unwrap();
        bulk.flush_table("events").unwrap();
    }

    #[test]
    fn duplicates_surface_with_the_duplicate_kind() {
        let (db, registry) = setup();
        let bulk = BulkInserter::new(db, registry);

        bulk.queue("events", Record::new().with("kind", "same")).unwrap();
        bulk.queue("events", Record::new().with("kind", "same")).unwrap();

        let err = bulk.flush().unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn mismatched_columns_rejected() {
        let (db, registry) = setup();
        let bulk = BulkInserter::new(db, registry);

        bulk.queue("events", Record::new().with("kind", "a")).unwrap();
        bulk.queue("events", Record::new().with("kind", "b").with("id", 9i64))
            .unwrap();

        assert!(bulk.flush().is_err());
    }

    #[test]
    fn unknown_table_rejected() {
        let (db, registry) = setup();
        let bulk = BulkInserter::new(db, registry);
        assert!(bulk.queue("ghosts", Record::new().with("x", 1i64)).is_err());
    }
}
