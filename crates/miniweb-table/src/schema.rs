//! Table schema metadata.

use std::collections::HashMap;
use std::sync::Arc;

/// Declared column type.
///
/// This is the set of types the DDL generator understands; anything else
/// a table needs is created outside the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer key
    Serial,
    Integer,
    Boolean,
    Text,
    Varchar(u16),
    /// JSON document, stored as text and decoded on read
    Jsonb,
    /// Geometry in WKT, wrapped in ST_GeomFromText / ST_AsText
    Geometry,
}

/// One declared column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// A named index over one or more columns.
#[derive(Debug, Clone)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Direction of a declared relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// This row's foreign-key column points at the related table's
    /// primary key.
    HasOne,
    /// Rows of the related table carry a foreign key pointing back at
    /// this row's primary key.
    HasMany,
}

/// A named relation to another registered table.
#[derive(Debug, Clone)]
pub struct Relation {
    pub kind: RelationKind,
    pub table: String,
    pub foreign_key: String,
}

/// Static description of one table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    primary_keys: Vec<String>,
    columns: Vec<ColumnDef>,
    indexes: Vec<IndexDef>,
    relations: Vec<(String, Relation)>,
}

impl TableSchema {
    /// Start a schema for the named table with the default `id` primary key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_keys: vec!["id".to_string()],
            columns: Vec::new(),
            indexes: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Declare a column.
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            column_type,
        });
        self
    }

    /// Replace the primary key column list.
    pub fn primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a named index.
    pub fn index<I, S>(mut self, name: impl Into<String>, columns: I, unique: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
        });
        self
    }

    /// Declare a has-one relation: `foreign_key` on this table holds the
    /// related table's primary key.
    pub fn has_one(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push((
            name.into(),
            Relation {
                kind: RelationKind::HasOne,
                table: table.into(),
                foreign_key: foreign_key.into(),
            },
        ));
        self
    }

    /// Declare a has-many relation: `foreign_key` on the related table
    /// holds this table's primary key.
    pub fn has_many(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push((
            name.into(),
            Relation {
                kind: RelationKind::HasMany,
                table: table.into(),
                foreign_key: foreign_key.into(),
            },
        ));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    /// The declared type of a column, if any.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.column_type)
    }

    /// Is this column part of the primary key?
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|k| k == name)
    }

    /// Look up a declared relation by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }
}

/// Explicit name-to-schema map owned by the ORM context.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, Arc<TableSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its own table name.
    pub fn register(&mut self, schema: TableSchema) {
        self.tables.insert(schema.name.clone(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}
