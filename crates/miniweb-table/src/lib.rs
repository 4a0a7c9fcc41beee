//! Table abstraction for miniweb.
//!
//! Tables are described by [`TableSchema`] metadata registered in a
//! [`SchemaRegistry`]; the [`Orm`] context hands out [`Table`] handles
//! whose searches build a deferred [`Rowset`]. Fetched records become
//! [`TableRow`]s that track their origin values, so `save()` writes only
//! what changed and writes nothing when nothing did.

pub mod bulk;
pub mod encode;
pub mod row;
pub mod rowset;
pub mod schema;
pub mod table;

pub use bulk::BulkInserter;
pub use row::{Record, Related, TableRow};
pub use rowset::{Order, Rowset, RowsetIter, SearchTerm};
pub use schema::{
    ColumnDef, ColumnType, IndexDef, Relation, RelationKind, SchemaRegistry, TableSchema,
};
pub use table::{Orm, Table};
