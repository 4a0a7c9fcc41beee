//! Deferred, immutable query builder over one table.

use crate::encode::{decode_value, encode_value, select_expr};
use crate::row::{Record, TableRow};
use crate::table::Table;
use miniweb_core::error::{QueryError, QueryErrorKind};
use miniweb_core::{Error, Params, Result, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// One WHERE fragment. Chained terms AND together.
#[derive(Debug, Clone)]
pub enum SearchTerm {
    /// Matches every row.
    All,
    /// A raw SQL fragment. Explicit opt-in; never built from data.
    Raw(String),
    /// Column equality.
    Eq(String, Value),
    /// Column IN list. An empty list matches nothing.
    In(String, Vec<Value>),
}

impl SearchTerm {
    pub fn all() -> Self {
        SearchTerm::All
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        SearchTerm::Raw(sql.into())
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        SearchTerm::Eq(column.into(), value.into())
    }

    pub fn any<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        SearchTerm::In(column.into(), values.into_iter().map(Into::into).collect())
    }
}

/// A deferred query over one table.
///
/// Every modifier returns a new independent copy; nothing mutates a
/// shared query, so handing a rowset around and refining it in two
/// places never crosses wires. No SQL runs until the rowset is consumed
/// through `count`, `first`, `to_vec`, or `iter`.
#[derive(Clone)]
pub struct Rowset {
    table: Table,
    terms: Vec<SearchTerm>,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Rowset {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            terms: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Add a search term, ANDed with any existing terms.
    pub fn search(&self, term: SearchTerm) -> Self {
        let mut copy = self.clone();
        copy.terms.push(term);
        copy
    }

    /// Add a sort column.
    pub fn order(&self, column: impl Into<String>, direction: Order) -> Self {
        let mut copy = self.clone();
        copy.order.push((column.into(), direction));
        copy
    }

    pub fn limit(&self, n: u64) -> Self {
        let mut copy = self.clone();
        copy.limit = Some(n);
        copy
    }

    pub fn offset(&self, n: u64) -> Self {
        let mut copy = self.clone();
        copy.offset = Some(n);
        copy
    }

    /// Build the single SELECT this rowset stands for.
    fn build(&self, count: bool) -> (String, Params) {
        let schema = self.table.schema();
        let mut params = Params::new().ident("::t", schema.name());

        let select_list = if count {
            "COUNT(*)".to_string()
        } else if schema.columns().is_empty() {
            "*".to_string()
        } else {
            let mut exprs = Vec::with_capacity(schema.columns().len());
            for (i, col) in schema.columns().iter().enumerate() {
                params.push_ident(format!("::c{i}"), col.name.clone());
                params.push_ident(format!("::a{i}"), col.name.clone());
                exprs.push(select_expr(
                    Some(col.column_type),
                    &format!("::c{i}"),
                    &format!("::a{i}"),
                ));
            }
            exprs.join(", ")
        };

        let mut sql = format!("SELECT {} FROM ::t", select_list);

        if !self.terms.is_empty() {
            let mut fragments = Vec::with_capacity(self.terms.len());
            for (ti, term) in self.terms.iter().enumerate() {
                match term {
                    SearchTerm::All => fragments.push("1".to_string()),
                    SearchTerm::Raw(raw) => fragments.push(format!("({raw})")),
                    SearchTerm::Eq(column, value) => {
                        params.push_ident(format!("::w{ti}"), column.clone());
                        params.push_bind(
                            format!(":w{ti}"),
                            encode_value(schema, column, value.clone()),
                        );
                        fragments.push(format!("::w{ti} = :w{ti}"));
                    }
                    SearchTerm::In(column, values) => {
                        if values.is_empty() {
                            // An empty list matches nothing; never render
                            // an empty IN () and never drop the filter.
                            fragments.push("1 = 0".to_string());
                            continue;
                        }
                        params.push_ident(format!("::w{ti}"), column.clone());
                        let mut placeholders = Vec::with_capacity(values.len());
                        for (vi, value) in values.iter().enumerate() {
                            params.push_bind(
                                format!(":w{ti}_{vi}"),
                                encode_value(schema, column, value.clone()),
                            );
                            placeholders.push(format!(":w{ti}_{vi}"));
                        }
                        fragments.push(format!("::w{ti} IN ({})", placeholders.join(", ")));
                    }
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&fragments.join(" AND "));
        }

        if !self.order.is_empty() {
            let mut parts = Vec::with_capacity(self.order.len());
            for (oi, (column, direction)) in self.order.iter().enumerate() {
                params.push_ident(format!("::o{oi}"), column.clone());
                let dir = match direction {
                    Order::Asc => "ASC",
                    Order::Desc => "DESC",
                };
                parts.push(format!("::o{oi} {dir}"));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params)
    }

    fn fetch(&self) -> Result<Vec<TableRow>> {
        let (sql, params) = self.build(false);
        let rows = self.table.database().query(&sql, &params)?;
        let schema = self.table.schema();

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let record: Record = row
                .iter()
                .map(|(name, value)| {
                    (name.to_string(), decode_value(schema, name, value.clone()))
                })
                .collect();
            out.push(TableRow::hydrated(self.table.clone(), record));
        }
        Ok(out)
    }

    /// Number of matching rows, as one `SELECT COUNT(*)`.
    pub fn count(&self) -> Result<u64> {
        let (sql, params) = self.build(true);
        let rows = self.table.database().query(&sql, &params)?;
        let count = rows
            .first()
            .and_then(|row| row.get(0))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    /// The first matching row, if any.
    pub fn first(&self) -> Result<Option<TableRow>> {
        Ok(self.limit(1).fetch()?.pop())
    }

    /// Fetch all matching rows.
    pub fn to_vec(&self) -> Result<Vec<TableRow>> {
        self.fetch()
    }

    /// Fetch and return a forward-only iterator over the rows.
    pub fn iter(&self) -> Result<RowsetIter> {
        Ok(RowsetIter {
            rows: self.fetch()?.into_iter(),
        })
    }
}

/// Forward-only cursor over a fetched rowset.
pub struct RowsetIter {
    rows: std::vec::IntoIter<TableRow>,
}

impl RowsetIter {
    /// Random access is not part of the cursor contract.
    pub fn seek(&mut self, _position: usize) -> Result<()> {
        Err(Error::Query(QueryError::new(
            QueryErrorKind::Unsupported,
            "Rowset cursors are forward-only; seek is not supported",
        )))
    }
}

impl Iterator for RowsetIter {
    type Item = TableRow;

    fn next(&mut self) -> Option<TableRow> {
        self.rows.next()
    }
}
