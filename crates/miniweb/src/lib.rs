//! miniweb - a minimal MVC web framework.
//!
//! Requests route to controllers by path convention, controllers run
//! against a per-request context (view variables, signed-cookie session,
//! ORM handle), and views render by simple template substitution. The
//! table layer builds deferred queries over schema metadata and hydrates
//! rows that know how to save their own changes.
//!
//! # Quick Start
//!
//! ```ignore
//! use miniweb::prelude::*;
//!
//! struct Blog;
//!
//! impl Controller for Blog {
//!     fn call(&mut self, action: &str, ctx: &mut Context, params: &[String]) -> Result<Outcome> {
//!         match action {
//!             "index" => {
//!                 let posts = ctx.orm.table("posts")?.all().order("id", Order::Desc);
//!                 let titles: Vec<_> = posts
//!                     .to_vec()?
//!                     .iter()
//!                     .map(miniweb::TableRow::to_json)
//!                     .collect();
//!                 ctx.view.set("posts", titles);
//!                 Ok(Outcome::Rendered)
//!             }
//!             "show" => {
//!                 let id: i64 = params
//!                     .first()
//!                     .and_then(|p| p.parse().ok())
//!                     .ok_or_else(|| Error::not_found("Missing post id"))?;
//!                 let post = ctx
//!                     .orm
//!                     .table("posts")?
//!                     .find(id)?
//!                     .ok_or_else(|| Error::not_found("No such post"))?;
//!                 ctx.json(&post.to_json())
//!             }
//!             other => Err(Error::not_found(format!("Action not found: {other}"))),
//!         }
//!     }
//! }
//!
//! fn build_app() -> Result<App> {
//!     let config = AppConfig::from_env();
//!     let mut registry = SchemaRegistry::new();
//!     registry.register(
//!         TableSchema::new("posts")
//!             .column("id", ColumnType::Serial)
//!             .column("title", ColumnType::Text),
//!     );
//!     let db = Database::from_config(&config)?;
//!     let orm = Orm::new(db, registry);
//!     Ok(App::new(config, orm).controller("blog", || Box::new(Blog)))
//! }
//! ```

pub use miniweb_core::{
    AppConfig, ColumnInfo, ConfigError, Connection, ConnectionError, ConnectionErrorKind, Dialect,
    Error, FromValue, NotFoundError, Params, QueryError, QueryErrorKind, Result, Row,
    TemplateError, TypeError, Value,
};

pub use miniweb_db::{Database, DbUrl};

pub use miniweb_sqlite::{OpenFlags, SqliteConfig, SqliteConnection};

pub use miniweb_table::{
    BulkInserter, ColumnDef, ColumnType, IndexDef, Order, Orm, Record, Related, Relation,
    RelationKind, Rowset, RowsetIter, SchemaRegistry, SearchTerm, Table, TableRow, TableSchema,
};

pub use miniweb_session::{SESSION_COOKIE, Session, SessionConfig};

pub use miniweb_http::{
    App, Context, Controller, Outcome, Request, Response, Route, View, route,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use miniweb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        App,
        AppConfig,
        ColumnType,
        Context,
        Controller,
        Database,
        Error,
        Order,
        Orm,
        Outcome,
        Record,
        Related,
        Request,
        Response,
        Result,
        Route,
        Rowset,
        SchemaRegistry,
        SearchTerm,
        Session,
        Table,
        TableRow,
        TableSchema,
        Value,
        View,
        route,
    };
}
