//! Dynamic paged queries over SQLite.
//!
//! A caller-supplied base query is wrapped in a count statement and a
//! windowed data statement that share a `WHERE` clause compiled from
//! declarative filters. The result carries the total row count, the typed
//! table for the current page and a page scroller for pagination controls.

pub mod config;
pub mod domain;
pub mod infra;
pub mod usecase;

pub use domain::entities::request::{
    Combinator, FilterDescriptor, LiteralKind, OrderSpec, PageWindow, ParameterKind,
    QueryRequest, TypedLiteral, TypedParameter,
};
pub use domain::entities::table::{
    CellValue, ColumnDescriptor, PageScrollEntry, PagedResult, ResultEnvelope, SemanticType,
};
pub use domain::error::ValidationError;
pub use infra::sqlite::executor::SqliteExecutor;
pub use usecase::ports::executor::{DatabaseError, EngineError, SqlExecutor};
pub use usecase::services::paged_query_service::{PagedQueryService, QueryPlan};
