//! A typed relational query IR compiled to dialect-specific SQL text plus a parameter bag.
//!
//! A caller builds a [`ir::Query`] bottom-up from [`ir::TableMeta`] implementations and
//! [`ir::ScalarExpr`] expressions, then calls [`Compile::to_sql`] (or one of its
//! dialect-specific convenience wrappers) to get back [`Compiled`] SQL text and an
//! insertion-ordered map of bound parameters. Nothing in this crate executes a query; it only
//! ever compiles a tree into text.
//!
//! Grounded on the teacher's own split between a relational IR (`ir::rq`), a compiler driver
//! (`sql::gen_query`/`sql::pq`) and a SQL-dialect layer (`sql::dialect`) — the same shape,
//! specialised to a fixed, closed clause set rather than an open pipeline of transforms.

mod compiler;
mod context;
mod dialect;
mod error;
mod gen_expr;
mod gen_query;
mod gen_stmt;
pub mod ir;
mod normalize;
mod utils;
mod value;

pub use compiler::{Compile, Compiled};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use ir::{
    stmt::{Delete, Insert, Update},
    ExprKind, Kind, OrderKey, Query, QueryKind, ScalarExpr, ScalarQuery, SetOp, Shape,
    ShapeField, TableMeta, TupleField,
};
pub use ir::expr::{AggKind, BinOp, DateFunc, MathFunc, StringFunc, UnOp};
pub use ir::query::{JoinEdge, JoinKind, OrderDir, QueryHandle, TableHandle};
pub use value::{BoundParam, Value};
