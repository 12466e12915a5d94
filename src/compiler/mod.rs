//! The compiler driver: walks a normalised `Query` tree, collecting each `SELECT` block's
//! clauses in canonical order and materialising derived tables where the normaliser's rules
//! require it.
//!
//! Grounded on the teacher's `sql::pq::gen_query`/`sql::gen_query` (assembling one `SELECT`
//! from a collected pipeline) and the clause-collection FSM described in SPEC_FULL.md §4.6.

mod clauses;

use indexmap::IndexMap;

use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::ir::query::{Query, Shape};
use crate::ir::stmt::{Delete, Insert, Update};
use crate::value::BoundParam;

pub use clauses::{collect, Base, Collected, FromSource};

/// Result of a successful `to_sql` call: the SQL text and the parameter values it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub params: IndexMap<String, BoundParam>,
}

/// Entry points for compiling a tree to dialect-specific SQL.
pub trait Compile {
    fn to_sql(&self, dialect: Dialect) -> Result<Compiled>;

    fn to_sql_server(&self) -> Result<Compiled> {
        self.to_sql(Dialect::SqlServer)
    }
    fn to_sqlite(&self) -> Result<Compiled> {
        self.to_sql(Dialect::Sqlite)
    }
    fn to_postgres(&self) -> Result<Compiled> {
        self.to_sql(Dialect::Postgres)
    }
}

impl Compile for Query {
    fn to_sql(&self, dialect: Dialect) -> Result<Compiled> {
        let mut ctx = Context::new(dialect);
        let normalised = crate::normalize::normalize(self.clone());
        let (sql, _shape) = compile_query_at(normalised, &mut ctx, 0, "query")?;
        Ok(Compiled {
            sql,
            params: ctx.into_params(),
        })
    }
}

impl Compile for crate::ir::query::ScalarQuery {
    fn to_sql(&self, dialect: Dialect) -> Result<Compiled> {
        self.0.to_sql(dialect)
    }
}

impl Compile for Insert {
    fn to_sql(&self, dialect: Dialect) -> Result<Compiled> {
        let mut ctx = Context::new(dialect);
        let sql = crate::gen_stmt::compile_insert(self, &mut ctx)?;
        Ok(Compiled {
            sql,
            params: ctx.into_params(),
        })
    }
}

impl Compile for Update {
    fn to_sql(&self, dialect: Dialect) -> Result<Compiled> {
        let mut ctx = Context::new(dialect);
        let sql = crate::gen_stmt::compile_update(self, &mut ctx)?;
        Ok(Compiled {
            sql,
            params: ctx.into_params(),
        })
    }
}

impl Compile for Delete {
    fn to_sql(&self, dialect: Dialect) -> Result<Compiled> {
        let mut ctx = Context::new(dialect);
        let sql = crate::gen_stmt::compile_delete(self, &mut ctx)?;
        Ok(Compiled {
            sql,
            params: ctx.into_params(),
        })
    }
}

/// Compiles one `SELECT` block (and everything materialised beneath it) at the given
/// indentation depth, returning its SQL text and output shape.
pub(crate) fn compile_query_at(
    query: Query,
    ctx: &mut Context,
    depth: usize,
    path: &str,
) -> Result<(String, Shape)> {
    let shape = query.shape()?;
    let collected = collect(query, path)?;
    let sql = crate::gen_query::render(collected, ctx, depth, path)?;
    Ok((sql, shape))
}

/// Compiles `query` as a nested, unindented expression (used for `InSubquery` and scalar
/// subquery expressions, which are embedded inline inside a single expression rather than
/// starting their own indentation block).
pub(crate) fn compile_query_nested(
    query: &Query,
    ctx: &mut Context,
    path: &str,
) -> Result<(String, Shape)> {
    compile_query_at(query.clone(), ctx, 0, path)
}
