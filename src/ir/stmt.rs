//! DML statement IR: the teacher's relational-query IR only ever produces `SELECT`s, so
//! these three node types are this crate's own extension, built the same way (small,
//! strongly-typed, immutable, built bottom-up) and reusing the same `Context`/dialect
//! plumbing as queries.

use crate::ir::expr::ScalarExpr;
use crate::ir::ids::TableOccurrenceId;
use crate::ir::query::{Query, TableHandle};
use crate::ir::table::TableMeta;
use crate::ir::Kind;

#[derive(Debug, Clone)]
pub struct Insert {
    pub table_name: String,
    pub columns: Vec<(String, Kind)>,
    pub values: Vec<ScalarExpr>,
}

impl Insert {
    pub fn new<T: TableMeta>(meta: &T) -> Self {
        Insert {
            table_name: meta.table_name().to_string(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: &'static str, kind: Kind, value: ScalarExpr) -> Self {
        self.columns.push((column.to_string(), kind));
        self.values.push(value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Update {
    pub table_name: String,
    pub occurrence: TableOccurrenceId,
    pub assignments: Vec<(String, ScalarExpr)>,
    pub predicate: Option<ScalarExpr>,
}

impl Update {
    /// Returns the statement alongside a [`TableHandle`] that predicate/assignment
    /// expressions should be built against, the same way a `FromTable` query node's handle
    /// is used — an `Update`/`Delete` statement has exactly one (unaliased) table in scope.
    pub fn new<T: TableMeta>(meta: &T) -> (Self, TableHandle) {
        let (from, handle) = Query::from_table(meta);
        let table_name = match from.kind {
            crate::ir::query::QueryKind::FromTable(t) => t.table_name,
            _ => unreachable!(),
        };
        (
            Update {
                table_name,
                occurrence: handle.occurrence(),
                assignments: Vec::new(),
                predicate: None,
            },
            handle,
        )
    }

    pub fn set(mut self, column: &'static str, value: ScalarExpr) -> Self {
        self.assignments.push((column.to_string(), value));
        self
    }

    pub fn where_(mut self, predicate: ScalarExpr) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Delete {
    pub table_name: String,
    pub occurrence: TableOccurrenceId,
    pub predicate: Option<ScalarExpr>,
}

impl Delete {
    pub fn new<T: TableMeta>(meta: &T) -> (Self, TableHandle) {
        let (from, handle) = Query::from_table(meta);
        let table_name = match from.kind {
            crate::ir::query::QueryKind::FromTable(t) => t.table_name,
            _ => unreachable!(),
        };
        (
            Delete {
                table_name,
                occurrence: handle.occurrence(),
                predicate: None,
            },
            handle,
        )
    }

    pub fn where_(mut self, predicate: ScalarExpr) -> Self {
        self.predicate = Some(predicate);
        self
    }
}
