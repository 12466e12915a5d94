//! Query IR: the clause tree built bottom-up from a table or a previously-built query.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ir::expr::{AliasRef, ColumnRef, ScalarExpr};
use crate::ir::ids::{QueryOccurrenceId, TableOccurrenceId};
use crate::ir::table::TableMeta;
use crate::ir::Kind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub kind: QueryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryKind {
    FromTable(FromTable),
    Where(Box<Query>, ScalarExpr),
    Select(Box<Query>, Vec<TupleField>),
    OrderBy(Box<Query>, Vec<OrderKey>),
    GroupBy(Box<Query>, Vec<ScalarExpr>),
    Having(Box<Query>, ScalarExpr),
    Join {
        kind: JoinKind,
        outer: Box<Query>,
        inner: FromTable,
        on: ScalarExpr,
    },
    /// An N-ary left-deep join chain. Never constructed directly by callers: the compiler
    /// driver fuses adjacent `Join` nodes into flat edges while descending the tree (see
    /// `crate::compiler::clauses::resolve_join_base`); this variant exists so the rest of the
    /// pipeline (`Shape`, passthrough-mapping, clause collection) has one flat shape to match
    /// on alongside a single `Join`.
    JoinChain {
        base: Box<Query>,
        edges: Vec<JoinEdge>,
    },
    Distinct(Box<Query>),
    Limit(Box<Query>, u64, Option<u64>),
    SetOp(SetOp, Box<Query>, Box<Query>),
    /// An explicit materialisation boundary: `source` is compiled as its own nested `SELECT`,
    /// given a fresh alias, and this node's occurrence id is what the `QueryHandle` returned
    /// alongside it refers to.
    Subquery(QueryOccurrenceId, Box<Query>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromTable {
    pub occurrence: TableOccurrenceId,
    pub table_name: String,
    pub columns: Vec<(String, Kind)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEdge {
    pub kind: JoinKind,
    pub table: FromTable,
    pub on: ScalarExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TupleField {
    pub name: Option<String>,
    pub expr: ScalarExpr,
}

impl TupleField {
    pub fn named(name: impl Into<String>, expr: ScalarExpr) -> Self {
        TupleField {
            name: Some(name.into()),
            expr,
        }
    }
    pub fn unnamed(expr: ScalarExpr) -> Self {
        TupleField { name: None, expr }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderKey {
    pub expr: ScalarExpr,
    pub dir: OrderDir,
}

/// A named, kinded field of a query's output row. Computed on demand from the tree rather
/// than cached on each node, since nodes are immutable and cheap to walk and a cached copy
/// would just be one more place for the real and cached shape to drift apart.
#[derive(Debug, Clone)]
pub struct ShapeField {
    pub name: Option<String>,
    pub kind: Kind,
}

#[derive(Debug, Clone)]
pub struct Shape(pub Vec<ShapeField>);

impl Shape {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f.name.as_deref() == Some(name))
    }
}

/// The [S4.2 projection-alias policy](crate): for every [`TupleField`], the name it is given
/// in the output row — the field's own explicit name if any, else (if the expression is a
/// bare column reference) that column's name, else a synthetic `Proj<N>` counting only the
/// unnamed, non-bare-column slots seen so far, left to right.
pub fn effective_names(fields: &[TupleField]) -> Vec<String> {
    let mut synthetic = 0usize;
    fields
        .iter()
        .map(|f| {
            if let Some(name) = &f.name {
                name.clone()
            } else if let crate::ir::expr::ExprKind::Column(c) = &f.expr.kind {
                c.name.clone()
            } else {
                let name = format!("Proj{}", synthetic);
                synthetic += 1;
                name
            }
        })
        .collect()
}

impl Query {
    pub fn from_table<T: TableMeta>(meta: &T) -> (Query, TableHandle) {
        let occurrence = TableOccurrenceId::fresh();
        let columns: Vec<(String, Kind)> = meta
            .columns()
            .iter()
            .map(|(n, k)| (n.to_string(), *k))
            .collect();
        let table = FromTable {
            occurrence,
            table_name: meta.table_name().to_string(),
            columns,
        };
        let handle = TableHandle {
            occurrence,
            table_name: table.table_name.clone(),
        };
        (
            Query {
                kind: QueryKind::FromTable(table),
            },
            handle,
        )
    }

    pub fn where_(source: Query, predicate: ScalarExpr) -> Query {
        Query {
            kind: QueryKind::Where(Box::new(source), predicate),
        }
    }

    pub fn select(source: Query, projections: Vec<TupleField>) -> Query {
        Query {
            kind: QueryKind::Select(Box::new(source), projections),
        }
    }

    pub fn order_by(source: Query, keys: Vec<OrderKey>) -> Query {
        Query {
            kind: QueryKind::OrderBy(Box::new(source), keys),
        }
    }

    pub fn group_by(source: Query, keys: Vec<ScalarExpr>) -> Query {
        Query {
            kind: QueryKind::GroupBy(Box::new(source), keys),
        }
    }

    pub fn having(source: Query, predicate: ScalarExpr) -> Query {
        Query {
            kind: QueryKind::Having(Box::new(source), predicate),
        }
    }

    pub fn distinct(source: Query) -> Query {
        Query {
            kind: QueryKind::Distinct(Box::new(source)),
        }
    }

    pub fn limit(source: Query, count: u64, offset: Option<u64>) -> Query {
        Query {
            kind: QueryKind::Limit(Box::new(source), count, offset),
        }
    }

    pub fn set_op(op: SetOp, left: Query, right: Query) -> Query {
        Query {
            kind: QueryKind::SetOp(op, Box::new(left), Box::new(right)),
        }
    }

    /// Joins `inner` onto `outer` with the given predicate. The resulting shape is the
    /// default row tuple: every column of `outer`'s shape followed by every column of
    /// `inner`. Callers who need a different projection wrap the result in [`Query::select`].
    pub fn join<T: TableMeta>(
        outer: Query,
        kind: JoinKind,
        inner_meta: &T,
        on: impl FnOnce(&TableHandle) -> ScalarExpr,
    ) -> (Query, TableHandle) {
        let (inner_query, handle) = Query::from_table(inner_meta);
        let inner = match inner_query.kind {
            QueryKind::FromTable(t) => t,
            _ => unreachable!("from_table always produces FromTable"),
        };
        let on_expr = on(&handle);
        let query = Query {
            kind: QueryKind::Join {
                kind,
                outer: Box::new(outer),
                inner,
                on: on_expr,
            },
        };
        (query, handle)
    }

    /// Explicitly wraps `inner` as a materialised derived table, returning a handle that can
    /// build [`AliasRef`] expressions against its projected shape.
    pub fn subquery(inner: Query) -> Result<(Query, QueryHandle)> {
        let shape = inner.shape()?;
        let occurrence = QueryOccurrenceId::fresh();
        let handle = QueryHandle {
            occurrence,
            shape: shape.0,
        };
        let query = Query {
            kind: QueryKind::Subquery(occurrence, Box::new(inner)),
        };
        Ok((query, handle))
    }

    pub fn shape(&self) -> Result<Shape> {
        let fields = match &self.kind {
            QueryKind::FromTable(t) => t
                .columns
                .iter()
                .map(|(n, k)| ShapeField {
                    name: Some(n.clone()),
                    kind: *k,
                })
                .collect(),
            QueryKind::Where(src, _)
            | QueryKind::OrderBy(src, _)
            | QueryKind::GroupBy(src, _)
            | QueryKind::Having(src, _)
            | QueryKind::Distinct(src)
            | QueryKind::Limit(src, _, _) => return src.shape(),
            QueryKind::Select(_, projs) => {
                let names = effective_names(projs);
                projs
                    .iter()
                    .zip(names)
                    .map(|(f, name)| ShapeField {
                        name: Some(name),
                        kind: f.expr.kind_of(),
                    })
                    .collect()
            }
            QueryKind::Join {
                outer, inner, ..
            } => {
                let mut fields = outer.shape()?.0;
                fields.extend(inner.columns.iter().map(|(n, k)| ShapeField {
                    name: Some(n.clone()),
                    kind: *k,
                }));
                fields
            }
            QueryKind::JoinChain { base, edges } => {
                let mut fields = base.shape()?.0;
                for edge in edges {
                    fields.extend(edge.table.columns.iter().map(|(n, k)| ShapeField {
                        name: Some(n.clone()),
                        kind: *k,
                    }));
                }
                fields
            }
            QueryKind::Subquery(_, inner) => return inner.shape(),
            QueryKind::SetOp(_, left, right) => {
                let left_shape = left.shape()?;
                let right_shape = right.shape()?;
                if left_shape.0.len() != right_shape.0.len() {
                    return Err(Error::arity_mismatch(
                        "set_op",
                        format!(
                            "left side has {} columns, right side has {}",
                            left_shape.0.len(),
                            right_shape.0.len()
                        ),
                    ));
                }
                for (l, r) in left_shape.0.iter().zip(right_shape.0.iter()) {
                    if l.kind != r.kind {
                        return Err(Error::kind_mismatch(
                            "set_op",
                            format!("{} on the left vs {} on the right", l.kind, r.kind),
                        ));
                    }
                }
                left_shape.0
            }
        };
        Ok(Shape(fields))
    }
}

/// Handle to a table occurrence, returned alongside a freshly constructed `FromTable`/`Join`
/// node. Used to build [`ColumnRef`] expressions bound to that specific occurrence.
#[derive(Debug, Clone)]
pub struct TableHandle {
    occurrence: TableOccurrenceId,
    table_name: String,
}

impl TableHandle {
    pub fn occurrence(&self) -> TableOccurrenceId {
        self.occurrence
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column(&self, name: impl Into<String>, kind: Kind) -> ScalarExpr {
        ScalarExpr::new(crate::ir::expr::ExprKind::Column(ColumnRef {
            occurrence: self.occurrence,
            name: name.into(),
            kind,
        }))
    }
}

/// Handle to a materialised subquery, returned alongside [`Query::subquery`]. Used to build
/// [`AliasRef`] expressions addressing its projected fields from outside.
#[derive(Debug, Clone)]
pub struct QueryHandle {
    occurrence: QueryOccurrenceId,
    shape: Vec<ShapeField>,
}

impl QueryHandle {
    pub fn occurrence(&self) -> QueryOccurrenceId {
        self.occurrence
    }

    pub fn shape(&self) -> &[ShapeField] {
        &self.shape
    }

    pub fn column(&self, index: usize) -> Option<ScalarExpr> {
        let field = self.shape.get(index)?;
        Some(ScalarExpr::new(crate::ir::expr::ExprKind::Alias(
            AliasRef {
                occurrence: self.occurrence,
                index,
                name: field.name.clone(),
                kind: field.kind,
            },
        )))
    }

    pub fn named(&self, name: &str) -> Option<ScalarExpr> {
        let index = self.shape.iter().position(|f| f.name.as_deref() == Some(name))?;
        self.column(index)
    }
}

/// A query whose shape is exactly one field, usable as a scalar value (e.g. inside
/// [`crate::ir::expr::ExprKind::ScalarQueryExpr`] or as the right-hand side of `IN`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarQuery(pub Query);

impl ScalarQuery {
    pub fn new(query: Query) -> Result<ScalarQuery> {
        let shape = query.shape()?;
        if shape.0.len() != 1 {
            return Err(Error::arity_mismatch(
                "scalar_query",
                format!("expected exactly one projected column, found {}", shape.0.len()),
            ));
        }
        Ok(ScalarQuery(query))
    }

    pub fn kind(&self) -> Kind {
        self.0
            .shape()
            .expect("validated to have exactly one field at construction")
            .0[0]
            .kind
    }
}
