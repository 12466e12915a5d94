//! Clause collection: descends a normalised `Query`, accumulating the pieces of one `SELECT`
//! block in the canonical forward order `WHERE → GROUP BY → HAVING → ORDER BY → LIMIT`
//! (SPEC_FULL.md §4.6). Descending the tree visits these in reverse, since each clause wraps
//! the one before it; encountering a clause of a kind that can no longer legally stack
//! (SPEC_FULL.md §4.2 rule 4) forces the remaining subtree to be materialised as a derived
//! table instead of fused into this block.

use crate::error::Result;
use crate::ir::expr::{BinOp, ExprKind, ScalarExpr};
use crate::ir::ids::QueryOccurrenceId;
use crate::ir::query::{FromTable, JoinEdge, OrderKey, Query, QueryKind, SetOp, TupleField};
use crate::normalize::{disqualifies_fusion, join_outer_needs_materialisation};

pub enum FromSource {
    Table(FromTable),
    /// A subtree that must be compiled as its own nested `SELECT` and aliased; `occurrence`
    /// is `Some` only when the caller explicitly wrapped it via `Query::subquery` (so
    /// `AliasRef`s built against that handle can resolve); normaliser-forced materialisation
    /// mints no new occurrence since nothing outside the tree can have referenced it yet.
    Materialised(Option<QueryOccurrenceId>, Box<Query>),
}

pub enum Base {
    Relational {
        source: FromSource,
        joins: Vec<JoinEdge>,
    },
    SetOp(SetOp, Box<Query>, Box<Query>),
}

pub struct Collected {
    pub base: Base,
    pub where_pred: Option<ScalarExpr>,
    pub group_by: Vec<ScalarExpr>,
    pub having: Option<ScalarExpr>,
    pub order_by: Vec<OrderKey>,
    pub distinct: bool,
    pub limit: Option<(u64, Option<u64>)>,
    pub projections: Option<Vec<TupleField>>,
}

fn and(a: Option<ScalarExpr>, b: ScalarExpr) -> ScalarExpr {
    match a {
        Some(existing) => ScalarExpr::new(ExprKind::Binary {
            op: BinOp::And,
            left: Box::new(existing),
            right: Box::new(b),
        }),
        None => b,
    }
}

pub fn collect(mut query: Query, _path: &str) -> Result<Collected> {
    let mut where_pred: Option<ScalarExpr> = None;
    let mut group_by = Vec::new();
    let mut having: Option<ScalarExpr> = None;
    let mut order_by = Vec::new();
    let mut distinct = false;
    let mut limit = None;
    let mut projections: Option<Vec<TupleField>> = None;

    loop {
        match query.kind {
            QueryKind::Limit(source, count, offset) => {
                limit = Some((count, offset));
                query = *source;
            }
            QueryKind::Distinct(source) => {
                distinct = true;
                query = *source;
            }
            QueryKind::OrderBy(source, keys) => {
                order_by = keys;
                query = *source;
            }
            QueryKind::Having(source, pred) => {
                having = Some(and(having, pred));
                query = *source;
            }
            QueryKind::GroupBy(source, keys) => {
                group_by = keys;
                query = *source;
            }
            QueryKind::Where(source, pred) => {
                if disqualifies_fusion(&source.kind) {
                    log::debug!("materializing before Where, source can't fuse further");
                    where_pred = Some(and(where_pred, pred));
                    return Ok(Collected {
                        base: Base::Relational {
                            source: FromSource::Materialised(None, source),
                            joins: Vec::new(),
                        },
                        where_pred,
                        group_by,
                        having,
                        order_by,
                        distinct,
                        limit,
                        projections,
                    });
                }
                where_pred = Some(and(where_pred, pred));
                query = *source;
            }
            QueryKind::Select(source, projs) => {
                if projections.is_some() || matches!(source.kind, QueryKind::Select(..)) {
                    return Ok(Collected {
                        base: Base::Relational {
                            source: FromSource::Materialised(
                                None,
                                Box::new(Query {
                                    kind: QueryKind::Select(source, projs),
                                }),
                            ),
                            joins: Vec::new(),
                        },
                        where_pred,
                        group_by,
                        having,
                        order_by,
                        distinct,
                        limit,
                        projections,
                    });
                }
                projections = Some(projs);
                query = *source;
            }
            QueryKind::FromTable(t) => {
                return Ok(Collected {
                    base: Base::Relational {
                        source: FromSource::Table(t),
                        joins: Vec::new(),
                    },
                    where_pred,
                    group_by,
                    having,
                    order_by,
                    distinct,
                    limit,
                    projections,
                });
            }
            QueryKind::Join { .. } | QueryKind::JoinChain { .. } => {
                let (source, joins, pushed_where) = resolve_join_base(query);
                for pred in pushed_where {
                    where_pred = Some(and(where_pred, pred));
                }
                return Ok(Collected {
                    base: Base::Relational { source, joins },
                    where_pred,
                    group_by,
                    having,
                    order_by,
                    distinct,
                    limit,
                    projections,
                });
            }
            QueryKind::Subquery(occurrence, inner) => {
                return Ok(Collected {
                    base: Base::Relational {
                        source: FromSource::Materialised(Some(occurrence), inner),
                        joins: Vec::new(),
                    },
                    where_pred,
                    group_by,
                    having,
                    order_by,
                    distinct,
                    limit,
                    projections,
                });
            }
            QueryKind::SetOp(op, left, right) => {
                let has_wrapping = where_pred.is_some()
                    || !group_by.is_empty()
                    || having.is_some()
                    || !order_by.is_empty()
                    || distinct
                    || limit.is_some()
                    || projections.is_some();
                if has_wrapping {
                    return Ok(Collected {
                        base: Base::Relational {
                            source: FromSource::Materialised(
                                None,
                                Box::new(Query {
                                    kind: QueryKind::SetOp(op, left, right),
                                }),
                            ),
                            joins: Vec::new(),
                        },
                        where_pred,
                        group_by,
                        having,
                        order_by,
                        distinct,
                        limit,
                        projections,
                    });
                }
                return Ok(Collected {
                    base: Base::SetOp(op, left, right),
                    where_pred,
                    group_by,
                    having,
                    order_by,
                    distinct,
                    limit,
                    projections,
                });
            }
        }
    }
}

/// Resolves the base relation of a (possibly chained) `Join`, fusing adjacent `Join` nodes
/// into one flat edge list (rule 2) and materialising any side the normaliser's rules
/// disqualify from further fusion (rule 4's join bullet). Returns predicates pushed down from
/// a `Where` that sat safely on the outer side and can just join the block's own `WHERE`.
fn resolve_join_base(query: Query) -> (FromSource, Vec<JoinEdge>, Vec<ScalarExpr>) {
    match query.kind {
        QueryKind::Join { kind, outer, inner, on } => {
            if join_outer_needs_materialisation(&outer) {
                (
                    FromSource::Materialised(None, outer),
                    vec![JoinEdge { kind, table: inner, on }],
                    Vec::new(),
                )
            } else if let QueryKind::Where(grandparent, pred) = outer.kind {
                let (source, mut edges, mut preds) = resolve_join_base(*grandparent);
                edges.push(JoinEdge { kind, table: inner, on });
                preds.push(pred);
                (source, edges, preds)
            } else {
                let (source, mut edges, preds) = resolve_join_base(Query { kind: outer.kind });
                edges.push(JoinEdge { kind, table: inner, on });
                (source, edges, preds)
            }
        }
        QueryKind::JoinChain { base, edges } => match base.kind {
            QueryKind::FromTable(t) => (FromSource::Table(t), edges, Vec::new()),
            other => (
                FromSource::Materialised(None, Box::new(Query { kind: other })),
                edges,
                Vec::new(),
            ),
        },
        QueryKind::FromTable(t) => (FromSource::Table(t), Vec::new(), Vec::new()),
        other => (
            FromSource::Materialised(None, Box::new(Query { kind: other })),
            Vec::new(),
            Vec::new(),
        ),
    }
}
