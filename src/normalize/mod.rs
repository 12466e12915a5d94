//! Local, fixed-point tree rewrites applied before compilation.
//!
//! Grounded on the teacher's `sql::pq::preprocess::preprocess_reorder` (a small, local,
//! `Vec`-level rewrite pass run once over a pipeline before anchoring) and
//! `sql::pq::anchor::extract_atomic`/`split_off_back` (deciding where a pipeline must be
//! split into a derived table) — this module covers the first of those two concerns
//! (where-fusion, a pure tree rewrite); materialisation-boundary decisions (rules 3/4) are
//! made by the compiler driver as it descends, the same way `anchor.rs` makes them while
//! walking a pipeline rather than as a separate up-front pass.

use crate::ir::expr::{BinOp, ScalarExpr};
use crate::ir::query::{Query, QueryKind};

/// Runs the where-fusion rewrite over the whole tree: `Where(Where(src, p1), p2)` becomes
/// `Where(src, p1 AND p2)`, recursively, so a chain of any length collapses to one `Where`
/// carrying a single conjunction.
pub fn normalize(query: Query) -> Query {
    let kind = match query.kind {
        QueryKind::FromTable(t) => QueryKind::FromTable(t),
        QueryKind::Where(source, predicate) => {
            let source = normalize(*source);
            return fuse_where(source, predicate);
        }
        QueryKind::Select(source, projs) => {
            QueryKind::Select(Box::new(normalize(*source)), projs)
        }
        QueryKind::OrderBy(source, keys) => QueryKind::OrderBy(Box::new(normalize(*source)), keys),
        QueryKind::GroupBy(source, keys) => QueryKind::GroupBy(Box::new(normalize(*source)), keys),
        QueryKind::Having(source, predicate) => {
            QueryKind::Having(Box::new(normalize(*source)), predicate)
        }
        QueryKind::Join {
            kind,
            outer,
            inner,
            on,
        } => QueryKind::Join {
            kind,
            outer: Box::new(normalize(*outer)),
            inner,
            on,
        },
        QueryKind::JoinChain { base, edges } => QueryKind::JoinChain {
            base: Box::new(normalize(*base)),
            edges,
        },
        QueryKind::Distinct(source) => QueryKind::Distinct(Box::new(normalize(*source))),
        QueryKind::Limit(source, count, offset) => {
            QueryKind::Limit(Box::new(normalize(*source)), count, offset)
        }
        QueryKind::SetOp(op, left, right) => {
            QueryKind::SetOp(op, Box::new(normalize(*left)), Box::new(normalize(*right)))
        }
        QueryKind::Subquery(occurrence, inner) => {
            QueryKind::Subquery(occurrence, Box::new(normalize(*inner)))
        }
    };
    Query { kind }
}

fn fuse_where(source: Query, predicate: ScalarExpr) -> Query {
    if let QueryKind::Where(inner, inner_predicate) = source.kind {
        log::debug!("fusing adjacent Where nodes into one conjunction");
        let fused = ScalarExpr::new(crate::ir::expr::ExprKind::Binary {
            op: BinOp::And,
            left: Box::new(inner_predicate),
            right: Box::new(predicate),
        });
        fuse_where(*inner, fused)
    } else {
        Query {
            kind: QueryKind::Where(Box::new(source), predicate),
        }
    }
}

/// True for the query kinds that close off row shape or cardinality: a `Where`/`Join`/second
/// `Select` landing directly on one of these cannot simply fuse further and instead forces a
/// materialisation boundary (SPEC_FULL.md §4.2 rule 4).
pub fn disqualifies_fusion(kind: &QueryKind) -> bool {
    matches!(
        kind,
        QueryKind::Select(..)
            | QueryKind::GroupBy(..)
            | QueryKind::Limit(..)
            | QueryKind::SetOp(..)
            | QueryKind::Distinct(..)
            | QueryKind::Subquery(..)
    )
}

/// Whether a `Join`'s `outer` side needs to be materialised before joining, rather than
/// fused as a chain. Peels through a single `Where` layer (which would otherwise want to
/// fuse below the join) to see whether *it* sits on a disqualifying clause.
pub fn join_outer_needs_materialisation(outer: &Query) -> bool {
    match &outer.kind {
        QueryKind::Where(inner, _) => disqualifies_fusion(&inner.kind),
        other => disqualifies_fusion(other),
    }
}
