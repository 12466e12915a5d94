//! Renders a collected `SELECT` block to its final multi-line SQL text.
//!
//! Formatting policy (SPEC_FULL.md §6.3): top-level keywords sit at the block's own
//! indentation column; their bodies are indented one further level; projections and join
//! lines are one per line, comma-terminated; a materialised subquery is wrapped in
//! parentheses and re-indented one level in from its parent.

use std::collections::HashMap;

use crate::compiler::{Base, Collected, FromSource};
use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::gen_expr::compile_expr;
use crate::ir::expr::{ColumnRef, ExprKind, ScalarExpr};
use crate::ir::ids::{QueryOccurrenceId, TableOccurrenceId};
use crate::ir::query::{JoinKind, OrderDir, Query, QueryKind, SetOp, TupleField};

pub fn render(collected: Collected, ctx: &mut Context, depth: usize, path: &str) -> Result<String> {
    let Collected {
        base,
        where_pred,
        group_by,
        having,
        order_by,
        distinct,
        limit,
        projections,
    } = collected;
    let clauses = Clauses {
        where_pred,
        group_by,
        having,
        order_by,
        distinct,
        limit,
        projections,
    };

    match base {
        Base::SetOp(op, left, right) => render_set_op(op, *left, *right, ctx, depth, path),
        Base::Relational { source, joins } => {
            render_relational(source, joins, clauses, ctx, depth, path)
        }
    }
}

/// `Collected` minus its `base`: the clauses common to any relational source.
struct Clauses {
    where_pred: Option<crate::ir::expr::ScalarExpr>,
    group_by: Vec<crate::ir::expr::ScalarExpr>,
    having: Option<crate::ir::expr::ScalarExpr>,
    order_by: Vec<crate::ir::query::OrderKey>,
    distinct: bool,
    limit: Option<(u64, Option<u64>)>,
    projections: Option<Vec<TupleField>>,
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn render_relational(
    source: FromSource,
    joins: Vec<crate::ir::query::JoinEdge>,
    collected: Clauses,
    ctx: &mut Context,
    depth: usize,
    path: &str,
) -> Result<String> {
    let ind = indent(depth);
    let body = indent(depth + 1);
    let mut pushed = 0usize;

    let from_text = match source {
        FromSource::Table(t) => {
            let alias = ctx.fresh_table_alias();
            let text = format!("{} AS {}", ctx.dialect.quote_ident(&t.table_name), alias);
            ctx.push_table_scope(t.occurrence, alias);
            pushed += 1;
            text
        }
        FromSource::Materialised(occurrence, inner) => {
            let passthrough = passthrough_map(&inner)?;
            let inner_path = format!("{}.from", path);
            let (inner_sql, shape) =
                crate::compiler::compile_query_at(*inner, ctx, depth + 1, &inner_path)?;
            let alias = ctx.fresh_table_alias();
            let text = format!("(\n{}\n{}) AS {}", inner_sql, ind, alias);
            let occurrence = occurrence.unwrap_or_else(QueryOccurrenceId::fresh);
            ctx.push_subquery_scope(occurrence, alias, shape.0, passthrough);
            pushed += 1;
            text
        }
    };

    let mut from_text = from_text;
    for edge in joins {
        let alias = ctx.fresh_table_alias();
        ctx.push_table_scope(edge.table.occurrence, alias.clone());
        pushed += 1;
        let join_kw = match edge.kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        };
        let on_path = format!("{}.join.on", path);
        let on_sql = compile_expr(&edge.on, ctx, &on_path)?;
        from_text.push_str(&format!(
            "\n{}{} {} AS {} ON {}",
            ind,
            join_kw,
            ctx.dialect.quote_ident(&edge.table.table_name),
            alias,
            on_sql
        ));
    }

    if collected.limit.is_some()
        && collected.order_by.is_empty()
        && ctx.dialect.requires_order_by_for_limit()
    {
        return Err(Error::invalid_limit(
            path,
            format!(
                "{} requires an ORDER BY clause before LIMIT/OFFSET",
                ctx.dialect
            ),
        ));
    }

    if let Some(fields) = &collected.projections {
        check_grouping(fields, &collected.group_by, ctx.dialect, path)?;
    }

    let select_path = format!("{}.select", path);
    let select_text = match &collected.projections {
        Some(fields) => render_projections(fields, ctx, depth, &select_path)?,
        None => format!("{}*", body),
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "{}SELECT{}",
        ind,
        if collected.distinct { " DISTINCT" } else { "" }
    ));
    lines.push(select_text);
    lines.push(format!("{}FROM {}", ind, from_text));

    if let Some(pred) = &collected.where_pred {
        let sql = compile_expr(pred, ctx, &format!("{}.where", path))?;
        lines.push(format!("{}WHERE", ind));
        lines.push(format!("{}{}", body, sql));
    }

    if !collected.group_by.is_empty() {
        let keys = collected
            .group_by
            .iter()
            .enumerate()
            .map(|(i, k)| compile_expr(k, ctx, &format!("{}.group_by[{}]", path, i)))
            .collect::<Result<Vec<_>>>()?;
        lines.push(format!("{}GROUP BY", ind));
        lines.push(format!("{}{}", body, keys.join(", ")));
    }

    if let Some(pred) = &collected.having {
        let sql = compile_expr(pred, ctx, &format!("{}.having", path))?;
        lines.push(format!("{}HAVING", ind));
        lines.push(format!("{}{}", body, sql));
    }

    if !collected.order_by.is_empty() {
        let keys = collected
            .order_by
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let sql = compile_expr(&k.expr, ctx, &format!("{}.order_by[{}]", path, i))?;
                let dir = match k.dir {
                    OrderDir::Asc => "ASC",
                    OrderDir::Desc => "DESC",
                };
                Ok(format!("{} {}", sql, dir))
            })
            .collect::<Result<Vec<_>>>()?;
        lines.push(format!("{}ORDER BY", ind));
        lines.push(format!("{}{}", body, keys.join(", ")));
    }

    if let Some((limit, offset)) = collected.limit {
        lines.push(format!("{}{}", ind, ctx.dialect.limit_offset(limit, offset)));
    }

    for _ in 0..pushed {
        ctx.pop_scope();
    }

    Ok(lines.join("\n"))
}

/// Checks that every projection under a `GROUP BY` either names a grouping key column or sits
/// inside an aggregate (SPEC_FULL.md §4.7). SQLite is permissive here, matching its own lax
/// `GROUP BY` enforcement; SqlServer and PostgreSQL reject the projection outright.
fn check_grouping(
    projections: &[TupleField],
    group_by: &[ScalarExpr],
    dialect: Dialect,
    path: &str,
) -> Result<()> {
    if group_by.is_empty() || dialect == Dialect::Sqlite {
        return Ok(());
    }
    let group_columns: Vec<&ColumnRef> = group_by
        .iter()
        .filter_map(|k| match &k.kind {
            ExprKind::Column(c) => Some(c),
            _ => None,
        })
        .collect();
    for (i, field) in projections.iter().enumerate() {
        let mut columns = Vec::new();
        collect_ungrouped_columns(&field.expr, &mut columns);
        for c in columns {
            let in_group = group_columns
                .iter()
                .any(|gc| gc.occurrence == c.occurrence && gc.name == c.name);
            if !in_group {
                return Err(Error::invalid_grouping(
                    format!("{}.select[{}]", path, i),
                    format!(
                        "column `{}` must appear in GROUP BY or be wrapped in an aggregate",
                        c.name
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Collects every `Column` reference in `expr`, not descending into `Aggregate` arguments
/// (an aggregate's own argument is never required to be a grouping key).
fn collect_ungrouped_columns<'a>(expr: &'a ScalarExpr, out: &mut Vec<&'a ColumnRef>) {
    match &expr.kind {
        ExprKind::Aggregate { .. } => {}
        ExprKind::Column(c) => out.push(c),
        ExprKind::Binary { left, right, .. } => {
            collect_ungrouped_columns(left, out);
            collect_ungrouped_columns(right, out);
        }
        ExprKind::Unary { arg, .. } => collect_ungrouped_columns(arg, out),
        ExprKind::Case {
            cond,
            then_expr,
            else_expr,
        } => {
            collect_ungrouped_columns(cond, out);
            collect_ungrouped_columns(then_expr, out);
            collect_ungrouped_columns(else_expr, out);
        }
        ExprKind::IsNull(a) | ExprKind::IsNotNull(a) => collect_ungrouped_columns(a, out),
        ExprKind::Like { value, pattern } => {
            collect_ungrouped_columns(value, out);
            collect_ungrouped_columns(pattern, out);
        }
        ExprKind::In { value, items } => {
            collect_ungrouped_columns(value, out);
            for item in items {
                collect_ungrouped_columns(item, out);
            }
        }
        ExprKind::FuncString { args, .. }
        | ExprKind::FuncMath { args, .. }
        | ExprKind::FuncDate { args, .. } => {
            for a in args {
                collect_ungrouped_columns(a, out);
            }
        }
        _ => {}
    }
}

fn render_projections(
    fields: &[TupleField],
    ctx: &mut Context,
    depth: usize,
    path: &str,
) -> Result<String> {
    if fields.is_empty() {
        return Err(Error::arity_mismatch(path, "projection list must not be empty"));
    }
    let body = indent(depth + 1);
    let names = crate::ir::query::effective_names(fields);
    let lines = fields
        .iter()
        .zip(names)
        .enumerate()
        .map(|(i, (f, name))| -> Result<String> {
            let expr_sql = compile_expr(&f.expr, ctx, &format!("{}[{}]", path, i))?;
            let is_bare_same_name = matches!(&f.expr.kind, ExprKind::Column(c) if c.name == name);
            if is_bare_same_name {
                Ok(format!("{}{}", body, expr_sql))
            } else {
                Ok(format!("{}{} AS {}", body, expr_sql, ctx.dialect.quote_ident(&name)))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join(",\n"))
}

fn render_set_op(
    op: SetOp,
    left: Query,
    right: Query,
    ctx: &mut Context,
    depth: usize,
    path: &str,
) -> Result<String> {
    let keyword = match op {
        SetOp::Union => "UNION",
        SetOp::UnionAll => "UNION ALL",
        SetOp::Intersect => "INTERSECT",
        SetOp::Except => "EXCEPT",
    };
    let (left_sql, _) = crate::compiler::compile_query_at(left, ctx, depth, &format!("{}.left", path))?;
    let (right_sql, _) = crate::compiler::compile_query_at(right, ctx, depth, &format!("{}.right", path))?;
    Ok(format!(
        "{}\n{}{}\n{}",
        left_sql,
        indent(depth),
        keyword,
        right_sql
    ))
}

/// For a materialised `FromSource`, maps each original `(table_occurrence, column_name)` that
/// survives unchanged into the materialised shape to its projected index, so a `Column`
/// reference written against the pre-materialisation tree still resolves once this boundary
/// is inserted (see `crate::context::Context::resolve_column`).
fn passthrough_map(query: &Query) -> Result<HashMap<(TableOccurrenceId, String), usize>> {
    match &query.kind {
        QueryKind::Select(_, projs) => {
            let mut map = HashMap::new();
            for (i, f) in projs.iter().enumerate() {
                if let ExprKind::Column(c) = &f.expr.kind {
                    map.insert((c.occurrence, c.name.clone()), i);
                }
            }
            Ok(map)
        }
        QueryKind::Where(src, _)
        | QueryKind::OrderBy(src, _)
        | QueryKind::GroupBy(src, _)
        | QueryKind::Having(src, _)
        | QueryKind::Distinct(src)
        | QueryKind::Limit(src, _, _) => passthrough_map(src),
        QueryKind::FromTable(t) => Ok(t
            .columns
            .iter()
            .enumerate()
            .map(|(i, (n, _))| ((t.occurrence, n.clone()), i))
            .collect()),
        QueryKind::Join { outer, inner, .. } => {
            let mut map = passthrough_map(outer)?;
            let offset = outer.shape()?.0.len();
            for (i, (n, _)) in inner.columns.iter().enumerate() {
                map.insert((inner.occurrence, n.clone()), offset + i);
            }
            Ok(map)
        }
        QueryKind::JoinChain { base, edges } => {
            let mut map = passthrough_map(base)?;
            let mut offset = base.shape()?.0.len();
            for edge in edges {
                for (i, (n, _)) in edge.table.columns.iter().enumerate() {
                    map.insert((edge.table.occurrence, n.clone()), offset + i);
                }
                offset += edge.table.columns.len();
            }
            Ok(map)
        }
        QueryKind::Subquery(_, inner) => passthrough_map(inner),
        QueryKind::SetOp(..) => Ok(HashMap::new()),
    }
}
