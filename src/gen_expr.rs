//! Scalar expression compilation: literals, parameters, functions, and the
//! precedence-aware parenthesisation pass (`OR` binds loosest, then `AND`, then comparisons,
//! then arithmetic — grounded on the teacher's `sql::gen_expr` binary-operator precedence
//! table).

use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ir::expr::{BinOp, ExprKind, ScalarExpr, UnOp};
use crate::ir::Kind;
use crate::value::Value;

pub fn compile_expr(expr: &ScalarExpr, ctx: &mut Context, path: &str) -> Result<String> {
    match &expr.kind {
        ExprKind::Const(value) => compile_const(value, ctx, &format!("{}.const", path)),
        ExprKind::Param { name, value } => {
            let param_path = format!("{}.param", path);
            ctx.bind_param(name.as_deref(), value.clone(), &param_path)
        }
        ExprKind::Null(kind) => {
            let _ = kind;
            Ok(ctx.dialect.null_literal().to_string())
        }
        ExprKind::Column(c) => ctx.resolve_column(c.occurrence, &c.name, path),
        ExprKind::Alias(a) => ctx.resolve_alias(a.occurrence, a.index, a.name.as_deref(), path),
        ExprKind::Binary { op, left, right } => compile_binary(*op, left, right, ctx, path),
        ExprKind::Unary { op, arg } => compile_unary(*op, arg, ctx, path),
        ExprKind::Case {
            cond,
            then_expr,
            else_expr,
        } => {
            if cond.kind_of() != Kind::Bool {
                return Err(Error::kind_mismatch(
                    format!("{}.case.when", path),
                    format!("CASE condition must be Bool, found {}", cond.kind_of()),
                ));
            }
            let cond = compile_expr(cond, ctx, &format!("{}.case.when", path))?;
            let then = compile_expr(then_expr, ctx, &format!("{}.case.then", path))?;
            let els = compile_expr(else_expr, ctx, &format!("{}.case.else", path))?;
            Ok(format!("CASE WHEN {} THEN {} ELSE {} END", cond, then, els))
        }
        ExprKind::In { value, items } => {
            if items.is_empty() {
                return Err(Error::arity_mismatch(
                    format!("{}.in", path),
                    "IN list must not be empty",
                ));
            }
            let value_sql = compile_expr(value, ctx, &format!("{}.in.value", path))?;
            let items_sql = items
                .iter()
                .enumerate()
                .map(|(i, item)| compile_expr(item, ctx, &format!("{}.in.items[{}]", path, i)))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("{} IN ({})", value_sql, items_sql.join(", ")))
        }
        ExprKind::InSubquery { value, query } => {
            let value_sql = compile_expr(value, ctx, &format!("{}.in_subquery.value", path))?;
            let inner_path = format!("{}.in_subquery.query", path);
            let (inner_sql, _) =
                crate::compiler::compile_query_nested(&query.0, ctx, &inner_path)?;
            Ok(format!("{} IN ({})", value_sql, inner_sql))
        }
        ExprKind::Like { value, pattern } => {
            let value_sql = compile_expr(value, ctx, &format!("{}.like.value", path))?;
            let pattern_sql = compile_expr(pattern, ctx, &format!("{}.like.pattern", path))?;
            Ok(format!("{} LIKE {}", value_sql, pattern_sql))
        }
        ExprKind::IsNull(arg) => {
            let arg_sql = compile_expr(arg, ctx, &format!("{}.is_null", path))?;
            Ok(format!("{} IS NULL", arg_sql))
        }
        ExprKind::IsNotNull(arg) => {
            let arg_sql = compile_expr(arg, ctx, &format!("{}.is_not_null", path))?;
            Ok(format!("{} IS NOT NULL", arg_sql))
        }
        ExprKind::Aggregate { kind, arg } => compile_aggregate(*kind, arg.as_deref(), ctx, path),
        ExprKind::FuncString { name, args } => compile_string_func(*name, args, ctx, path),
        ExprKind::FuncMath { name, args } => compile_math_func(*name, args, ctx, path),
        ExprKind::FuncDate { name, args } => compile_date_func(*name, args, ctx, path),
        ExprKind::ScalarQueryExpr(query) => {
            let inner_path = format!("{}.scalar_query", path);
            let (inner_sql, _) =
                crate::compiler::compile_query_nested(&query.0, ctx, &inner_path)?;
            Ok(format!("({})", inner_sql))
        }
    }
}

/// Literal folding (SPEC_FULL.md §4.4): a `Const` becomes a synthetic bound parameter rather
/// than inline text, so the emitted SQL stays parameterised. The one exception is PostgreSQL,
/// which inlines a non-null boolean as the `true`/`false` keyword with no parameter at all.
fn compile_const(value: &Value, ctx: &mut Context, path: &str) -> Result<String> {
    if let Value::Bool(b) = value {
        if ctx.dialect == Dialect::Postgres {
            return Ok(ctx.dialect.bool_literal(*b));
        }
    }
    ctx.bind_param(None, value.clone(), path)
}

/// `Int`/`Long` are treated as mutually widenable (SPEC_FULL.md §3.1); every other pairing
/// must match exactly.
fn numeric_compatible(a: Kind, b: Kind) -> bool {
    a == b || matches!((a, b), (Kind::Int, Kind::Long) | (Kind::Long, Kind::Int))
}

fn check_binary_kinds(op: BinOp, left: &ScalarExpr, right: &ScalarExpr, path: &str) -> Result<()> {
    let lk = left.kind_of();
    let rk = right.kind_of();
    match op {
        BinOp::And | BinOp::Or => {
            if lk != Kind::Bool || rk != Kind::Bool {
                return Err(Error::kind_mismatch(
                    path,
                    format!("{:?} requires both operands to be Bool, found {} and {}", op, lk, rk),
                ));
            }
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            if !numeric_compatible(lk, rk) {
                return Err(Error::kind_mismatch(
                    path,
                    format!("arithmetic requires matching numeric kinds, found {} and {}", lk, rk),
                ));
            }
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            if lk != rk && !numeric_compatible(lk, rk) {
                return Err(Error::kind_mismatch(
                    path,
                    format!("comparison requires matching kinds, found {} and {}", lk, rk),
                ));
            }
        }
    }
    Ok(())
}

fn compile_binary(
    op: BinOp,
    left: &ScalarExpr,
    right: &ScalarExpr,
    ctx: &mut Context,
    path: &str,
) -> Result<String> {
    check_binary_kinds(op, left, right, path)?;
    let prec = op.precedence();
    let left_sql = compile_operand(left, prec, Side::Left, ctx, &format!("{}.lhs", path))?;
    let right_sql = compile_operand(right, prec, Side::Right, ctx, &format!("{}.rhs", path))?;
    let op_sql = match op {
        BinOp::Eq => "=",
        BinOp::Ne => "<>",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "AND",
        BinOp::Or => "OR",
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
    };
    Ok(format!("{} {} {}", left_sql, op_sql, right_sql))
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
}

fn compile_operand(
    operand: &ScalarExpr,
    parent_prec: u8,
    side: Side,
    ctx: &mut Context,
    path: &str,
) -> Result<String> {
    let sql = compile_expr(operand, ctx, path)?;
    if let ExprKind::Binary { op: child_op, .. } = &operand.kind {
        let child_prec = child_op.precedence();
        let non_associative = matches!(child_op, BinOp::Sub | BinOp::Div);
        let needs_parens = child_prec < parent_prec
            || (child_prec == parent_prec && side == Side::Right && non_associative);
        if needs_parens {
            return Ok(format!("({})", sql));
        }
    }
    Ok(sql)
}

fn compile_unary(op: UnOp, arg: &ScalarExpr, ctx: &mut Context, path: &str) -> Result<String> {
    let arg_sql = compile_expr(arg, ctx, &format!("{}.arg", path))?;
    let needs_parens = matches!(&arg.kind, ExprKind::Binary { .. });
    let arg_sql = if needs_parens {
        format!("({})", arg_sql)
    } else {
        arg_sql
    };
    Ok(match op {
        UnOp::Not => format!("NOT {}", arg_sql),
        UnOp::Neg => format!("-{}", arg_sql),
    })
}

fn compile_aggregate(
    kind: crate::ir::expr::AggKind,
    arg: Option<&ScalarExpr>,
    ctx: &mut Context,
    path: &str,
) -> Result<String> {
    use crate::ir::expr::AggKind::*;
    if matches!(kind, CountStar) {
        return Ok("COUNT(*)".to_string());
    }
    let arg = arg.ok_or_else(|| {
        Error::arity_mismatch(format!("{}.aggregate", path), "this aggregate requires an argument")
    })?;
    let arg_sql = compile_expr(arg, ctx, &format!("{}.aggregate.arg", path))?;
    let name = match kind {
        Count => "COUNT",
        Sum => "SUM",
        Avg => "AVG",
        Min => "MIN",
        Max => "MAX",
        CountStar => unreachable!(),
    };
    Ok(format!("{}({})", name, arg_sql))
}

fn compile_string_func(
    name: crate::ir::expr::StringFunc,
    args: &[ScalarExpr],
    ctx: &mut Context,
    path: &str,
) -> Result<String> {
    use crate::ir::expr::StringFunc::*;
    let sql_args = compile_args(args, ctx, path)?;
    Ok(match name {
        Concat => ctx.dialect.concat(&sql_args),
        Length => {
            expect_arity(&sql_args, 1, path)?;
            ctx.dialect.length(&sql_args[0])
        }
        Substring => {
            if sql_args.len() == 2 {
                ctx.dialect.substring(&sql_args[0], &sql_args[1], None)
            } else if sql_args.len() == 3 {
                ctx.dialect
                    .substring(&sql_args[0], &sql_args[1], Some(&sql_args[2]))
            } else {
                return Err(Error::arity_mismatch(
                    path,
                    "SUBSTRING takes either (value, start) or (value, start, length)",
                ));
            }
        }
        Upper => {
            expect_arity(&sql_args, 1, path)?;
            format!("UPPER({})", sql_args[0])
        }
        Lower => {
            expect_arity(&sql_args, 1, path)?;
            format!("LOWER({})", sql_args[0])
        }
        Trim => {
            expect_arity(&sql_args, 1, path)?;
            format!("TRIM({})", sql_args[0])
        }
    })
}

fn compile_math_func(
    name: crate::ir::expr::MathFunc,
    args: &[ScalarExpr],
    ctx: &mut Context,
    path: &str,
) -> Result<String> {
    use crate::ir::expr::MathFunc::*;
    let sql_args = compile_args(args, ctx, path)?;
    Ok(match name {
        Ceiling => {
            expect_arity(&sql_args, 1, path)?;
            ctx.dialect.ceiling(&sql_args[0])
        }
        Floor => {
            expect_arity(&sql_args, 1, path)?;
            ctx.dialect.floor(&sql_args[0])
        }
        Abs => {
            expect_arity(&sql_args, 1, path)?;
            format!("ABS({})", sql_args[0])
        }
        Round => {
            if sql_args.len() == 1 {
                format!("ROUND({})", sql_args[0])
            } else if sql_args.len() == 2 {
                format!("ROUND({}, {})", sql_args[0], sql_args[1])
            } else {
                return Err(Error::arity_mismatch(
                    path,
                    "ROUND takes either (value) or (value, digits)",
                ));
            }
        }
    })
}

fn compile_date_func(
    name: crate::ir::expr::DateFunc,
    args: &[ScalarExpr],
    ctx: &mut Context,
    path: &str,
) -> Result<String> {
    use crate::ir::expr::DateFunc::*;
    let sql_args = compile_args(args, ctx, path)?;
    Ok(match name {
        Now => {
            expect_arity(&sql_args, 0, path)?;
            ctx.dialect.now()
        }
        Year => {
            expect_arity(&sql_args, 1, path)?;
            ctx.dialect.year(&sql_args[0])
        }
        Month => {
            expect_arity(&sql_args, 1, path)?;
            ctx.dialect.month(&sql_args[0])
        }
        Day => {
            expect_arity(&sql_args, 1, path)?;
            ctx.dialect.day(&sql_args[0])
        }
        AddDays => {
            expect_arity(&sql_args, 2, path)?;
            ctx.dialect.add_days(&sql_args[0], &sql_args[1])
        }
        DiffDays => {
            expect_arity(&sql_args, 2, path)?;
            ctx.dialect.diff_days(&sql_args[0], &sql_args[1])
        }
        AddMonths => {
            expect_arity(&sql_args, 2, path)?;
            ctx.dialect.add_months(&sql_args[0], &sql_args[1])
        }
        AddYears => {
            expect_arity(&sql_args, 2, path)?;
            ctx.dialect.add_years(&sql_args[0], &sql_args[1])
        }
        DiffMonths => {
            expect_arity(&sql_args, 2, path)?;
            ctx.dialect.diff_months(&sql_args[0], &sql_args[1])
        }
        DiffYears => {
            expect_arity(&sql_args, 2, path)?;
            ctx.dialect.diff_years(&sql_args[0], &sql_args[1])
        }
    })
}

fn compile_args(args: &[ScalarExpr], ctx: &mut Context, path: &str) -> Result<Vec<String>> {
    args.iter()
        .enumerate()
        .map(|(i, a)| compile_expr(a, ctx, &format!("{}.args[{}]", path, i)))
        .collect()
}

fn expect_arity(args: &[String], n: usize, path: impl Into<String>) -> Result<()> {
    if args.len() != n {
        return Err(Error::arity_mismatch(
            path,
            format!("expected {} argument(s), found {}", n, args.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_long_are_numeric_compatible() {
        assert!(numeric_compatible(Kind::Int, Kind::Long));
        assert!(numeric_compatible(Kind::Long, Kind::Int));
        assert!(numeric_compatible(Kind::Int, Kind::Int));
        assert!(!numeric_compatible(Kind::Int, Kind::String));
    }

    #[test]
    fn and_rejects_non_bool_operands() {
        let left = ScalarExpr::constant(Value::Bool(true));
        let right = ScalarExpr::constant(Value::Int(1));
        let err = check_binary_kinds(BinOp::And, &left, &right, "test").unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));
    }

    #[test]
    fn arithmetic_accepts_int_long_mix_but_rejects_string() {
        let int = ScalarExpr::constant(Value::Int(1));
        let long = ScalarExpr::constant(Value::Long(2));
        assert!(check_binary_kinds(BinOp::Add, &int, &long, "test").is_ok());

        let s = ScalarExpr::constant(Value::String("x".into()));
        assert!(check_binary_kinds(BinOp::Add, &int, &s, "test").is_err());
    }

    #[test]
    fn right_associative_sub_is_parenthesised() {
        let mut ctx = Context::new(Dialect::Sqlite);
        let inner = ScalarExpr::constant(Value::Int(2)).sub(ScalarExpr::constant(Value::Int(3)));
        let outer = ScalarExpr::constant(Value::Int(1)).sub(inner);
        let sql = compile_expr(&outer, &mut ctx, "test").unwrap();
        assert!(sql.contains("- (:p1 - :p2)"));
    }

    #[test]
    fn left_nested_sub_is_not_parenthesised() {
        let mut ctx = Context::new(Dialect::Sqlite);
        let inner = ScalarExpr::constant(Value::Int(1)).sub(ScalarExpr::constant(Value::Int(2)));
        let outer = inner.sub(ScalarExpr::constant(Value::Int(3)));
        let sql = compile_expr(&outer, &mut ctx, "test").unwrap();
        assert!(!sql.contains('('));
    }

    #[test]
    fn postgres_inlines_bool_constant_other_dialects_bind_it() {
        let mut pg = Context::new(Dialect::Postgres);
        let sql = compile_const(&Value::Bool(false), &mut pg, "test").unwrap();
        assert_eq!(sql, "FALSE");
        assert_eq!(pg.into_params().len(), 0);

        let mut lite = Context::new(Dialect::Sqlite);
        let sql = compile_const(&Value::Bool(false), &mut lite, "test").unwrap();
        assert_eq!(sql, ":p0");
        assert_eq!(lite.into_params().len(), 1);
    }

    #[test]
    fn round_with_one_arg_omits_digits() {
        let mut ctx = Context::new(Dialect::Sqlite);
        let args = vec![ScalarExpr::constant(Value::Double(1.5))];
        let sql = compile_math_func(crate::ir::expr::MathFunc::Round, &args, &mut ctx, "test").unwrap();
        assert_eq!(sql, "ROUND(:p0)");
    }

    #[test]
    fn round_with_two_args_emits_digits() {
        let mut ctx = Context::new(Dialect::Sqlite);
        let args = vec![
            ScalarExpr::constant(Value::Double(1.5)),
            ScalarExpr::constant(Value::Int(2)),
        ];
        let sql = compile_math_func(crate::ir::expr::MathFunc::Round, &args, &mut ctx, "test").unwrap();
        assert_eq!(sql, "ROUND(:p0, :p1)");
    }

    #[test]
    fn round_rejects_three_args() {
        let mut ctx = Context::new(Dialect::Sqlite);
        let args = vec![
            ScalarExpr::constant(Value::Double(1.5)),
            ScalarExpr::constant(Value::Int(2)),
            ScalarExpr::constant(Value::Int(3)),
        ];
        let err = compile_math_func(crate::ir::expr::MathFunc::Round, &args, &mut ctx, "test").unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    #[test]
    fn ceiling_still_requires_exactly_one_arg() {
        let mut ctx = Context::new(Dialect::Sqlite);
        let args = vec![
            ScalarExpr::constant(Value::Double(1.5)),
            ScalarExpr::constant(Value::Int(2)),
        ];
        let err = compile_math_func(crate::ir::expr::MathFunc::Ceiling, &args, &mut ctx, "test").unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    fn sample_datetime(day: u32) -> Value {
        use chrono::NaiveDate;
        Value::DateTime(
            NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn add_months_and_add_years_dispatch_per_dialect() {
        use crate::ir::expr::DateFunc;
        let mut ss = Context::new(Dialect::SqlServer);
        let args = vec![
            ScalarExpr::constant(sample_datetime(1)),
            ScalarExpr::constant(Value::Int(3)),
        ];
        let sql = compile_date_func(DateFunc::AddMonths, &args, &mut ss, "test").unwrap();
        assert!(sql.starts_with("DATEADD(month,"));

        let mut pg = Context::new(Dialect::Postgres);
        let sql = compile_date_func(DateFunc::AddYears, &args, &mut pg, "test").unwrap();
        assert!(sql.contains("INTERVAL '1 year'"));
    }

    #[test]
    fn diff_months_and_diff_years_require_two_args() {
        use crate::ir::expr::DateFunc;
        let mut ctx = Context::new(Dialect::Sqlite);
        let one_arg = vec![ScalarExpr::constant(sample_datetime(1))];
        let err = compile_date_func(DateFunc::DiffMonths, &one_arg, &mut ctx, "test").unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));

        let two_args = vec![
            ScalarExpr::constant(sample_datetime(1)),
            ScalarExpr::constant(sample_datetime(15)),
        ];
        let sql = compile_date_func(DateFunc::DiffYears, &two_args, &mut ctx, "test").unwrap();
        assert!(sql.contains("strftime('%Y'"));
    }
}
