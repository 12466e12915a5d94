//! DML statement compilation: INSERT/UPDATE/DELETE, reusing `Context` and dialect plumbing.
//! The teacher's reference compiler has no DML surface (it only ever emits `SELECT`), so this
//! module is this crate's own extension, built in the same idiom: a flat clause-assembly
//! function per statement shape.

use itertools::Itertools;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::gen_expr::compile_expr;
use crate::ir::stmt::{Delete, Insert, Update};

pub fn compile_insert(stmt: &Insert, ctx: &mut Context) -> Result<String> {
    if stmt.columns.is_empty() {
        return Err(Error::arity_mismatch("insert", "at least one column must be set"));
    }
    let columns = stmt.columns.iter().map(|(n, _)| ctx.dialect.quote_ident(n)).join(", ");
    let values = stmt
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| compile_expr(v, ctx, &format!("insert.values[{}]", i)))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    Ok(format!(
        "INSERT INTO {} ({})\nVALUES ({})",
        ctx.dialect.quote_ident(&stmt.table_name),
        columns,
        values
    ))
}

pub fn compile_update(stmt: &Update, ctx: &mut Context) -> Result<String> {
    if stmt.assignments.is_empty() {
        return Err(Error::arity_mismatch("update", "at least one assignment is required"));
    }
    let quoted_table = ctx.dialect.quote_ident(&stmt.table_name);
    ctx.push_table_scope(stmt.occurrence, quoted_table.clone());
    let assignments = stmt
        .assignments
        .iter()
        .enumerate()
        .map(|(i, (col, expr))| {
            let sql = compile_expr(expr, ctx, &format!("update.set[{}]", i))?;
            Ok(format!("{} = {}", ctx.dialect.quote_ident(col), sql))
        })
        .collect::<Result<Vec<_>>>()?
        .join(",\n    ");
    let mut sql = format!("UPDATE {}\nSET {}", quoted_table, assignments);
    if let Some(pred) = &stmt.predicate {
        let pred_sql = compile_expr(pred, ctx, "update.where")?;
        sql.push_str(&format!("\nWHERE\n    {}", pred_sql));
    }
    ctx.pop_scope();
    Ok(sql)
}

pub fn compile_delete(stmt: &Delete, ctx: &mut Context) -> Result<String> {
    let quoted_table = ctx.dialect.quote_ident(&stmt.table_name);
    ctx.push_table_scope(stmt.occurrence, quoted_table.clone());
    let mut sql = format!("DELETE FROM {}", quoted_table);
    if let Some(pred) = &stmt.predicate {
        let pred_sql = compile_expr(pred, ctx, "delete.where")?;
        sql.push_str(&format!("\nWHERE\n    {}", pred_sql));
    }
    ctx.pop_scope();
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::ir::expr::ScalarExpr;
    use crate::ir::table::TableMeta;
    use crate::ir::Kind;
    use crate::value::Value;

    struct TestTable;
    impl TableMeta for TestTable {
        fn table_name(&self) -> &str {
            "widgets"
        }
        fn columns(&self) -> &[(&'static str, Kind)] {
            &[("id", Kind::Int), ("name", Kind::String)]
        }
    }

    #[test]
    fn compile_insert_rejects_no_columns() {
        let stmt = Insert::new(&TestTable);
        let mut ctx = Context::new(Dialect::Sqlite);
        let err = compile_insert(&stmt, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    #[test]
    fn compile_insert_binds_each_value_in_column_order() {
        let stmt = Insert::new(&TestTable)
            .set("name", Kind::String, ScalarExpr::constant(Value::String("x".into())))
            .set("id", Kind::Int, ScalarExpr::constant(Value::Int(1)));
        let mut ctx = Context::new(Dialect::Sqlite);
        let sql = compile_insert(&stmt, &mut ctx).unwrap();
        assert_eq!(sql, "INSERT INTO \"widgets\" (\"name\", \"id\")\nVALUES (:p0, :p1)");
    }

    #[test]
    fn compile_update_rejects_no_assignments() {
        let (stmt, _handle) = Update::new(&TestTable);
        let mut ctx = Context::new(Dialect::Sqlite);
        let err = compile_update(&stmt, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    #[test]
    fn compile_update_resolves_where_column_against_its_own_table_scope() {
        let (stmt, handle) = Update::new(&TestTable);
        let stmt = stmt
            .set("name", ScalarExpr::constant(Value::String("y".into())))
            .where_(handle.column("id", Kind::Int).eq(ScalarExpr::constant(Value::Int(7))));
        let mut ctx = Context::new(Dialect::Postgres);
        let sql = compile_update(&stmt, &mut ctx).unwrap();
        assert!(sql.contains("\"widgets\".id = :p1"));
    }

    #[test]
    fn compile_delete_resolves_predicate_column() {
        let (stmt, handle) = Delete::new(&TestTable);
        let stmt = stmt.where_(handle.column("id", Kind::Int).gt(ScalarExpr::constant(Value::Int(0))));
        let mut ctx = Context::new(Dialect::SqlServer);
        let sql = compile_delete(&stmt, &mut ctx).unwrap();
        assert!(sql.contains("[widgets].id > @p0"));
    }
}
