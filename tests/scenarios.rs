//! End-to-end scenarios: build a tree through the public fluent API, compile it against one or
//! more dialects, and check the resulting SQL text and parameter bag.

mod common;

use rstest::rstest;

use common::{from_customers, CustomersCols, Orders, OrdersCols};

use relql::{
    AggKind, Compile, Delete, Dialect, Error, ExprKind, Insert, JoinKind, Kind, OrderDir,
    OrderKey, Query, ScalarExpr, ScalarQuery, TupleField, Update, Value,
};

#[test]
fn where_order_select_binds_literals_as_parameters() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let filtered = Query::where_(base, cols.age().gt(ScalarExpr::constant(Value::Int(18))));
    let ordered = Query::order_by(
        filtered,
        vec![OrderKey {
            expr: cols.name(),
            dir: OrderDir::Asc,
        }],
    );
    let projected = Query::select(
        ordered,
        vec![
            TupleField::named("IdPlusOne", cols.id().add(ScalarExpr::constant(Value::Int(1)))),
            TupleField::unnamed(cols.name()),
        ],
    );

    let compiled = projected.to_sql_server().expect("compiles");
    assert!(compiled.sql.contains("SELECT"));
    assert!(compiled.sql.contains("WHERE"));
    assert!(compiled.sql.contains("ORDER BY"));
    assert!(compiled.sql.contains("@p0"));
    assert!(compiled.sql.contains("@p1"));
    // Projections render before WHERE in this compiler, so the id+1 literal binds first.
    assert_eq!(compiled.params.get("@p0").unwrap().value, Value::Int(1));
    assert_eq!(compiled.params.get("@p1").unwrap().value, Value::Int(18));
}

#[test]
fn postgres_inlines_bool_literal_other_dialects_parameterise() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let pred = cols
        .age()
        .gt(ScalarExpr::constant(Value::Int(18)))
        .and(ScalarExpr::constant(Value::Bool(true)));
    let query = Query::where_(base, pred);

    let pg = query.clone().to_postgres().expect("compiles");
    assert!(pg.sql.contains("TRUE"));
    assert!(pg.params.len() == 1, "postgres should not bind the boolean");

    let ss = query.clone().to_sql_server().expect("compiles");
    assert!(ss.params.len() == 2, "sqlserver binds the boolean as @p1");
    assert_eq!(ss.params.get("@p1").unwrap().value, Value::Bool(true));

    let lite = query.to_sqlite().expect("compiles");
    assert!(lite.sql.contains(":p1"));
}

#[test]
fn invalid_grouping_rejected_on_sqlserver_but_allowed_on_sqlite() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let grouped = Query::group_by(base, vec![cols.id()]);
    let projected = Query::select(
        grouped,
        vec![TupleField::unnamed(cols.id()), TupleField::unnamed(cols.name())],
    );

    let err = projected.clone().to_sql_server().unwrap_err();
    assert!(matches!(err, Error::InvalidGrouping { .. }));

    let ok = projected.to_sqlite();
    assert!(ok.is_ok(), "sqlite is permissive about ungrouped columns");
}

#[test]
fn join_group_by_having_order_and_limit() {
    let (base, customers) = from_customers();
    let customers_cols = CustomersCols(&customers);
    let (joined, orders) = Query::join(base, JoinKind::Inner, &Orders, |orders_handle| {
        let orders_cols = OrdersCols(orders_handle);
        customers_cols.id().eq(orders_cols.customer_id())
    });
    let orders_cols = OrdersCols(&orders);

    let grouped = Query::group_by(joined, vec![customers_cols.id()]);
    let total = ScalarExpr::new(ExprKind::Aggregate {
        kind: AggKind::Sum,
        arg: Some(Box::new(orders_cols.amount())),
    });
    let having = Query::having(
        grouped,
        total.clone().gt(ScalarExpr::constant(Value::Int(100))),
    );
    let ordered = Query::order_by(
        having,
        vec![OrderKey {
            expr: customers_cols.id(),
            dir: OrderDir::Desc,
        }],
    );
    let limited = Query::limit(ordered, 10, None);
    let projected = Query::select(
        limited,
        vec![
            TupleField::unnamed(customers_cols.id()),
            TupleField::named("Total", total),
        ],
    );

    let compiled = projected.to_sqlite().expect("compiles");
    assert!(compiled.sql.contains("INNER JOIN"));
    assert!(compiled.sql.contains("GROUP BY"));
    assert!(compiled.sql.contains("HAVING"));
    assert!(compiled.sql.contains("ORDER BY"));
    assert!(compiled.sql.contains("LIMIT 10"));
    assert!(compiled.sql.contains("SUM("));
}

#[test]
fn correlated_in_subquery_resolves_outer_column() {
    let (base, customers) = from_customers();
    let customers_cols = CustomersCols(&customers);
    let (orders_base, orders) = Query::from_table(&Orders);
    let orders_cols = OrdersCols(&orders);
    let filtered_orders = Query::where_(
        orders_base,
        orders_cols.customer_id().eq(customers_cols.id()),
    );
    let projected_orders = Query::select(
        filtered_orders,
        vec![TupleField::unnamed(orders_cols.customer_id())],
    );
    let scalar = ScalarQuery::new(projected_orders).expect("single column projection");
    let pred = customers_cols.id().in_subquery(scalar);
    let query = Query::where_(base, pred);

    let compiled = query.to_sql_server().expect("compiles");
    assert!(compiled.sql.matches("SELECT").count() == 2);
    assert!(compiled.sql.contains(" IN ("));
}

#[test]
fn empty_projection_list_is_rejected() {
    let (base, _customers) = from_customers();
    let projected = Query::select(base, vec![]);
    let err = projected.to_sql_server().unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { .. }));
}

#[test]
fn empty_in_list_is_rejected() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let pred = cols.id().in_list(vec![]);
    let query = Query::where_(base, pred);
    let err = query.to_sql_server().unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { .. }));
}

#[test]
fn mismatched_arithmetic_kinds_rejected() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let projected = Query::select(base, vec![TupleField::unnamed(cols.id().add(cols.name()))]);
    let err = projected.to_sql_server().unwrap_err();
    assert!(matches!(err, Error::KindMismatch { .. }));
}

#[test]
fn logical_operator_requires_bool_operands() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let pred = cols
        .age()
        .gt(ScalarExpr::constant(Value::Int(18)))
        .and(cols.name());
    let query = Query::where_(base, pred);
    let err = query.to_sql_server().unwrap_err();
    assert!(matches!(err, Error::KindMismatch { .. }));
}

#[test]
fn parameter_collision_same_name_different_value() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let pred = cols
        .age()
        .eq(ScalarExpr::param("dup", Value::Int(1)))
        .and(cols.age().eq(ScalarExpr::param("dup", Value::Int(2))));
    let query = Query::where_(base, pred);
    let err = query.to_sql_server().unwrap_err();
    assert!(matches!(err, Error::ParameterCollision { .. }));
}

#[test]
fn sqlserver_requires_order_by_before_limit() {
    let (base, _customers) = from_customers();
    let limited = Query::limit(base, 10, None);

    let err = limited.clone().to_sql_server().unwrap_err();
    assert!(matches!(err, Error::InvalidLimit { .. }));

    assert!(limited.clone().to_sqlite().is_ok());
    assert!(limited.to_postgres().is_ok());
}

#[test]
fn limit_zero_is_allowed_with_order_by() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let ordered = Query::order_by(
        base,
        vec![OrderKey {
            expr: cols.id(),
            dir: OrderDir::Asc,
        }],
    );
    let limited = Query::limit(ordered, 0, None);
    let compiled = limited.to_sqlite().expect("limit 0 is valid");
    assert!(compiled.sql.contains("LIMIT 0"));
}

#[test]
fn insert_statement_binds_every_value() {
    let stmt = Insert::new(&common::Customers)
        .set("Name", Kind::String, ScalarExpr::constant(Value::String("Ada".into())))
        .set("Age", Kind::Int, ScalarExpr::constant(Value::Int(30)));

    let compiled = stmt.to_sql_server().expect("compiles");
    assert!(compiled.sql.contains("INSERT INTO"));
    assert!(compiled.sql.contains("VALUES"));
    assert_eq!(compiled.params.len(), 2);
}

#[test]
fn update_statement_compiles_set_and_where() {
    let (stmt, handle) = Update::new(&common::Customers);
    let cols = CustomersCols(&handle);
    let stmt = stmt
        .set("Name", ScalarExpr::constant(Value::String("Bob".into())))
        .where_(cols.id().eq(ScalarExpr::constant(Value::Int(5))));

    let compiled = stmt.to_sqlite().expect("compiles");
    assert!(compiled.sql.contains("UPDATE"));
    assert!(compiled.sql.contains("SET"));
    assert!(compiled.sql.contains("WHERE"));
    assert!(compiled.sql.contains(":p0"));
    assert!(compiled.sql.contains(":p1"));
}

#[test]
fn delete_statement_compiles_predicate() {
    let (stmt, handle) = Delete::new(&common::Customers);
    let cols = CustomersCols(&handle);
    let stmt = stmt.where_(cols.age().lt(ScalarExpr::constant(Value::Int(18))));

    let compiled = stmt.to_postgres().expect("compiles");
    assert!(compiled.sql.contains("DELETE FROM"));
    assert!(compiled.sql.contains(":p0"));
}

#[test]
fn insert_statement_exact_text() {
    let stmt = Insert::new(&common::Customers)
        .set("Name", Kind::String, ScalarExpr::constant(Value::String("Ada".into())))
        .set("Age", Kind::Int, ScalarExpr::constant(Value::Int(30)));

    let compiled = stmt.to_sql_server().expect("compiles");
    similar_asserts::assert_eq!(
        compiled.sql,
        "INSERT INTO [customers] ([Name], [Age])\nVALUES (@p0, @p1)"
    );
}

#[rstest]
#[case(Dialect::SqlServer, "@p0")]
#[case(Dialect::Sqlite, ":p0")]
#[case(Dialect::Postgres, ":p0")]
fn dialect_placeholder_syntax_sweep(#[case] dialect: Dialect, #[case] expected_placeholder: &str) {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let query = Query::where_(base, cols.age().gt(ScalarExpr::constant(Value::Int(18))));
    let compiled = query.to_sql(dialect).expect("compiles");
    assert!(compiled.sql.contains(expected_placeholder));
}

#[test]
fn snapshot_simple_select_where() {
    let (base, customers) = from_customers();
    let cols = CustomersCols(&customers);
    let filtered = Query::where_(base, cols.age().gt(ScalarExpr::constant(Value::Int(18))));
    let projected = Query::select(
        filtered,
        vec![TupleField::unnamed(cols.id()), TupleField::unnamed(cols.name())],
    );

    let compiled = projected.to_sqlite().expect("compiles");
    insta::assert_snapshot!(
        compiled.sql,
        @"SELECT\n    a0.Id,\n    a0.Name\nFROM \"customers\" AS a0\nWHERE\n    a0.Age > :p0"
    );
}
