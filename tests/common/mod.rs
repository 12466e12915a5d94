//! Fixture schemas shared by the scenario tests: three small tables exercised across joins,
//! grouping, and subqueries. Field accessors are the caller-side "sugar" the crate's `TableMeta`
//! plumbing exists to support (out of scope for the crate itself, SPEC_FULL.md §6.2).
#![allow(dead_code)]

use relql::{Kind, Query, ScalarExpr, TableHandle, TableMeta};

pub struct Customers;

impl TableMeta for Customers {
    fn table_name(&self) -> &str {
        "customers"
    }
    fn columns(&self) -> &[(&'static str, Kind)] {
        &[("Id", Kind::Int), ("Name", Kind::String), ("Age", Kind::Int)]
    }
}

pub struct CustomersCols<'a>(pub &'a TableHandle);

impl<'a> CustomersCols<'a> {
    pub fn id(&self) -> ScalarExpr {
        self.0.column("Id", Kind::Int)
    }
    pub fn name(&self) -> ScalarExpr {
        self.0.column("Name", Kind::String)
    }
    pub fn age(&self) -> ScalarExpr {
        self.0.column("Age", Kind::Int)
    }
}

pub struct Orders;

impl TableMeta for Orders {
    fn table_name(&self) -> &str {
        "orders"
    }
    fn columns(&self) -> &[(&'static str, Kind)] {
        &[
            ("OrderId", Kind::Int),
            ("CustomerId", Kind::Int),
            ("Amount", Kind::Int),
        ]
    }
}

pub struct OrdersCols<'a>(pub &'a TableHandle);

impl<'a> OrdersCols<'a> {
    pub fn order_id(&self) -> ScalarExpr {
        self.0.column("OrderId", Kind::Int)
    }
    pub fn customer_id(&self) -> ScalarExpr {
        self.0.column("CustomerId", Kind::Int)
    }
    pub fn amount(&self) -> ScalarExpr {
        self.0.column("Amount", Kind::Int)
    }
}

pub struct Products;

impl TableMeta for Products {
    fn table_name(&self) -> &str {
        "products"
    }
    fn columns(&self) -> &[(&'static str, Kind)] {
        &[("Id", Kind::Int), ("ProductName", Kind::String)]
    }
}

pub struct ProductsCols<'a>(pub &'a TableHandle);

impl<'a> ProductsCols<'a> {
    pub fn id(&self) -> ScalarExpr {
        self.0.column("Id", Kind::Int)
    }
    pub fn product_name(&self) -> ScalarExpr {
        self.0.column("ProductName", Kind::String)
    }
}

pub fn from_customers() -> (Query, TableHandle) {
    Query::from_table(&Customers)
}
