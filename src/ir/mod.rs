//! The relational query IR: [`expr`] for scalar expressions, [`query`] for the clause tree,
//! [`table`] for the caller-supplied schema contract, [`stmt`] for DML statements.
//!
//! This is the same "one enum variant per operator, carried kind, immutable, built bottom-up"
//! shape as a reference-compiler IR, specialised to a fixed, closed clause set instead of an
//! open pipeline of transforms.

pub mod expr;
pub mod ids;
pub mod query;
pub mod stmt;
pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar type a node resolves to. Carried directly on every node rather than inferred,
/// since there is no schema-wide type checker in this crate — each node states its own kind
/// and the compiler only ever checks agreement locally (see [`crate::Error::KindMismatch`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Int,
    Long,
    Double,
    Decimal,
    Bool,
    String,
    DateTime,
    Guid,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Int => "Int",
            Kind::Long => "Long",
            Kind::Double => "Double",
            Kind::Decimal => "Decimal",
            Kind::Bool => "Bool",
            Kind::String => "String",
            Kind::DateTime => "DateTime",
            Kind::Guid => "Guid",
        };
        f.write_str(s)
    }
}

pub use expr::{ExprKind, ScalarExpr};
pub use query::{OrderKey, Query, QueryKind, ScalarQuery, SetOp, Shape, ShapeField, TupleField};
pub use table::TableMeta;
