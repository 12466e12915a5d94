//! Constant values that can appear in a compiled tree, either inline or bound as a parameter.

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ir::Kind;

/// A concrete value, tagged with the [`Kind`] it carries.
///
/// `Value::kind` must always agree with the `Kind` stored alongside it wherever a `Value`
/// is paired with one (e.g. in [`crate::ir::expr::ExprKind::Const`] or [`BoundParam`]); the
/// compiler checks this at every such site and reports [`crate::Error::KindMismatch`] rather
/// than silently coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    Decimal(BigDecimal),
    Bool(bool),
    String(String),
    DateTime(NaiveDateTime),
    Guid(Uuid),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::Long(_) => Kind::Long,
            Value::Double(_) => Kind::Double,
            Value::Decimal(_) => Kind::Decimal,
            Value::Bool(_) => Kind::Bool,
            Value::String(_) => Kind::String,
            Value::DateTime(_) => Kind::DateTime,
            Value::Guid(_) => Kind::Guid,
        }
    }
}

/// A value bound into the parameter map returned alongside compiled SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: Value,
    pub kind: Kind,
}

impl BoundParam {
    pub fn new(value: Value) -> Self {
        let kind = value.kind();
        BoundParam { value, kind }
    }
}
