//! Scalar expression IR.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::ir::ids::{QueryOccurrenceId, TableOccurrenceId};
use crate::ir::query::ScalarQuery;
use crate::ir::Kind;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarExpr {
    pub kind: ExprKind,
}

impl ScalarExpr {
    pub fn new(kind: ExprKind) -> Self {
        ScalarExpr { kind }
    }

    /// The kind this expression resolves to. Every variant carries (or trivially derives)
    /// its own kind, so this never needs table/scope information.
    pub fn kind_of(&self) -> Kind {
        match &self.kind {
            ExprKind::Const(v) => v.kind(),
            ExprKind::Param { value, .. } => value.kind(),
            ExprKind::Null(kind) => *kind,
            ExprKind::Column(c) => c.kind,
            ExprKind::Alias(a) => a.kind,
            ExprKind::Binary { op, left, .. } => op.result_kind(left.kind_of()),
            ExprKind::Unary { op, arg } => op.result_kind(arg.kind_of()),
            ExprKind::Case { then_expr, .. } => then_expr.kind_of(),
            ExprKind::In { .. } => Kind::Bool,
            ExprKind::InSubquery { .. } => Kind::Bool,
            ExprKind::Like { .. } => Kind::Bool,
            ExprKind::IsNull(_) => Kind::Bool,
            ExprKind::IsNotNull(_) => Kind::Bool,
            ExprKind::Aggregate { kind, arg } => kind.result_kind(arg.as_deref()),
            ExprKind::FuncString { name, .. } => name.result_kind(),
            ExprKind::FuncMath { name, args } => name.result_kind(args),
            ExprKind::FuncDate { name, .. } => name.result_kind(),
            ExprKind::ScalarQueryExpr(q) => q.kind(),
        }
    }

    // -- convenience constructors, mirroring the shape of a small fluent expression DSL --

    pub fn eq(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Eq, self, other)
    }
    pub fn ne(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Ne, self, other)
    }
    pub fn lt(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Lt, self, other)
    }
    pub fn le(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Le, self, other)
    }
    pub fn gt(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Gt, self, other)
    }
    pub fn ge(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Ge, self, other)
    }
    pub fn and(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::And, self, other)
    }
    pub fn or(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Or, self, other)
    }
    pub fn add(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Add, self, other)
    }
    pub fn sub(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Sub, self, other)
    }
    pub fn mul(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Mul, self, other)
    }
    pub fn div(self, other: ScalarExpr) -> ScalarExpr {
        binary(BinOp::Div, self, other)
    }
    pub fn not(self) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Unary {
            op: UnOp::Not,
            arg: Box::new(self),
        })
    }
    pub fn neg(self) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Unary {
            op: UnOp::Neg,
            arg: Box::new(self),
        })
    }
    pub fn is_null(self) -> ScalarExpr {
        ScalarExpr::new(ExprKind::IsNull(Box::new(self)))
    }
    pub fn is_not_null(self) -> ScalarExpr {
        ScalarExpr::new(ExprKind::IsNotNull(Box::new(self)))
    }
    pub fn like(self, pattern: ScalarExpr) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Like {
            value: Box::new(self),
            pattern: Box::new(pattern),
        })
    }
    pub fn in_list(self, items: Vec<ScalarExpr>) -> ScalarExpr {
        ScalarExpr::new(ExprKind::In {
            value: Box::new(self),
            items,
        })
    }
    pub fn in_subquery(self, query: ScalarQuery) -> ScalarExpr {
        ScalarExpr::new(ExprKind::InSubquery {
            value: Box::new(self),
            query: Box::new(query),
        })
    }

    pub fn constant(value: Value) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Const(value))
    }

    /// A named bind parameter: `value` is bound into the returned parameter map under
    /// `name` rather than inlined as a literal. Two `param` nodes sharing a name must carry
    /// the same value, or compilation fails with [`crate::Error::ParameterCollision`].
    pub fn param(name: impl Into<String>, value: Value) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Param {
            name: Some(name.into()),
            value,
        })
    }

    /// A bind parameter with a compiler-assigned synthetic name (`p0`, `p1`, ...).
    pub fn bound(value: Value) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Param { name: None, value })
    }
    pub fn null(kind: Kind) -> ScalarExpr {
        ScalarExpr::new(ExprKind::Null(kind))
    }
}

fn binary(op: BinOp, left: ScalarExpr, right: ScalarExpr) -> ScalarExpr {
    ScalarExpr::new(ExprKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize)]
pub enum ExprKind {
    Const(Value),
    Param {
        name: Option<String>,
        value: Value,
    },
    Null(Kind),
    Column(ColumnRef),
    Alias(AliasRef),
    Binary {
        op: BinOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    Unary {
        op: UnOp,
        arg: Box<ScalarExpr>,
    },
    Case {
        cond: Box<ScalarExpr>,
        then_expr: Box<ScalarExpr>,
        else_expr: Box<ScalarExpr>,
    },
    In {
        value: Box<ScalarExpr>,
        items: Vec<ScalarExpr>,
    },
    InSubquery {
        value: Box<ScalarExpr>,
        query: Box<ScalarQuery>,
    },
    Like {
        value: Box<ScalarExpr>,
        pattern: Box<ScalarExpr>,
    },
    IsNull(Box<ScalarExpr>),
    IsNotNull(Box<ScalarExpr>),
    Aggregate {
        kind: AggKind,
        arg: Option<Box<ScalarExpr>>,
    },
    FuncString {
        name: StringFunc,
        args: Vec<ScalarExpr>,
    },
    FuncMath {
        name: MathFunc,
        args: Vec<ScalarExpr>,
    },
    FuncDate {
        name: DateFunc,
        args: Vec<ScalarExpr>,
    },
    /// A scalar (single-row, single-column) subquery used as a value, e.g. `(SELECT MAX(x) ...)`.
    ScalarQueryExpr(Box<ScalarQuery>),
}

/// A reference to a column of a table occurrence in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub occurrence: TableOccurrenceId,
    pub name: String,
    pub kind: Kind,
}

/// A reference to one projected field of a materialised subquery, by position (and
/// optionally by name, when the field carries one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasRef {
    pub occurrence: QueryOccurrenceId,
    pub index: usize,
    pub name: Option<String>,
    pub kind: Kind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn result_kind(&self, left_kind: Kind) -> Kind {
        use BinOp::*;
        match self {
            Eq | Ne | Lt | Le | Gt | Ge | And | Or => Kind::Bool,
            Add | Sub | Mul | Div => left_kind,
        }
    }

    /// Whether this binds like a comparison, `AND`, `OR`, or arithmetic — used by the
    /// precedence-aware parenthesisation pass.
    pub fn precedence(&self) -> u8 {
        use BinOp::*;
        match self {
            Or => 0,
            And => 1,
            Eq | Ne | Lt | Le | Gt | Ge => 2,
            Add | Sub => 3,
            Mul | Div => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
}

impl UnOp {
    pub fn result_kind(&self, arg_kind: Kind) -> Kind {
        match self {
            UnOp::Not => Kind::Bool,
            UnOp::Neg => arg_kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggKind {
    Count,
    CountStar,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggKind {
    pub fn result_kind(&self, arg: Option<&ScalarExpr>) -> Kind {
        match self {
            AggKind::Count | AggKind::CountStar => Kind::Long,
            AggKind::Sum | AggKind::Avg => arg.map(|a| a.kind_of()).unwrap_or(Kind::Double),
            AggKind::Min | AggKind::Max => arg.map(|a| a.kind_of()).unwrap_or(Kind::Double),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringFunc {
    Concat,
    Length,
    Substring,
    Upper,
    Lower,
    Trim,
}

impl StringFunc {
    pub fn result_kind(&self) -> Kind {
        match self {
            StringFunc::Length => Kind::Long,
            _ => Kind::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathFunc {
    Ceiling,
    Floor,
    Abs,
    Round,
}

impl MathFunc {
    pub fn result_kind(&self, args: &[ScalarExpr]) -> Kind {
        args.first().map(|a| a.kind_of()).unwrap_or(Kind::Double)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFunc {
    Now,
    Year,
    Month,
    Day,
    AddDays,
    AddMonths,
    AddYears,
    DiffDays,
    DiffMonths,
    DiffYears,
}

impl DateFunc {
    pub fn result_kind(&self) -> Kind {
        match self {
            DateFunc::Now | DateFunc::AddDays | DateFunc::AddMonths | DateFunc::AddYears => {
                Kind::DateTime
            }
            DateFunc::Year
            | DateFunc::Month
            | DateFunc::Day
            | DateFunc::DiffDays
            | DateFunc::DiffMonths
            | DateFunc::DiffYears => Kind::Long,
        }
    }
}
