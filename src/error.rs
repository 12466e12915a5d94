//! Compile-time error type.
//!
//! Every failure in this crate happens while walking a caller-constructed tree, never while
//! executing anything. There is no partial compilation and nothing is retried: the first
//! violated rule aborts the whole `to_sql` call (see SPEC_FULL.md §4.7, §7).

use thiserror::Error;

/// A single compile-time failure, reported at the `to_sql` boundary.
///
/// Each variant carries a `path`: a dotted description of where in the caller's tree the
/// violation was found (e.g. `select.where.predicate`), since there is no source text for a
/// span to point into.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("unresolved reference at `{path}`: {detail}")]
    UnresolvedReference { path: String, detail: String },

    #[error("kind mismatch at `{path}`: {detail}")]
    KindMismatch { path: String, detail: String },

    #[error("arity mismatch at `{path}`: {detail}")]
    ArityMismatch { path: String, detail: String },

    #[error("parameter collision at `{path}`: `{name}` is already bound to a different value")]
    ParameterCollision { path: String, name: String },

    #[error("invalid grouping at `{path}`: {detail}")]
    InvalidGrouping { path: String, detail: String },

    #[error("invalid limit at `{path}`: {detail}")]
    InvalidLimit { path: String, detail: String },
}

impl Error {
    pub fn unresolved(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::UnresolvedReference {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn kind_mismatch(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::KindMismatch {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn arity_mismatch(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::ArityMismatch {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn param_collision(path: impl Into<String>, name: impl Into<String>) -> Self {
        Error::ParameterCollision {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn invalid_grouping(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::InvalidGrouping {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_limit(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::InvalidLimit {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
