//! Compile-time context: parameter bag, alias allocator, and the scope stack used to resolve
//! column and subquery-alias references.
//!
//! Grounded on the teacher's `sql::Context`/`QueryOpts` (a push/pop stack of query-local
//! options threaded through compilation) and `utils::id_gen::IdGenerator<T>` (the monotonic
//! counter pattern reused here for table aliases and synthetic parameter names).

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ir::ids::{QueryOccurrenceId, TableOccurrenceId};
use crate::ir::query::ShapeField;
use crate::utils::id_gen::NameGenerator;
use crate::value::{BoundParam, Value};

/// One entry of the scope stack. Pushed when a `FromTable`, join table, or materialised
/// subquery enters scope; popped when compilation of that block is done. Resolution walks
/// the stack inner-to-outer, which is what gives `InSubquery` predicates closure-style access
/// to the enclosing query's columns: the inner scalar query is compiled without popping the
/// outer frames first.
enum ScopeFrame {
    Table {
        occurrence: TableOccurrenceId,
        alias: String,
    },
    Subquery {
        occurrence: QueryOccurrenceId,
        alias: String,
        shape: Vec<ShapeField>,
        /// Bare-column fields of `shape` that pass an outer table's column through unchanged,
        /// keyed by the original `(table_occurrence, column_name)` so references written
        /// against the pre-materialisation tree keep resolving once this boundary is
        /// inserted by the normaliser.
        passthrough: HashMap<(TableOccurrenceId, String), usize>,
    },
}

pub struct Context {
    pub dialect: Dialect,
    params: IndexMap<String, BoundParam>,
    synthetic_param_names: NameGenerator,
    table_aliases: NameGenerator,
    scope: Vec<ScopeFrame>,
}

impl Context {
    pub fn new(dialect: Dialect) -> Self {
        Context {
            dialect,
            params: IndexMap::new(),
            synthetic_param_names: NameGenerator::new("p"),
            table_aliases: NameGenerator::new("a"),
            scope: Vec::new(),
        }
    }

    pub fn into_params(self) -> IndexMap<String, BoundParam> {
        self.params
    }

    /// Allocates the next `aN` table alias. Monotonic across the whole compile, never reused
    /// and never reset by entering/leaving a nested scope.
    pub fn fresh_table_alias(&mut self) -> String {
        self.table_aliases.gen()
    }

    pub fn push_table_scope(&mut self, occurrence: TableOccurrenceId, alias: String) {
        self.scope.push(ScopeFrame::Table { occurrence, alias });
    }

    pub fn push_subquery_scope(
        &mut self,
        occurrence: QueryOccurrenceId,
        alias: String,
        shape: Vec<ShapeField>,
        passthrough: HashMap<(TableOccurrenceId, String), usize>,
    ) {
        self.scope.push(ScopeFrame::Subquery {
            occurrence,
            alias,
            shape,
            passthrough,
        });
    }

    pub fn pop_scope(&mut self) {
        self.scope.pop();
    }

    pub fn resolve_column(
        &self,
        occurrence: TableOccurrenceId,
        name: &str,
        path: &str,
    ) -> Result<String> {
        for frame in self.scope.iter().rev() {
            match frame {
                ScopeFrame::Table {
                    occurrence: o,
                    alias,
                } if *o == occurrence => {
                    return Ok(format!("{}.{}", alias, name));
                }
                ScopeFrame::Subquery {
                    alias, passthrough, ..
                } => {
                    if let Some(&index) = passthrough.get(&(occurrence, name.to_string())) {
                        let _ = index;
                        return Ok(format!("{}.{}", alias, name));
                    }
                }
                _ => {}
            }
        }
        Err(Error::unresolved(
            path,
            format!("column `{}` refers to a table that is not in scope here", name),
        ))
    }

    pub fn resolve_alias(
        &self,
        occurrence: QueryOccurrenceId,
        index: usize,
        field_name: Option<&str>,
        path: &str,
    ) -> Result<String> {
        for frame in self.scope.iter().rev() {
            if let ScopeFrame::Subquery {
                occurrence: o,
                alias,
                shape,
                ..
            } = frame
            {
                if *o == occurrence {
                    let name = shape
                        .get(index)
                        .and_then(|f| f.name.clone())
                        .or_else(|| field_name.map(|s| s.to_string()))
                        .unwrap_or_else(|| format!("Proj{}", index));
                    return Ok(format!("{}.{}", alias, name));
                }
            }
        }
        Err(Error::unresolved(
            path,
            "subquery reference points at a materialised query that is not in scope here",
        ))
    }

    /// Binds a value into the parameter map, returning the dialect-formatted placeholder. The
    /// map is keyed by that placeholder (prefix included — `@p0`, `:p0`, ...), not the bare
    /// name, so the keys `Compiled::params` returns match the placeholders actually sitting in
    /// the emitted SQL text (SPEC_FULL.md §6.4, §8 property 2).
    ///
    /// `name_hint` is used verbatim when given (a caller-named parameter); otherwise a fresh
    /// synthetic `pN` name is minted. A collision — the same name bound twice with different
    /// values — is an error rather than a silent overwrite (SPEC_FULL.md §4.1).
    pub fn bind_param(
        &mut self,
        name_hint: Option<&str>,
        value: Value,
        path: &str,
    ) -> Result<String> {
        let name = match name_hint {
            Some(n) => n.to_string(),
            None => self.synthetic_param_names.gen(),
        };
        let position = self.params.len() + 1;
        let placeholder = self.dialect.placeholder(&name, position);
        let bound = BoundParam::new(value);
        match self.params.get(&placeholder) {
            Some(existing) if *existing != bound => {
                return Err(Error::param_collision(path, name));
            }
            Some(_) => {}
            None => {
                self.params.insert(placeholder.clone(), bound);
            }
        }
        Ok(placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_param_names_are_monotonic() {
        let mut ctx = Context::new(Dialect::SqlServer);
        let first = ctx.bind_param(None, Value::Int(1), "p").unwrap();
        let second = ctx.bind_param(None, Value::Int(2), "p").unwrap();
        assert_eq!(first, "@p0");
        assert_eq!(second, "@p1");
    }

    #[test]
    fn rebinding_same_name_same_value_is_not_a_collision() {
        let mut ctx = Context::new(Dialect::Postgres);
        ctx.bind_param(Some("x"), Value::Int(5), "p").unwrap();
        let again = ctx.bind_param(Some("x"), Value::Int(5), "p");
        assert!(again.is_ok());
        assert_eq!(ctx.params.len(), 1);
    }

    #[test]
    fn rebinding_same_name_different_value_is_a_collision() {
        let mut ctx = Context::new(Dialect::Postgres);
        ctx.bind_param(Some("x"), Value::Int(5), "p").unwrap();
        let err = ctx.bind_param(Some("x"), Value::Int(6), "p").unwrap_err();
        assert!(matches!(err, Error::ParameterCollision { .. }));
    }

    #[test]
    fn postgres_placeholders_are_colon_prefixed_like_sqlite() {
        let mut ctx = Context::new(Dialect::Postgres);
        let first = ctx.bind_param(None, Value::Int(1), "p").unwrap();
        let second = ctx.bind_param(None, Value::Int(2), "p").unwrap();
        assert_eq!(first, ":p0");
        assert_eq!(second, ":p1");
    }

    #[test]
    fn params_map_is_keyed_by_the_prefixed_placeholder() {
        let mut ctx = Context::new(Dialect::SqlServer);
        let placeholder = ctx.bind_param(Some("minAge"), Value::Int(18), "p").unwrap();
        assert_eq!(placeholder, "@minAge");
        assert!(ctx.params.contains_key("@minAge"));
        assert!(!ctx.params.contains_key("minAge"));
    }

    #[test]
    fn fresh_table_aliases_are_monotonic_and_independent_of_params() {
        let mut ctx = Context::new(Dialect::Sqlite);
        assert_eq!(ctx.fresh_table_alias(), "a0");
        assert_eq!(ctx.fresh_table_alias(), "a1");
    }
}
