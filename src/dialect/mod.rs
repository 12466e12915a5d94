//! Dialect dispatch: one `Dialect` value selects a `Box<dyn DialectHandler>` whose default
//! methods are overridden per dialect. Grounded on the teacher's `sql::dialect::Dialect` enum
//! dispatching to `Box<dyn DialectHandler>`, trait methods with sensible ANSI defaults
//! overridden only where a dialect actually diverges.

mod postgres;
mod sqlite;
mod sqlserver;

use strum_macros::{Display, EnumString, VariantNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
pub enum Dialect {
    SqlServer,
    Sqlite,
    Postgres,
}

impl Dialect {
    fn handler(&self) -> &'static dyn DialectHandler {
        match self {
            Dialect::SqlServer => &sqlserver::SqlServerHandler,
            Dialect::Sqlite => &sqlite::SqliteHandler,
            Dialect::Postgres => &postgres::PostgresHandler,
        }
    }

    pub fn placeholder(&self, name: &str, position: usize) -> String {
        self.handler().placeholder(name, position)
    }
    pub fn quote_ident(&self, ident: &str) -> String {
        self.handler().quote_ident(ident)
    }
    pub fn bool_literal(&self, value: bool) -> String {
        self.handler().bool_literal(value)
    }
    pub fn null_literal(&self) -> &'static str {
        self.handler().null_literal()
    }
    pub fn string_literal(&self, s: &str) -> String {
        self.handler().string_literal(s)
    }
    pub fn concat(&self, args: &[String]) -> String {
        self.handler().concat(args)
    }
    pub fn length(&self, arg: &str) -> String {
        self.handler().length(arg)
    }
    pub fn substring(&self, s: &str, start: &str, len: Option<&str>) -> String {
        self.handler().substring(s, start, len)
    }
    pub fn now(&self) -> String {
        self.handler().now()
    }
    pub fn year(&self, arg: &str) -> String {
        self.handler().year(arg)
    }
    pub fn month(&self, arg: &str) -> String {
        self.handler().month(arg)
    }
    pub fn day(&self, arg: &str) -> String {
        self.handler().day(arg)
    }
    pub fn add_days(&self, date: &str, days: &str) -> String {
        self.handler().add_days(date, days)
    }
    pub fn diff_days(&self, start: &str, end: &str) -> String {
        self.handler().diff_days(start, end)
    }
    pub fn add_months(&self, date: &str, months: &str) -> String {
        self.handler().add_months(date, months)
    }
    pub fn add_years(&self, date: &str, years: &str) -> String {
        self.handler().add_years(date, years)
    }
    pub fn diff_months(&self, start: &str, end: &str) -> String {
        self.handler().diff_months(start, end)
    }
    pub fn diff_years(&self, start: &str, end: &str) -> String {
        self.handler().diff_years(start, end)
    }
    pub fn ceiling(&self, arg: &str) -> String {
        self.handler().ceiling(arg)
    }
    pub fn floor(&self, arg: &str) -> String {
        self.handler().floor(arg)
    }
    pub fn limit_offset(&self, limit: u64, offset: Option<u64>) -> String {
        self.handler().limit_offset(limit, offset)
    }
    pub fn requires_order_by_for_limit(&self) -> bool {
        self.handler().requires_order_by_for_limit()
    }
}

/// Per-dialect SQL surface. Every method has an ANSI-reasonable default; a dialect overrides
/// only the handful of functions/literals/clauses it actually does differently.
pub trait DialectHandler: Send + Sync {
    fn placeholder(&self, name: &str, position: usize) -> String {
        let _ = position;
        format!("@{}", name)
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "1".to_string() } else { "0".to_string() }
    }

    fn null_literal(&self) -> &'static str {
        "NULL"
    }

    fn string_literal(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn concat(&self, args: &[String]) -> String {
        format!("({})", args.join(" || "))
    }

    fn length(&self, arg: &str) -> String {
        format!("LENGTH({})", arg)
    }

    fn substring(&self, s: &str, start: &str, len: Option<&str>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({}, {}, {})", s, start, len),
            None => format!("SUBSTRING({}, {})", s, start),
        }
    }

    fn now(&self) -> String {
        "CURRENT_TIMESTAMP".to_string()
    }

    fn year(&self, arg: &str) -> String {
        format!("EXTRACT(YEAR FROM {})", arg)
    }
    fn month(&self, arg: &str) -> String {
        format!("EXTRACT(MONTH FROM {})", arg)
    }
    fn day(&self, arg: &str) -> String {
        format!("EXTRACT(DAY FROM {})", arg)
    }

    fn add_days(&self, date: &str, days: &str) -> String {
        format!("({} + {})", date, days)
    }
    fn diff_days(&self, start: &str, end: &str) -> String {
        format!("({} - {})", end, start)
    }

    fn add_months(&self, date: &str, months: &str) -> String {
        format!("({} + {})", date, months)
    }
    fn add_years(&self, date: &str, years: &str) -> String {
        format!("({} + {})", date, years)
    }
    fn diff_months(&self, start: &str, end: &str) -> String {
        format!("({} - {})", end, start)
    }
    fn diff_years(&self, start: &str, end: &str) -> String {
        format!("({} - {})", end, start)
    }

    fn ceiling(&self, arg: &str) -> String {
        format!("CEILING({})", arg)
    }
    fn floor(&self, arg: &str) -> String {
        format!("FLOOR({})", arg)
    }

    fn limit_offset(&self, limit: u64, offset: Option<u64>) -> String {
        match offset {
            Some(offset) => format!("LIMIT {} OFFSET {}", limit, offset),
            None => format!("LIMIT {}", limit),
        }
    }

    /// Whether a `LIMIT`/`OFFSET` clause requires a preceding `ORDER BY` in this dialect.
    fn requires_order_by_for_limit(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DefaultHandler;
    impl DialectHandler for DefaultHandler {}

    #[test]
    fn default_quote_ident_doubles_embedded_quotes() {
        let h = DefaultHandler;
        assert_eq!(h.quote_ident("plain"), "\"plain\"");
        assert_eq!(h.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn default_limit_offset_omits_offset_when_absent() {
        let h = DefaultHandler;
        assert_eq!(h.limit_offset(10, None), "LIMIT 10");
        assert_eq!(h.limit_offset(10, Some(5)), "LIMIT 10 OFFSET 5");
    }

    #[test]
    fn default_requires_order_by_for_limit_is_false() {
        let h = DefaultHandler;
        assert!(!h.requires_order_by_for_limit());
    }

    #[test]
    fn sqlserver_requires_order_by_but_sqlite_and_postgres_do_not() {
        assert!(Dialect::SqlServer.requires_order_by_for_limit());
        assert!(!Dialect::Sqlite.requires_order_by_for_limit());
        assert!(!Dialect::Postgres.requires_order_by_for_limit());
    }

    #[test]
    fn sqlserver_uses_at_prefix_sqlite_and_postgres_use_colon_prefix() {
        assert_eq!(Dialect::SqlServer.placeholder("x", 7), "@x");
        assert_eq!(Dialect::Sqlite.placeholder("x", 7), ":x");
        assert_eq!(Dialect::Postgres.placeholder("x", 7), ":x");
    }
}
