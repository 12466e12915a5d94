use super::DialectHandler;

pub struct SqliteHandler;

impl DialectHandler for SqliteHandler {
    fn placeholder(&self, name: &str, _position: usize) -> String {
        format!(":{}", name)
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "1".to_string() } else { "0".to_string() }
    }

    fn substring(&self, s: &str, start: &str, len: Option<&str>) -> String {
        match len {
            Some(len) => format!("SUBSTR({}, {}, {})", s, start, len),
            None => format!("SUBSTR({}, {})", s, start),
        }
    }

    fn now(&self) -> String {
        "datetime('now')".to_string()
    }

    fn year(&self, arg: &str) -> String {
        format!("CAST(strftime('%Y', {}) AS INTEGER)", arg)
    }
    fn month(&self, arg: &str) -> String {
        format!("CAST(strftime('%m', {}) AS INTEGER)", arg)
    }
    fn day(&self, arg: &str) -> String {
        format!("CAST(strftime('%d', {}) AS INTEGER)", arg)
    }

    fn add_days(&self, date: &str, days: &str) -> String {
        format!("datetime({}, '+' || {} || ' days')", date, days)
    }
    fn diff_days(&self, start: &str, end: &str) -> String {
        format!("CAST(julianday({}) - julianday({}) AS INTEGER)", end, start)
    }

    fn add_months(&self, date: &str, months: &str) -> String {
        format!("datetime({}, '+' || {} || ' months')", date, months)
    }
    fn add_years(&self, date: &str, years: &str) -> String {
        format!("datetime({}, '+' || {} || ' years')", date, years)
    }
    fn diff_months(&self, start: &str, end: &str) -> String {
        format!(
            "CAST((strftime('%Y', {end}) - strftime('%Y', {start})) * 12 + \
             (strftime('%m', {end}) - strftime('%m', {start})) AS INTEGER)",
            start = start,
            end = end
        )
    }
    fn diff_years(&self, start: &str, end: &str) -> String {
        format!(
            "CAST(strftime('%Y', {}) - strftime('%Y', {}) AS INTEGER)",
            end, start
        )
    }

    // Plain SQLite has no CEIL/FLOOR builtins; simulate both over an integer cast.
    fn ceiling(&self, arg: &str) -> String {
        format!(
            "(CASE WHEN {arg} > CAST({arg} AS INTEGER) THEN CAST({arg} AS INTEGER) + 1 ELSE CAST({arg} AS INTEGER) END)",
            arg = arg
        )
    }
    fn floor(&self, arg: &str) -> String {
        format!("CAST(CAST({arg} AS INTEGER) AS REAL)", arg = arg)
    }
}
