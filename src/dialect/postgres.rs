use super::DialectHandler;

pub struct PostgresHandler;

impl DialectHandler for PostgresHandler {
    fn placeholder(&self, name: &str, _position: usize) -> String {
        format!(":{}", name)
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "TRUE".to_string() } else { "FALSE".to_string() }
    }

    fn substring(&self, s: &str, start: &str, len: Option<&str>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({} FROM {} FOR {})", s, start, len),
            None => format!("SUBSTRING({} FROM {})", s, start),
        }
    }

    fn now(&self) -> String {
        "now()".to_string()
    }

    fn add_days(&self, date: &str, days: &str) -> String {
        format!("({} + ({}) * INTERVAL '1 day')", date, days)
    }
    fn diff_days(&self, start: &str, end: &str) -> String {
        format!("(({})::date - ({})::date)", end, start)
    }

    fn add_months(&self, date: &str, months: &str) -> String {
        format!("({} + ({}) * INTERVAL '1 month')", date, months)
    }
    fn add_years(&self, date: &str, years: &str) -> String {
        format!("({} + ({}) * INTERVAL '1 year')", date, years)
    }
    fn diff_months(&self, start: &str, end: &str) -> String {
        format!(
            "(EXTRACT(YEAR FROM AGE({end}, {start})) * 12 + EXTRACT(MONTH FROM AGE({end}, {start})))::bigint",
            start = start,
            end = end
        )
    }
    fn diff_years(&self, start: &str, end: &str) -> String {
        format!("EXTRACT(YEAR FROM AGE({}, {}))::bigint", end, start)
    }

    fn ceiling(&self, arg: &str) -> String {
        format!("CEIL({})", arg)
    }
}
