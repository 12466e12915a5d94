use super::DialectHandler;

pub struct SqlServerHandler;

impl DialectHandler for SqlServerHandler {
    fn placeholder(&self, name: &str, _position: usize) -> String {
        format!("@{}", name)
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "1".to_string() } else { "0".to_string() }
    }

    fn concat(&self, args: &[String]) -> String {
        format!("CONCAT({})", args.join(", "))
    }

    fn length(&self, arg: &str) -> String {
        format!("LEN({})", arg)
    }

    fn substring(&self, s: &str, start: &str, len: Option<&str>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({}, {}, {})", s, start, len),
            // T-SQL's SUBSTRING requires a length; LEN(s) is the idiomatic "to the end" stand-in.
            None => format!("SUBSTRING({}, {}, {})", s, start, self.length(s)),
        }
    }

    fn now(&self) -> String {
        "GETDATE()".to_string()
    }

    fn year(&self, arg: &str) -> String {
        format!("YEAR({})", arg)
    }
    fn month(&self, arg: &str) -> String {
        format!("MONTH({})", arg)
    }
    fn day(&self, arg: &str) -> String {
        format!("DAY({})", arg)
    }

    fn add_days(&self, date: &str, days: &str) -> String {
        format!("DATEADD(day, {}, {})", days, date)
    }
    fn diff_days(&self, start: &str, end: &str) -> String {
        format!("DATEDIFF(day, {}, {})", start, end)
    }

    fn add_months(&self, date: &str, months: &str) -> String {
        format!("DATEADD(month, {}, {})", months, date)
    }
    fn add_years(&self, date: &str, years: &str) -> String {
        format!("DATEADD(year, {}, {})", years, date)
    }
    fn diff_months(&self, start: &str, end: &str) -> String {
        format!("DATEDIFF(month, {}, {})", start, end)
    }
    fn diff_years(&self, start: &str, end: &str) -> String {
        format!("DATEDIFF(year, {}, {})", start, end)
    }

    fn limit_offset(&self, limit: u64, offset: Option<u64>) -> String {
        format!(
            "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            offset.unwrap_or(0),
            limit
        )
    }

    fn requires_order_by_for_limit(&self) -> bool {
        true
    }
}
