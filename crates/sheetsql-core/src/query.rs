//! Sheet selection from query text
//!
//! Only `SELECT ... FROM <sheet>` is understood: the sheet name is whatever
//! follows the first `FROM` keyword. Column lists are not interpreted.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SqlError};

fn from_clause() -> Option<&'static Regex> {
    static FROM_RE: OnceLock<Option<Regex>> = OnceLock::new();
    FROM_RE
        .get_or_init(|| Regex::new(r"(?i)\bFROM\s+(.*)$").ok())
        .as_ref()
}

fn strip_quotes(name: &str) -> &str {
    for (open, close) in [('"', '"'), ('\'', '\''), ('`', '`'), ('[', ']')] {
        if name.len() >= 2 && name.starts_with(open) && name.ends_with(close) {
            return &name[open.len_utf8()..name.len() - close.len_utf8()];
        }
    }
    name
}

/// Extract the sheet name a query selects from
///
/// ```rust
/// use sheetsql_core::query::sheet_name;
///
/// assert_eq!(sheet_name("SELECT * FROM Sheet1").unwrap(), "Sheet1");
/// assert_eq!(sheet_name("select a from [Q1 Sales];").unwrap(), "Q1 Sales");
/// assert!(sheet_name("SELECT 1").is_err());
/// ```
pub fn sheet_name(sql: &str) -> Result<String> {
    let re = from_clause()
        .ok_or_else(|| SqlError::MalformedQuery("query pattern unavailable".to_string()))?;

    let line = sql.trim();
    let captured = line
        .lines()
        .find_map(|l| re.captures(l))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| SqlError::MalformedQuery(format!("no FROM clause in '{}'", sql)))?;

    let name = captured.trim().trim_end_matches(';').trim_end();
    let name = strip_quotes(name).trim();
    if name.is_empty() {
        return Err(SqlError::MalformedQuery(format!(
            "FROM clause names no sheet in '{}'",
            sql
        )));
    }
    Ok(name.to_string())
}
