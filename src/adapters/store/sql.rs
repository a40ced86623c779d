//! T-SQL quoting helpers
//!
//! Scenario names and paths come from the archive, so every value spliced
//! into a batch goes through one of these.

/// Quotes a string literal: `N'O''Brien'`
pub fn literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

/// Quotes an identifier: `[a]]b]`
pub fn ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Three-part name of a `dbo` table in `database`
pub fn qualified(database: &str, table: &str) -> String {
    format!("{}.[dbo].{}", ident(database), ident(table))
}
