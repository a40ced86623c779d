//! Query helpers shared by the hazard providers

use crate::adapters::store::{sql, StoreSession};
use crate::domain::{Result, ResultKind, ResultSet, Selection, Table, Value};

/// Multiplier turning stored thousands of dollars (or tons) into units
pub const THOUSANDS: u32 = 1000;

/// Geography a hazard reports its summary results at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoKey {
    Tract,
    Block,
}

impl GeoKey {
    /// Join column every summary query aliases its geography to
    pub fn column(&self) -> &'static str {
        match self {
            GeoKey::Tract => "tract",
            GeoKey::Block => "block",
        }
    }

    /// Query returning the key plus WKT geometry for every feature
    pub fn geometry_sql(&self, session: &StoreSession) -> String {
        match self {
            GeoKey::Tract => format!(
                "SELECT Tract AS tract, Shape.STAsText() AS geometry FROM {}",
                session.table("hzTract")
            ),
            GeoKey::Block => format!(
                "SELECT CensusBlock AS block, Shape.STAsText() AS geometry FROM {}",
                session.table("hzCensusBlock")
            ),
        }
    }
}

/// Values of `column` as trimmed text, skipping nulls
pub fn text_column(table: &Table, column: &str) -> Vec<String> {
    table
        .column_values(column)
        .unwrap_or_default()
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| period_text(v).trim().to_string())
        .collect()
}

/// Lists distinct values in first-seen order
pub fn distinct(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}

/// `StudyCaseId = (...) AND ReturnPeriodId = N'rp'` for flood tables
pub fn flood_case_filter(session: &StoreSession, selection: &Selection) -> String {
    format!(
        "StudyCaseId = (SELECT StudyCaseID FROM {} WHERE StudyCaseName = {}) AND ReturnPeriodId = {}",
        session.table("flStudyCase"),
        sql::literal(selection.scenario()),
        sql::literal(selection.return_period())
    )
}

/// `Return_Period = N'rp' AND huScenarioName = N'sc'` for hurricane views
pub fn hurricane_case_filter(selection: &Selection) -> String {
    format!(
        "Return_Period = {} AND huScenarioName = {}",
        sql::literal(selection.return_period()),
        sql::literal(selection.scenario())
    )
}

/// Runs each query and outer-joins the tables on `key`
async fn join_all(session: &mut StoreSession, key: GeoKey, queries: &[String]) -> Result<Table> {
    let mut merged: Option<Table> = None;
    for query in queries {
        let table = session.query(query).await?;
        merged = Some(match merged {
            Some(left) => left.outer_join(&table, key.column()),
            None => table,
        });
    }
    Ok(merged.unwrap_or_default())
}

/// Assembles the per-geography summary
///
/// The first query must produce `EconLoss`. Rows without an economic loss are
/// dropped, as are columns left entirely empty. Geometry is attached from the
/// hazard's census layer; when that lookup fails the set is returned without
/// geometry and only spatial exports of it fail.
pub async fn summarize(
    session: &mut StoreSession,
    key: GeoKey,
    queries: &[String],
) -> Result<ResultSet> {
    let mut table = join_all(session, key, queries).await?;
    table.retain_non_null("EconLoss");
    table.drop_empty_columns();

    if table.is_empty() {
        return Ok(ResultSet::new(ResultKind::Results, table));
    }

    let shapes_sql = key.geometry_sql(session);
    match session.query(&shapes_sql).await {
        Ok(shapes) => {
            let joined = table.left_join(&shapes, key.column());
            Ok(ResultSet::with_geometry_column(
                ResultKind::Results,
                joined,
                "geometry",
            ))
        }
        Err(e) => {
            tracing::warn!(
                store = session.store_name(),
                geography = key.column(),
                error = %e,
                "Could not load geometry for results"
            );
            Ok(ResultSet::new(ResultKind::Results, table))
        }
    }
}

/// Joins fatalities and injuries into one casualty table
pub async fn casualties(
    session: &mut StoreSession,
    key: GeoKey,
    fatalities: String,
    injuries: String,
) -> Result<ResultSet> {
    let mut table = join_all(session, key, &[fatalities, injuries]).await?;
    table.drop_empty_columns();
    Ok(ResultSet::new(ResultKind::Casualties, table))
}

/// Runs a single non-spatial query
pub async fn tabular(session: &mut StoreSession, kind: ResultKind, query: &str) -> Result<ResultSet> {
    let table = session.query(query).await?;
    Ok(ResultSet::new(kind, table))
}

/// Renders a value as text, dropping the fraction of integral floats
///
/// Return periods are sometimes stored as numbers; `100.0` reads `100`.
pub fn period_text(value: &Value) -> String {
    match value {
        Value::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Hazard;

    #[test]
    fn test_text_column_skips_nulls_and_trims() {
        let mut table = Table::new(["scenarios"]);
        table.push_row(vec![Value::from(" Northridge ")]).unwrap();
        table.push_row(vec![Value::Null]).unwrap();
        table.push_row(vec![Value::Int(7)]).unwrap();

        assert_eq!(text_column(&table, "scenarios"), vec!["Northridge", "7"]);
        assert!(text_column(&table, "missing").is_empty());
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        let values = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(distinct(values), vec!["b", "a"]);
    }

    #[test]
    fn test_period_text() {
        assert_eq!(period_text(&Value::Float(100.0)), "100");
        assert_eq!(period_text(&Value::Float(2.5)), "2.5");
        assert_eq!(period_text(&Value::Int(29)), "29");
        assert_eq!(period_text(&Value::from("500 ")), "500 ");
    }

    #[test]
    fn test_hurricane_filter_quotes_values() {
        let selection = Selection::new(Hazard::Hurricane, "Hurricane O'Neil", "100");
        assert_eq!(
            hurricane_case_filter(&selection),
            "Return_Period = N'100' AND huScenarioName = N'Hurricane O''Neil'"
        );
    }
}
