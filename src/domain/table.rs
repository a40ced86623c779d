//! Tabular query results
//!
//! A [`Table`] is the row-oriented shape every store query returns. It carries
//! just enough relational behavior to assemble a result set: outer joins on a
//! geographic key, null filtering and column pruning.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::errors::LossportError;
use super::result::Result;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text payload, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float when it is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Key used to match rows across joins; nulls never match
    fn join_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    /// Booleans render as `TRUE`/`FALSE`, nulls as an empty string
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Named columns with row-major values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; its width must match the column count
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(LossportError::Other(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a column by name, ignoring ASCII case
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    /// Values of one column in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Full outer join on `key`
    ///
    /// Left rows keep their order and are followed by unmatched right rows.
    /// Right columns other than the key are appended after the left columns.
    /// A side missing the key column contributes no matches.
    pub fn outer_join(&self, other: &Table, key: &str) -> Table {
        self.join(other, key, true)
    }

    /// Left join on `key`; unmatched right rows are discarded
    pub fn left_join(&self, other: &Table, key: &str) -> Table {
        self.join(other, key, false)
    }

    fn join(&self, other: &Table, key: &str, keep_unmatched_right: bool) -> Table {
        let left_key = self.column_index(key);
        let right_key = other.column_index(key);

        let right_columns: Vec<usize> = (0..other.columns.len())
            .filter(|i| Some(*i) != right_key)
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(right_columns.iter().map(|i| other.columns[*i].clone()));

        let mut right_index: HashMap<String, Vec<usize>> = HashMap::new();
        if let Some(rk) = right_key {
            for (i, row) in other.rows.iter().enumerate() {
                if let Some(k) = row[rk].join_key() {
                    right_index.entry(k).or_default().push(i);
                }
            }
        }

        let mut matched: HashSet<usize> = HashSet::new();
        let mut rows = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let hits = left_key
                .and_then(|lk| row[lk].join_key())
                .and_then(|k| right_index.get(&k));
            match hits {
                Some(hits) => {
                    for &ri in hits {
                        matched.insert(ri);
                        let mut joined = row.clone();
                        joined.extend(right_columns.iter().map(|c| other.rows[ri][*c].clone()));
                        rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row.clone();
                    joined.extend(std::iter::repeat(Value::Null).take(right_columns.len()));
                    rows.push(joined);
                }
            }
        }

        // Unmatched right rows land under the left key column when there is one
        for (ri, row) in other.rows.iter().enumerate() {
            if !keep_unmatched_right || matched.contains(&ri) {
                continue;
            }
            let mut joined = vec![Value::Null; self.columns.len()];
            if let (Some(lk), Some(rk)) = (left_key, right_key) {
                joined[lk] = row[rk].clone();
            }
            joined.extend(right_columns.iter().map(|c| row[*c].clone()));
            rows.push(joined);
        }

        Table { columns, rows }
    }

    /// Keeps only rows where `column` is not null
    ///
    /// A missing column removes every row.
    pub fn retain_non_null(&mut self, column: &str) {
        match self.column_index(column) {
            Some(idx) => self.rows.retain(|r| !r[idx].is_null()),
            None => self.rows.clear(),
        }
    }

    /// Drops columns whose every value is null
    ///
    /// Tables without rows keep their header.
    pub fn drop_empty_columns(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| self.rows.iter().any(|r| !r[i].is_null()))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }
        self.columns = retain_flags(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_flags(std::mem::take(row), &keep);
        }
    }

    /// Removes a column and returns its values
    pub fn take_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|r| r.remove(idx)).collect())
    }

    /// Stacks tables vertically over the union of their columns
    ///
    /// Columns appear in first-seen order; cells a table lacks are null.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for c in &table.columns {
                if !columns.contains(c) {
                    columns.push(c.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| columns.iter().position(|u| u == c))
                .collect();
            for row in table.rows {
                let mut out = vec![Value::Null; columns.len()];
                for (value, &target) in row.into_iter().zip(&mapping) {
                    out[target] = value;
                }
                rows.push(out);
            }
        }

        Table { columns, rows }
    }
}

fn retain_flags<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, k)| k.then_some(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        let mut t = Table::new(columns.iter().copied());
        for row in rows {
            t.push_row(row).unwrap();
        }
        t
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut t = Table::new(["a", "b"]);
        assert!(t.push_row(vec![Value::Int(1)]).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn test_outer_join_keeps_unmatched_rows_from_both_sides() {
        let left = table(
            &["block", "EconLoss"],
            vec![
                vec!["A".into(), Value::Float(10.0)],
                vec!["B".into(), Value::Float(20.0)],
            ],
        );
        let right = table(
            &["block", "Population"],
            vec![
                vec!["B".into(), Value::Int(5)],
                vec!["C".into(), Value::Int(7)],
            ],
        );

        let joined = left.outer_join(&right, "block");

        assert_eq!(joined.columns(), &["block", "EconLoss", "Population"]);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.rows()[0], vec!["A".into(), Value::Float(10.0), Value::Null]);
        assert_eq!(joined.rows()[1], vec!["B".into(), Value::Float(20.0), Value::Int(5)]);
        assert_eq!(joined.rows()[2], vec!["C".into(), Value::Null, Value::Int(7)]);
    }

    #[test]
    fn test_left_join_discards_unmatched_right_rows() {
        let left = table(&["tract", "EconLoss"], vec![vec!["T1".into(), Value::Float(1.0)]]);
        let right = table(
            &["tract", "geometry"],
            vec![
                vec!["T2".into(), "POLYGON ((0 0, 1 0, 1 1, 0 0))".into()],
                vec!["T1".into(), "POLYGON ((2 2, 3 2, 3 3, 2 2))".into()],
            ],
        );

        let joined = left.left_join(&right, "tract");
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.rows()[0][2], Value::from("POLYGON ((2 2, 3 2, 3 3, 2 2))"));
    }

    #[test]
    fn test_outer_join_with_columns_only_right_side() {
        let left = table(&["tract", "EconLoss"], vec![vec!["T1".into(), Value::Float(1.0)]]);
        let right = Table::new(["tract", "Fatalities"]);

        let joined = left.outer_join(&right, "tract");
        assert_eq!(joined.columns(), &["tract", "EconLoss", "Fatalities"]);
        assert_eq!(joined.rows()[0][2], Value::Null);
    }

    #[test]
    fn test_retain_non_null_and_drop_empty_columns() {
        let mut t = table(
            &["block", "EconLoss", "ShelterNeeds"],
            vec![
                vec!["A".into(), Value::Float(1.0), Value::Null],
                vec!["B".into(), Value::Null, Value::Int(3)],
            ],
        );

        t.retain_non_null("EconLoss");
        t.drop_empty_columns();

        assert_eq!(t.columns(), &["block", "EconLoss"]);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_drop_empty_columns_keeps_header_without_rows() {
        let mut t = Table::new(["block", "EconLoss"]);
        t.drop_empty_columns();
        assert_eq!(t.columns().len(), 2);
    }

    #[test]
    fn test_take_column_splits_geometry() {
        let mut t = table(
            &["FacilityId", "geometry"],
            vec![vec!["F1".into(), "POINT (1 2)".into()]],
        );

        let geometry = t.take_column("geometry").unwrap();
        assert_eq!(geometry, vec![Value::from("POINT (1 2)")]);
        assert_eq!(t.columns(), &["FacilityId"]);
        assert!(t.take_column("geometry").is_none());
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = table(&["FacilityId", "Name"], vec![vec!["1".into(), "School".into()]]);
        let b = table(&["FacilityId", "EconLoss"], vec![vec!["2".into(), Value::Float(9.0)]]);

        let t = Table::concat(vec![a, b]);
        assert_eq!(t.columns(), &["FacilityId", "Name", "EconLoss"]);
        assert_eq!(t.rows()[1], vec!["2".into(), Value::Null, Value::Float(9.0)]);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(true).to_string(), "TRUE");
        assert_eq!(Value::Bool(false).to_string(), "FALSE");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
    }
}
