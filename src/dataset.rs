//! In-memory tabular dataset
//!
//! An ordered set of uniquely named, equal-length columns. Each column is
//! homogeneous: numeric, text or temporal, with `None` marking a missing cell.

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Timestamp layout used whenever a temporal value is rendered as text (ISO-8601)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Kind of values held by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

/// Column storage
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Temporal(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Temporal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Temporal(_) => ColumnKind::Temporal,
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Temporal(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// String form of the cell at `row`, `None` when missing
    pub fn display_at(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(v) => v.get(row).copied().flatten().map(format_number),
            ColumnData::Text(v) => v.get(row).cloned().flatten(),
            ColumnData::Temporal(v) => v.get(row).copied().flatten().map(format_timestamp),
        }
    }

    /// Text rendering of the whole column, missing cells preserved
    pub fn to_text(&self) -> Vec<Option<String>> {
        (0..self.len()).map(|row| self.display_at(row)).collect()
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    pub fn temporal(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnData::Temporal(values))
    }
}

/// In-memory tabular value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, enforcing equal column lengths and unique names
    pub fn new(columns: Vec<Column>) -> PipelineResult<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PipelineError::InvalidDataset(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.data.len();
            if let Some(bad) = columns.iter().find(|c| c.data.len() != expected) {
                return Err(PipelineError::InvalidDataset(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.data.len(),
                    expected
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Swap in new storage for an existing column; row count must not change
    pub fn replace_data(&mut self, name: &str, data: ColumnData) -> PipelineResult<()> {
        let rows = self.row_count();
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| PipelineError::InvalidDataset(format!("no column '{}'", name)))?;

        if data.len() != rows {
            return Err(PipelineError::InvalidDataset(format!(
                "replacement for '{}' has {} rows, expected {}",
                name,
                data.len(),
                rows
            )));
        }

        column.data = data;
        Ok(())
    }

}

/// Plain decimal rendering of a number (`3` rather than `3.0`)
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an ISO-8601 timestamp, RFC 3339 instant or bare date
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.len() < 10 {
        return None;
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0)]),
            Column::numeric("b", vec![Some(1.0)]),
        ]);
        assert!(matches!(result, Err(PipelineError::InvalidDataset(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::text("a", vec![Some("x")]),
        ]);
        assert!(matches!(result, Err(PipelineError::InvalidDataset(_))));
    }

    #[test]
    fn test_shape_and_missing() {
        let ds = Dataset::new(vec![
            Column::numeric("age", vec![Some(30.0), None, Some(41.0)]),
            Column::text("name", vec![Some("ann"), Some("bo"), None]),
        ])
        .unwrap();

        assert_eq!(ds.shape(), (3, 2));
        assert_eq!(ds.column("age").unwrap().data.missing_count(), 1);
        assert_eq!(ds.column("age").unwrap().data.display_at(0).as_deref(), Some("30"));
    }

    #[test]
    fn test_timestamp_parsing_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(format_timestamp(expected), "2024-03-01T12:30:00");
        assert_eq!(parse_timestamp("42"), None);
        assert_eq!(parse_timestamp("not a date at all"), None);
    }

    #[test]
    fn test_replace_data_keeps_row_count() {
        let mut ds = Dataset::new(vec![Column::numeric("a", vec![Some(1.0), None])]).unwrap();
        assert!(ds
            .replace_data("a", ColumnData::Numeric(vec![Some(1.0)]))
            .is_err());
        ds.replace_data("a", ColumnData::Numeric(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        assert_eq!(ds.column("a").unwrap().data.missing_count(), 0);
    }
}
