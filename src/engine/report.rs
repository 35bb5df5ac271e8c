//! Dataset summary report

use crate::dataset::{format_timestamp, ColumnData, Dataset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top value placeholder for columns with nothing to count
pub const NOT_AVAILABLE: &str = "N/A";

/// Most frequent value of a column, as a plain JSON scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopValue {
    Number(f64),
    Text(String),
}

impl TopValue {
    pub fn not_available() -> Self {
        TopValue::Text(NOT_AVAILABLE.to_string())
    }
}

/// Read-only snapshot of a dataset's quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Column -> fraction of non-missing values; `None` for a zero-row dataset
    pub completeness: IndexMap<String, Option<f64>>,
    pub top_values: IndexMap<String, TopValue>,
    /// `[rows, columns]`
    pub data_shape: [usize; 2],
}

/// Summarise a dataset.
///
/// Temporal values are reported as ISO-8601 strings. Ties for the most
/// frequent value go to the value seen first.
pub fn generate_report(dataset: &Dataset) -> Report {
    let rows = dataset.row_count();
    let mut completeness = IndexMap::new();
    let mut top_values = IndexMap::new();

    for column in dataset.columns() {
        let ratio = (rows > 0)
            .then(|| 1.0 - column.data.missing_count() as f64 / rows as f64);
        completeness.insert(column.name.clone(), ratio);

        let top = match &column.data {
            ColumnData::Numeric(values) => {
                most_frequent(values.iter().flatten().map(|v| normalize_zero(*v).to_bits()))
                    .map(|bits| TopValue::Number(f64::from_bits(bits)))
            }
            ColumnData::Text(values) => {
                most_frequent(values.iter().flatten().cloned()).map(TopValue::Text)
            }
            ColumnData::Temporal(values) => {
                most_frequent(values.iter().flatten().map(|ts| format_timestamp(*ts)))
                    .map(TopValue::Text)
            }
        };
        top_values.insert(
            column.name.clone(),
            top.unwrap_or_else(TopValue::not_available),
        );
    }

    Report {
        completeness,
        top_values,
        data_shape: [rows, dataset.column_count()],
    }
}

fn most_frequent<K, I>(values: I) -> Option<K>
where
    K: std::hash::Hash + Eq,
    I: Iterator<Item = K>,
{
    let mut counts: IndexMap<K, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(K, usize)> = None;
    for (value, count) in counts {
        let replace = best.as_ref().map_or(true, |(_, top)| count > *top);
        if replace {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}
