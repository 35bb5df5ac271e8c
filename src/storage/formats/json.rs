//! JSON record and JSON-lines codecs
//!
//! Both carry one object per row. Column order is the order in which keys are
//! first seen; a key absent from a record is a missing value. Numbers become
//! numeric columns, strings text or temporal columns, and anything else is
//! kept as its JSON text.

use super::{decode_error, encode_error, DataFormat};
use crate::dataset::{format_timestamp, parse_timestamp, Column, ColumnData, Dataset};
use crate::error::PipelineResult;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

pub(super) fn decode_records(bytes: &[u8]) -> PipelineResult<Dataset> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| decode_error(DataFormat::Json, e))?;
    let Value::Array(items) = value else {
        return Err(decode_error(DataFormat::Json, "expected an array of records"));
    };
    let records = items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(decode_error(
                DataFormat::Json,
                format!("expected a record object, found {}", other),
            )),
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    build_dataset(records)
}

pub(super) fn decode_lines(bytes: &[u8]) -> PipelineResult<Dataset> {
    let text =
        std::str::from_utf8(bytes).map_err(|e| decode_error(DataFormat::JsonLines, e))?;
    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => records.push(map),
            Ok(_) => {
                return Err(decode_error(
                    DataFormat::JsonLines,
                    format!("line {} is not a record object", line_no + 1),
                ))
            }
            Err(e) => {
                return Err(decode_error(
                    DataFormat::JsonLines,
                    format!("line {}: {}", line_no + 1, e),
                ))
            }
        }
    }
    build_dataset(records)
}

pub(super) fn encode_records(dataset: &Dataset) -> PipelineResult<Vec<u8>> {
    let rows: Vec<Value> = to_records(dataset).into_iter().map(Value::Object).collect();
    serde_json::to_vec(&rows).map_err(|e| encode_error(DataFormat::Json, e))
}

pub(super) fn encode_lines(dataset: &Dataset) -> PipelineResult<Vec<u8>> {
    let mut out = Vec::new();
    for record in to_records(dataset) {
        serde_json::to_writer(&mut out, &record)
            .map_err(|e| encode_error(DataFormat::JsonLines, e))?;
        out.push(b'\n');
    }
    Ok(out)
}

fn build_dataset(records: Vec<Map<String, Value>>) -> PipelineResult<Dataset> {
    let mut order: IndexMap<String, ()> = IndexMap::new();
    for record in &records {
        for key in record.keys() {
            order.entry(key.clone()).or_insert(());
        }
    }

    let columns = order
        .into_keys()
        .map(|name| {
            let cells: Vec<Option<&Value>> = records
                .iter()
                .map(|r| r.get(&name).filter(|v| !v.is_null()))
                .collect();
            json_column(name, cells)
        })
        .collect();
    Dataset::new(columns)
}

fn json_column(name: String, cells: Vec<Option<&Value>>) -> Column {
    if cells.iter().flatten().all(|v| v.is_number()) {
        let values = cells
            .iter()
            .map(|v| v.and_then(Value::as_f64))
            .collect();
        return Column::new(name, ColumnData::Numeric(values));
    }

    let all_timestamps = cells.iter().flatten().all(|v| {
        v.as_str()
            .map(|s| parse_timestamp(s).is_some())
            .unwrap_or(false)
    });
    if all_timestamps {
        let values = cells
            .iter()
            .map(|v| v.and_then(Value::as_str).and_then(parse_timestamp))
            .collect();
        return Column::new(name, ColumnData::Temporal(values));
    }

    let text = cells
        .into_iter()
        .map(|v| {
            v.map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .collect();
    Column::new(name, ColumnData::Text(text))
}

fn to_records(dataset: &Dataset) -> Vec<Map<String, Value>> {
    (0..dataset.row_count())
        .map(|row| {
            dataset
                .columns()
                .iter()
                .map(|column| (column.name.clone(), cell_value(&column.data, row)))
                .collect()
        })
        .collect()
}

fn cell_value(data: &ColumnData, row: usize) -> Value {
    match data {
        ColumnData::Numeric(v) => v[row]
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::Text(v) => v[row].clone().map(Value::String).unwrap_or(Value::Null),
        ColumnData::Temporal(v) => v[row]
            .map(|ts| Value::String(format_timestamp(ts)))
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample() -> Dataset {
        let ts = NaiveDate::from_ymd_opt(2023, 7, 9)
            .unwrap()
            .and_hms_opt(6, 15, 0)
            .unwrap();
        Dataset::new(vec![
            Column::numeric("amount", vec![Some(10.5), None]),
            Column::text("name", vec![Some("Zoe"), Some("Ali")]),
            Column::temporal("seen", vec![Some(ts), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_records_round_trip() {
        let ds = sample();
        let bytes = encode_records(&ds).unwrap();
        assert_eq!(decode_records(&bytes).unwrap(), ds);
    }

    #[test]
    fn test_lines_round_trip() {
        let ds = sample();
        let bytes = encode_lines(&ds).unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap().lines().count(), 2);
        assert_eq!(decode_lines(&bytes).unwrap(), ds);
    }

    #[test]
    fn test_union_of_keys_in_first_seen_order() {
        let raw = br#"[{"b": 1, "a": "x"}, {"c": true, "b": null}]"#;
        let ds = decode_records(raw).unwrap();

        assert_eq!(ds.column_names(), vec!["b", "a", "c"]);
        assert_eq!(ds.column("b").unwrap().data, ColumnData::Numeric(vec![Some(1.0), None]));
        assert_eq!(
            ds.column("c").unwrap().data,
            ColumnData::Text(vec![None, Some("true".to_string())])
        );
    }

    #[test]
    fn test_numeric_looking_strings_stay_text() {
        let ds = decode_records(br#"[{"zip": "01234"}, {"zip": "99999"}]"#).unwrap();
        assert_eq!(ds.column("zip").unwrap().data.kind(), ColumnKind::Text);
    }

    #[test]
    fn test_rejects_non_record_payloads() {
        assert!(decode_records(br#"{"a": 1}"#).is_err());
        assert!(decode_records(br#"[1, 2]"#).is_err());
        assert!(decode_lines(b"{\"a\": 1}\n[1]\n").is_err());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let ds = decode_lines(b"{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        assert_eq!(ds.shape(), (2, 1));
        assert_eq!(ds.column("a").unwrap().data.kind(), ColumnKind::Numeric);
    }
}
