//! CSV codec
//!
//! Header row required. Empty cells and the usual null markers (`NA`,
//! `null`, `None`, `NaN`, ...) are missing values; missing values are written
//! back as empty cells, so an empty string, a null marker and a missing value
//! are indistinguishable after a round trip.

use super::{decode_error, encode_error, infer_column, DataFormat};
use crate::dataset::Dataset;
use crate::error::PipelineResult;

/// Cell contents read as missing, matched after trimming
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_null_marker(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell.trim())
}

pub(super) fn decode(bytes: &[u8]) -> PipelineResult<Dataset> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| decode_error(DataFormat::Csv, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| decode_error(DataFormat::Csv, e))?;
        for (idx, column) in cells.iter_mut().enumerate() {
            let value = record
                .get(idx)
                .filter(|v| !is_null_marker(v))
                .map(str::to_string);
            column.push(value);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();
    Dataset::new(columns)
}

pub(super) fn encode(dataset: &Dataset) -> PipelineResult<Vec<u8>> {
    let mut writer = ::csv::WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(dataset.column_names())
        .map_err(|e| encode_error(DataFormat::Csv, e))?;

    let rendered: Vec<Vec<Option<String>>> =
        dataset.columns().iter().map(|c| c.data.to_text()).collect();
    for row in 0..dataset.row_count() {
        let record = rendered
            .iter()
            .map(|column| column[row].as_deref().unwrap_or(""));
        writer
            .write_record(record)
            .map_err(|e| encode_error(DataFormat::Csv, e))?;
    }

    writer
        .into_inner()
        .map_err(|e| encode_error(DataFormat::Csv, e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnData};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_detects_kinds_and_missing() {
        let raw = b"id,name,joined,score\n1,ann,2024-01-02,3.5\n2,,2024-02-03,\n";
        let ds = decode(raw).unwrap();

        assert_eq!(ds.shape(), (2, 4));
        assert_eq!(
            ds.column("id").unwrap().data,
            ColumnData::Numeric(vec![Some(1.0), Some(2.0)])
        );
        assert_eq!(
            ds.column("name").unwrap().data,
            ColumnData::Text(vec![Some("ann".to_string()), None])
        );
        assert_eq!(
            ds.column("score").unwrap().data,
            ColumnData::Numeric(vec![Some(3.5), None])
        );
        let joined = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(ds.column("joined").unwrap().data.display_at(0), Some("2024-01-02T00:00:00".to_string()));
        assert!(matches!(ds.column("joined").unwrap().data, ColumnData::Temporal(ref v) if v[0] == Some(joined)));
    }

    #[test]
    fn test_round_trip() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.0), None, Some(-2.25)]),
            Column::text("city", vec![Some("Oslo, NO"), Some("Lima"), None]),
        ])
        .unwrap();

        let bytes = encode(&ds).unwrap();
        assert_eq!(decode(&bytes).unwrap(), ds);
    }

    #[test]
    fn test_null_markers_are_missing() {
        let raw = b"x,y,label\n1,2,a\n2,NA,null\n3,6,N/A\n4,null,b\n5,None,\n6,nan,NaN\n";
        let ds = decode(raw).unwrap();

        assert_eq!(
            ds.column("y").unwrap().data,
            ColumnData::Numeric(vec![Some(2.0), None, Some(6.0), None, None, None])
        );
        assert_eq!(
            ds.column("label").unwrap().data,
            ColumnData::Text(vec![
                Some("a".to_string()),
                None,
                None,
                Some("b".to_string()),
                None,
                None
            ])
        );
    }

    #[test]
    fn test_null_markers_leave_numeric_gaps_for_imputation() {
        let ds = decode(b"x,y\n1,2\n2,NA\n3,6\n4,null\n").unwrap();
        let cleaned =
            crate::engine::clean_data(ds, &[], &crate::engine::ImputerConfig::default()).unwrap();

        match &cleaned.column("y").unwrap().data {
            ColumnData::Numeric(values) => assert!(values.iter().all(Option::is_some)),
            other => panic!("expected numeric y, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let raw = b"a,b\n1,2\n3\n";
        assert!(decode(raw).is_err());
    }
}
