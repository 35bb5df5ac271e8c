//! Suffix-driven format codecs
//!
//! Format dispatch is a lookup table from file suffix to a (decode, encode)
//! pair. There is no content sniffing: a `.csv` key is always parsed as CSV.

mod csv;
mod json;
mod parquet;

use crate::dataset::{parse_timestamp, Column, ColumnData, Dataset};
use crate::error::{PipelineError, PipelineResult};
use crate::storage::path::ObjectPath;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Json,
    JsonLines,
    Parquet,
}

impl DataFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
            DataFormat::JsonLines => "jsonl",
            DataFormat::Parquet => "parquet",
        }
    }
}

type DecodeFn = fn(&[u8]) -> PipelineResult<Dataset>;
type EncodeFn = fn(&Dataset) -> PipelineResult<Vec<u8>>;

/// Decoder/encoder pair registered for a suffix
#[derive(Clone, Copy)]
pub struct Codec {
    pub format: DataFormat,
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

static CODECS: Lazy<HashMap<&'static str, Codec>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "csv",
        Codec {
            format: DataFormat::Csv,
            decode: csv::decode,
            encode: csv::encode,
        },
    );
    table.insert(
        "json",
        Codec {
            format: DataFormat::Json,
            decode: json::decode_records,
            encode: json::encode_records,
        },
    );
    table.insert(
        "jsonl",
        Codec {
            format: DataFormat::JsonLines,
            decode: json::decode_lines,
            encode: json::encode_lines,
        },
    );
    table.insert(
        "parquet",
        Codec {
            format: DataFormat::Parquet,
            decode: parquet::decode,
            encode: parquet::encode,
        },
    );
    table
});

/// Look up the codec for a path; unknown suffixes are a hard error
pub fn codec_for(path: &ObjectPath) -> PipelineResult<Codec> {
    path.extension()
        .and_then(|ext| CODECS.get(ext.as_str()).copied())
        .ok_or_else(|| PipelineError::UnsupportedFormat(path.to_string()))
}

pub(crate) fn decode_error(format: DataFormat, message: impl ToString) -> PipelineError {
    PipelineError::Codec {
        action: "decode",
        format: format.name(),
        message: message.to_string(),
    }
}

pub(crate) fn encode_error(format: DataFormat, message: impl ToString) -> PipelineError {
    PipelineError::Codec {
        action: "encode",
        format: format.name(),
        message: message.to_string(),
    }
}

/// Pick the narrowest column kind that fits every present cell.
///
/// All cells parse as numbers -> numeric; all parse as timestamps ->
/// temporal; otherwise text. A column with no present cells is numeric.
pub(crate) fn infer_column(name: String, cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten();

    if present().all(|c| parse_number(c).is_some()) {
        let values = cells
            .iter()
            .map(|c| c.as_deref().and_then(parse_number).flatten())
            .collect();
        return Column::new(name, ColumnData::Numeric(values));
    }

    if present().all(|c| parse_timestamp(c).is_some()) {
        let values = cells
            .iter()
            .map(|c| c.as_deref().and_then(parse_timestamp))
            .collect();
        return Column::new(name, ColumnData::Temporal(values));
    }

    Column::new(name, ColumnData::Text(cells))
}

/// `Some(None)` for a NaN marker, `None` when the cell is not a finite number
fn parse_number(raw: &str) -> Option<Option<f64>> {
    let value = raw.trim().parse::<f64>().ok()?;
    if value.is_nan() {
        Some(None)
    } else if value.is_finite() {
        Some(Some(value))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;

    #[test]
    fn test_lookup_by_suffix() {
        let cases = [
            ("p/raw/a.csv", DataFormat::Csv),
            ("p/raw/a.json", DataFormat::Json),
            ("p/raw/a.jsonl", DataFormat::JsonLines),
            ("p/raw/a.parquet", DataFormat::Parquet),
            ("p/raw/A.CSV", DataFormat::Csv),
        ];
        for (key, expected) in cases {
            let codec = codec_for(&ObjectPath::from_key(key)).unwrap();
            assert_eq!(codec.format, expected);
        }
    }

    #[test]
    fn test_unknown_suffix_is_unsupported() {
        for key in ["data.txt", "data", "archive.csv.gz"] {
            let result = codec_for(&ObjectPath::from_key(key));
            assert!(matches!(result, Err(PipelineError::UnsupportedFormat(_))), "{}", key);
        }
    }

    #[test]
    fn test_infer_column_kinds() {
        let numeric = infer_column("n".into(), vec![Some("1".into()), None, Some("2.5".into())]);
        assert_eq!(numeric.data.kind(), ColumnKind::Numeric);

        let temporal = infer_column(
            "t".into(),
            vec![Some("2024-01-01".into()), Some("2024-01-02T08:00:00".into())],
        );
        assert_eq!(temporal.data.kind(), ColumnKind::Temporal);

        let text = infer_column("s".into(), vec![Some("1".into()), Some("x".into())]);
        assert_eq!(text.data.kind(), ColumnKind::Text);

        let overflow = infer_column("o".into(), vec![Some("3e12345".into())]);
        assert_eq!(overflow.data.kind(), ColumnKind::Text);

        let nan = infer_column("m".into(), vec![Some("NaN".into()), Some("4".into())]);
        assert_eq!(nan.data, ColumnData::Numeric(vec![None, Some(4.0)]));

        let empty = infer_column("e".into(), vec![None, None]);
        assert_eq!(empty.data.kind(), ColumnKind::Numeric);
    }
}
