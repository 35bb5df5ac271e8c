//! Parquet codec, bridged through a polars `DataFrame`
//!
//! Numeric columns are stored as Float64, text as String and temporal columns
//! as millisecond Datetime. On read, every integer or float dtype becomes
//! numeric, dates and datetimes become temporal (sub-millisecond precision is
//! truncated) and any other dtype is cast to text.

use super::{decode_error, encode_error, DataFormat};
use crate::dataset::{Column, ColumnData, Dataset};
use crate::error::PipelineResult;
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::io::Cursor;

pub(super) fn decode(bytes: &[u8]) -> PipelineResult<Dataset> {
    let frame = ParquetReader::new(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| decode_error(DataFormat::Parquet, e))?;

    let columns = frame
        .get_columns()
        .iter()
        .map(series_to_column)
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(|e| decode_error(DataFormat::Parquet, e))?;
    Dataset::new(columns)
}

pub(super) fn encode(dataset: &Dataset) -> PipelineResult<Vec<u8>> {
    let series = dataset
        .columns()
        .iter()
        .map(column_to_series)
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(|e| encode_error(DataFormat::Parquet, e))?;
    let mut frame = DataFrame::new(series).map_err(|e| encode_error(DataFormat::Parquet, e))?;

    let mut buffer = Vec::new();
    ParquetWriter::new(&mut buffer)
        .finish(&mut frame)
        .map_err(|e| encode_error(DataFormat::Parquet, e))?;
    Ok(buffer)
}

fn column_to_series(column: &Column) -> PolarsResult<Series> {
    let name = column.name.as_str();
    match &column.data {
        ColumnData::Numeric(values) => Ok(Series::new(name, values.as_slice())),
        ColumnData::Text(values) => Ok(Series::new(name, values.as_slice())),
        ColumnData::Temporal(values) => {
            let millis: Vec<Option<i64>> = values
                .iter()
                .map(|v| v.map(|ts| ts.and_utc().timestamp_millis()))
                .collect();
            Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        }
    }
}

fn series_to_column(series: &Series) -> PolarsResult<Column> {
    let name = series.name().to_string();
    let dtype = series.dtype().clone();

    let data = match dtype {
        DataType::Datetime(_, _) | DataType::Date => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            let values = millis
                .i64()?
                .into_iter()
                .map(|v| v.and_then(DateTime::from_timestamp_millis))
                .map(|v| v.map(|dt| dt.naive_utc()))
                .collect::<Vec<Option<NaiveDateTime>>>();
            ColumnData::Temporal(values)
        }
        ref numeric if numeric.is_numeric() => {
            let floats = series.cast(&DataType::Float64)?;
            let values = floats
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect();
            ColumnData::Numeric(values)
        }
        _ => {
            let text = series.cast(&DataType::String)?;
            let values = text
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect();
            ColumnData::Text(values)
        }
    };

    Ok(Column::new(name, data))
}
