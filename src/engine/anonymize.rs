//! Sensitive column anonymization
//!
//! Each value becomes its first six characters followed by the first six hex
//! characters of the SHA-256 of its string form. The token is deterministic
//! (joins on the column still line up) but it is a disguise, not redaction:
//! the six leading characters are kept verbatim and short values are exposed
//! in full.
//!
//! Numeric cells are stringified with the shortest decimal form, so `30.0`
//! hashes as `"30"`. Tokens for integral floats therefore differ from a
//! rendering that keeps the trailing `.0`; the same value read from CSV text
//! `30` and from a float column still tokenizes identically.

use crate::dataset::{ColumnData, Dataset};
use crate::error::PipelineResult;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

const RAW_PREFIX_CHARS: usize = 6;
const HASH_PREFIX_CHARS: usize = 6;

/// Token for one value (missing values tokenize the empty string)
pub fn anonymize_value(raw: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(raw.as_bytes()));
    let prefix: String = raw.chars().take(RAW_PREFIX_CHARS).collect();
    format!("{}{}", prefix, &digest[..HASH_PREFIX_CHARS])
}

/// Replace every listed column with a text column of tokens.
///
/// Names that do not exist in the dataset are skipped.
pub fn anonymize(mut dataset: Dataset, sensitive_fields: &[String]) -> PipelineResult<Dataset> {
    let wanted: HashSet<&str> = sensitive_fields.iter().map(String::as_str).collect();
    let targets: Vec<String> = dataset
        .column_names()
        .into_iter()
        .filter(|name| wanted.contains(name))
        .map(str::to_string)
        .collect();

    for name in targets {
        let Some(column) = dataset.column(&name) else {
            continue;
        };
        let tokens = column
            .data
            .to_text()
            .into_iter()
            .map(|cell| Some(anonymize_value(cell.as_deref().unwrap_or(""))))
            .collect();
        dataset.replace_data(&name, ColumnData::Text(tokens))?;
        debug!("Anonymized column {}", name);
    }

    Ok(dataset)
}
