//! Transformation Engine
//!
//! Pure, in-memory dataset functions run once per file:
//! 1. **Anonymize**: replace sensitive values with deterministic tokens
//! 2. **Impute**: fill missing numeric cells by iterative regression
//! 3. **Report**: completeness, most frequent values and shape
//! 4. **Render**: turn a report into a standalone HTML page

pub mod anonymize;
pub mod impute;
pub mod render;
pub mod report;

pub use anonymize::{anonymize, anonymize_value};
pub use impute::{impute_missing_numeric, ImputerConfig};
pub use render::render_html;
pub use report::{generate_report, Report, TopValue};

use crate::dataset::Dataset;
use crate::error::PipelineResult;

/// Anonymize the sensitive columns, then impute numeric gaps
pub fn clean_data(
    dataset: Dataset,
    sensitive_fields: &[String],
    imputer: &ImputerConfig,
) -> PipelineResult<Dataset> {
    let dataset = anonymize(dataset, sensitive_fields)?;
    impute_missing_numeric(dataset, imputer)
}
