//! Missing-value imputation for numeric columns
//!
//! Round-robin regression chaining: every numeric column with gaps starts
//! from its observed mean, then is repeatedly re-predicted from all other
//! numeric columns with a ridge regression until the largest change in a
//! sweep falls below `tol` (scaled by the largest observed magnitude) or
//! `max_iter` sweeps have run. Text and temporal columns are never read or
//! written. The procedure has no random component, so the same input always
//! yields the same output.

use crate::dataset::{ColumnData, Dataset};
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputerConfig {
    pub max_iter: usize,
    pub tol: f64,
    /// L2 penalty applied to the centred normal equations
    pub ridge_alpha: f64,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            max_iter: 10,
            tol: 1e-3,
            ridge_alpha: 1e-3,
        }
    }
}

/// Fill missing cells of every numeric column.
///
/// No-op when the dataset has no numeric column or no gaps. A numeric column
/// with no observed value at all is filled with `0.0`.
pub fn impute_missing_numeric(
    mut dataset: Dataset,
    config: &ImputerConfig,
) -> PipelineResult<Dataset> {
    let mut names = Vec::new();
    let mut observed: Vec<Vec<Option<f64>>> = Vec::new();
    for column in dataset.columns() {
        if let ColumnData::Numeric(values) = &column.data {
            names.push(column.name.clone());
            observed.push(values.clone());
        }
    }

    let has_gaps = observed.iter().any(|col| col.iter().any(Option::is_none));
    if names.is_empty() || !has_gaps {
        return Ok(dataset);
    }

    let filled = chain_regressions(&observed, config)?;
    for (name, values) in names.iter().zip(filled) {
        dataset.replace_data(name, ColumnData::Numeric(values.into_iter().map(Some).collect()))?;
    }
    Ok(dataset)
}

fn chain_regressions(
    observed: &[Vec<Option<f64>>],
    config: &ImputerConfig,
) -> PipelineResult<Vec<Vec<f64>>> {
    let rows = observed.first().map(Vec::len).unwrap_or(0);

    let mut matrix: Vec<Vec<f64>> = observed
        .iter()
        .map(|col| {
            let mean = mean(col.iter().flatten().copied()).unwrap_or(0.0);
            col.iter().map(|v| v.unwrap_or(mean)).collect()
        })
        .collect();

    // Fewest gaps first; columns with nothing observed keep their initial fill.
    let mut order: Vec<usize> = (0..observed.len())
        .filter(|&j| {
            let missing = observed[j].iter().filter(|v| v.is_none()).count();
            missing > 0 && missing < rows
        })
        .collect();
    order.sort_by_key(|&j| observed[j].iter().filter(|v| v.is_none()).count());

    let scale = observed
        .iter()
        .flatten()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = config.tol * scale;

    for sweep in 0..config.max_iter {
        let previous = matrix.clone();

        for &target in &order {
            let predictors: Vec<usize> = (0..matrix.len()).filter(|&k| k != target).collect();
            let train: Vec<usize> = (0..rows).filter(|&r| observed[target][r].is_some()).collect();
            let model = RidgeModel::fit(&matrix, &predictors, &train, target, config.ridge_alpha);

            for r in (0..rows).filter(|&r| observed[target][r].is_none()) {
                let prediction = model.predict(&matrix, &predictors, r);
                if !prediction.is_finite() {
                    return Err(PipelineError::Transformation(format!(
                        "imputation diverged on numeric column #{}",
                        target
                    )));
                }
                matrix[target][r] = prediction;
            }
        }

        let change = matrix
            .iter()
            .zip(&previous)
            .flat_map(|(now, before)| now.iter().zip(before).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        debug!("Imputation sweep {}: max change {:.6}", sweep + 1, change);
        if change < threshold {
            debug!("Imputation converged after {} sweeps", sweep + 1);
            break;
        }
    }

    Ok(matrix)
}

struct RidgeModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl RidgeModel {
    /// Fit `matrix[target]` on `matrix[predictors]` over the `train` rows
    fn fit(
        matrix: &[Vec<f64>],
        predictors: &[usize],
        train: &[usize],
        target: usize,
        alpha: f64,
    ) -> Self {
        let y_mean = mean(train.iter().map(|&r| matrix[target][r])).unwrap_or(0.0);
        let x_means: Vec<f64> = predictors
            .iter()
            .map(|&k| mean(train.iter().map(|&r| matrix[k][r])).unwrap_or(0.0))
            .collect();

        let p = predictors.len();
        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];
        for &r in train {
            let centred: Vec<f64> = predictors
                .iter()
                .zip(&x_means)
                .map(|(&k, m)| matrix[k][r] - m)
                .collect();
            let y = matrix[target][r] - y_mean;
            for a in 0..p {
                rhs[a] += centred[a] * y;
                for b in 0..p {
                    gram[a][b] += centred[a] * centred[b];
                }
            }
        }
        for (a, row) in gram.iter_mut().enumerate() {
            row[a] += alpha;
        }

        let coefficients = solve(gram, rhs).unwrap_or_else(|| vec![0.0; p]);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        Self {
            intercept,
            coefficients,
        }
    }

    fn predict(&self, matrix: &[Vec<f64>], predictors: &[usize], row: usize) -> f64 {
        self.intercept
            + predictors
                .iter()
                .zip(&self.coefficients)
                .map(|(&k, c)| c * matrix[k][row])
                .sum::<f64>()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Gaussian elimination with partial pivoting; `None` when singular
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
