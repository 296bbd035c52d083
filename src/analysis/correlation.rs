//! Pearson correlation matrix

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Pearson correlation; `None` for fewer than two samples or a constant input
pub fn pearson_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let x_mean = x.mean()?;
    let y_mean = y.mean()?;

    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sum_xy += dx * dy;
        sum_x2 += dx * dx;
        sum_y2 += dy * dy;
    }

    let denom = (sum_x2 * sum_y2).sqrt();
    if denom == 0.0 {
        None
    } else {
        Some((sum_xy / denom).clamp(-1.0, 1.0))
    }
}

/// Symmetric correlation matrix over labelled columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major values; `None` where the correlation is undefined
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Correlate every pair of columns of `data`
    pub fn compute(labels: &[&str], data: &Array2<f64>) -> Self {
        let n = data.ncols();
        let mut values = vec![vec![None; n]; n];

        for i in 0..n {
            for j in i..n {
                let r = pearson_correlation(data.column(i), data.column(j));
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            values,
        }
    }

    /// Correlation between two labelled columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }

    /// Labels of columns whose correlations are all undefined
    pub fn undefined_columns(&self) -> Vec<&str> {
        self.labels
            .iter()
            .zip(self.values.iter())
            .filter(|(_, row)| row.iter().all(Option::is_none))
            .map(|(label, _)| label.as_str())
            .collect()
    }
}
