//! Fit-quality metrics
//!
//! A statistic that cannot be computed meaningfully is returned as `None`
//! together with a [`DegenerateStatistic`] explaining why.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A statistic omitted from the report because the data cannot support it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateStatistic {
    pub statistic: String,
    pub reason: String,
}

impl DegenerateStatistic {
    pub fn new(statistic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            statistic: statistic.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DegenerateStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} undefined: {}", self.statistic, self.reason)
    }
}

/// Test-set metrics for a regression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination
    pub r2: Option<f64>,
    /// Mean squared error
    pub mse: Option<f64>,
    /// Number of rows evaluated
    pub n_samples: usize,
}

/// Mean squared error; `None` for empty input
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return None;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    Some(sum / y_true.len() as f64)
}

/// R² score
///
/// `Err` carries the reason when fewer than two samples are given or the
/// targets have no variance.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64, String> {
    if y_true.len() != y_pred.len() {
        return Err(format!(
            "{} targets but {} predictions",
            y_true.len(),
            y_pred.len()
        ));
    }
    if y_true.len() < 2 {
        return Err(format!(
            "needs at least 2 test samples, got {}",
            y_true.len()
        ));
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    if ss_tot == 0.0 {
        return Err("test targets have zero variance".to_string());
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();

    Ok(1.0 - ss_res / ss_tot)
}

impl RegressionMetrics {
    /// Compute R² and MSE, collecting a warning for each undefined statistic
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> (Self, Vec<DegenerateStatistic>) {
        let mut warnings = Vec::new();

        let r2 = match r2_score(y_true, y_pred) {
            Ok(r2) => Some(r2),
            Err(reason) => {
                warnings.push(DegenerateStatistic::new("R²", reason));
                None
            }
        };

        let mse = mean_squared_error(y_true, y_pred);
        if mse.is_none() {
            warnings.push(DegenerateStatistic::new("MSE", "no test samples"));
        }

        let metrics = Self {
            r2,
            mse,
            n_samples: y_true.len(),
        };
        (metrics, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse() {
        assert_eq!(mean_squared_error(&[1.0, 2.0], &[1.0, 4.0]), Some(2.0));
        assert_eq!(mean_squared_error(&[], &[]), None);
    }

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), Ok(1.0));
        assert_eq!(r2_score(&y, &[2.0, 2.0, 2.0]), Ok(0.0));
    }

    #[test]
    fn test_r2_single_sample_is_degenerate() {
        let (metrics, warnings) = RegressionMetrics::compute(&[5.0], &[4.0]);
        assert_eq!(metrics.r2, None);
        assert_eq!(metrics.mse, Some(1.0));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].statistic, "R²");
        assert!(warnings[0].to_string().starts_with("R² undefined"));
    }

    #[test]
    fn test_constant_targets_are_degenerate() {
        assert!(r2_score(&[2.0, 2.0], &[1.0, 3.0]).is_err());
    }
}
