//! Regression analyzer
//!
//! Fits `industry_profit ≈ β0 + β1·innovation_focus + β2·equipment_investment`
//! on a seeded training subset, scores it on the held-out rows, and attaches
//! full-dataset predictions and residuals to every observation.

pub mod correlation;
pub mod metrics;
pub mod regression;
pub mod report;
pub mod split;

pub use correlation::{pearson_correlation, CorrelationMatrix};
pub use metrics::{mean_squared_error, r2_score, DegenerateStatistic, RegressionMetrics};
pub use regression::LinearRegression;
pub use report::{AnalysisReport, NamedCoefficient};
pub use split::{train_test_split, TrainTestSplit};

use crate::config::StageConfig;
use crate::error::Result;
use crate::random::{RandomSource, SeededRandom};
use crate::schema::columns::{EQUIPMENT_INVESTMENT, INDUSTRY_PROFIT, INNOVATION_FOCUS, RD_INVESTMENT};
use crate::schema::{self, AnalyzedObservation, Observation, PLACEHOLDER_CLUSTER};
use crate::utils::{DataLoader, DataSaver};
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Remediation printed when the enriched table is missing
pub const PROCESSED_INPUT_HINT: &str = "Run `build` first to create the enriched dataset.";

/// Regression target
pub const TARGET: &str = INDUSTRY_PROFIT;

/// Regression features, in coefficient order
pub const FEATURES: [&str; 2] = [INNOVATION_FOCUS, EQUIPMENT_INVESTMENT];

/// Columns of the correlation matrix, in order
pub const CORRELATION_COLUMNS: [&str; 4] =
    [RD_INVESTMENT, EQUIPMENT_INVESTMENT, INDUSTRY_PROFIT, INNOVATION_FOCUS];

/// In-memory result of [`RegressionAnalyzer::analyze`]
#[derive(Debug, Clone)]
pub struct Analysis {
    pub rows: Vec<AnalyzedObservation>,
    pub report: AnalysisReport,
    pub model: LinearRegression,
    pub split: TrainTestSplit,
}

/// What a completed analyzer stage did
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub report: AnalysisReport,
    pub output_rows: usize,
    pub columns: Vec<String>,
    pub output_path: PathBuf,
}

fn feature_matrix(observations: &[Observation]) -> Array2<f64> {
    Array2::from_shape_fn((observations.len(), FEATURES.len()), |(r, c)| match c {
        0 => observations[r].innovation_focus,
        _ => observations[r].equipment_investment,
    })
}

fn target_vector(observations: &[Observation]) -> Array1<f64> {
    observations.iter().map(|o| o.industry_profit).collect()
}

fn correlation_data(observations: &[Observation]) -> Array2<f64> {
    Array2::from_shape_fn((observations.len(), CORRELATION_COLUMNS.len()), |(r, c)| {
        let o = &observations[r];
        match c {
            0 => o.rd_investment,
            1 => o.equipment_investment,
            2 => o.industry_profit,
            _ => o.innovation_focus,
        }
    })
}

/// Train/test regression over enriched observations
#[derive(Debug, Clone)]
pub struct RegressionAnalyzer {
    test_fraction: f64,
}

impl Default for RegressionAnalyzer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TEST_FRACTION)
    }
}

impl RegressionAnalyzer {
    pub fn new(test_fraction: f64) -> Self {
        Self { test_fraction }
    }

    /// Split, fit, score and attach predictions to every row
    ///
    /// Output rows keep the input order; none are dropped.
    pub fn analyze<R: RandomSource + ?Sized>(
        &self,
        observations: &[Observation],
        rng: &mut R,
    ) -> Result<Analysis> {
        let n_rows = observations.len();
        let split = train_test_split(n_rows, self.test_fraction, rng)?;
        debug!(
            train = split.n_train(),
            test = split.n_test(),
            test_indices = ?split.test_indices,
            "Split dataset"
        );

        let x = feature_matrix(observations);
        let y = target_vector(observations);
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = y.select(Axis(0), &split.train_indices);
        let x_test = x.select(Axis(0), &split.test_indices);
        let y_test = y.select(Axis(0), &split.test_indices);

        let mut warnings = Vec::new();
        let mut model = LinearRegression::new();
        if split.n_train() == 0 {
            warnings.push(DegenerateStatistic::new("coefficients", "no rows to fit"));
        } else {
            if split.n_train() <= FEATURES.len() {
                warnings.push(DegenerateStatistic::new(
                    "coefficients",
                    format!(
                        "{} training rows for {} parameters, the fit is not unique",
                        split.n_train(),
                        FEATURES.len() + 1
                    ),
                ));
            }
            model.fit(&x_train, &y_train)?;
        }

        let predict = |rows: &Array2<f64>| -> Result<Array1<f64>> {
            if model.is_fitted() {
                model.predict(rows)
            } else {
                Ok(Array1::zeros(rows.nrows()))
            }
        };

        let y_pred_test = predict(&x_test)?;
        let (metrics, metric_warnings) =
            RegressionMetrics::compute(&y_test.to_vec(), &y_pred_test.to_vec());
        warnings.extend(metric_warnings);

        let predictions = predict(&x)?;
        let rows: Vec<AnalyzedObservation> = observations
            .iter()
            .zip(predictions.iter())
            .map(|(o, &predicted)| AnalyzedObservation {
                year: o.year,
                rd_investment: o.rd_investment,
                equipment_investment: o.equipment_investment,
                industry_profit: o.industry_profit,
                innovation_focus: o.innovation_focus,
                predicted_profit: predicted,
                regression_residual: o.industry_profit - predicted,
                cluster: PLACEHOLDER_CLUSTER,
            })
            .collect();

        let correlation = CorrelationMatrix::compute(&CORRELATION_COLUMNS, &correlation_data(observations));
        for column in correlation.undefined_columns() {
            warnings.push(DegenerateStatistic::new(
                format!("correlation({})", column),
                "column is constant or has fewer than 2 rows",
            ));
        }

        for w in &warnings {
            warn!(statistic = %w.statistic, reason = %w.reason, "Degenerate statistic");
        }

        let coefficients = model
            .coefficients
            .as_ref()
            .map(|c| {
                c.iter()
                    .zip(FEATURES.iter())
                    .map(|(&value, feature)| NamedCoefficient {
                        feature: feature.to_string(),
                        value,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let report = AnalysisReport {
            target: TARGET.to_string(),
            features: FEATURES.iter().map(|f| f.to_string()).collect(),
            n_rows,
            n_train: split.n_train(),
            n_test: split.n_test(),
            intercept: model.intercept,
            coefficients,
            metrics,
            recent: observations[n_rows.saturating_sub(report::RECENT_ROWS)..].to_vec(),
            correlation,
            warnings,
        };

        Ok(Analysis {
            rows,
            report,
            model,
            split,
        })
    }
}

/// Analyzer stage: load the enriched table, fit and score, write the final table
///
/// Fails with `MissingInput` when the enriched table does not exist; nothing
/// is written in that case.
pub fn analyze_dataset(config: &StageConfig) -> Result<AnalysisSummary> {
    config.validate()?;
    info!(input = %config.input_path.display(), "Analyzing dataset");

    let df = DataLoader::new().load_stage_input(&config.input_path, PROCESSED_INPUT_HINT)?;
    let observations = schema::observations_from_frame(&df)?;

    let mut rng = SeededRandom::new(config.random_seed);
    let analysis = RegressionAnalyzer::new(config.test_fraction).analyze(&observations, &mut rng)?;

    let mut out = schema::analyzed_to_frame(&analysis.rows, config.persist_predictions)?;
    let columns = schema::column_names(&out);
    DataSaver::save_csv(&mut out, &config.output_path)?;

    info!(
        rows = analysis.rows.len(),
        r2 = ?analysis.report.metrics.r2,
        mse = ?analysis.report.metrics.mse,
        output = %config.output_path.display(),
        "Analysis written"
    );

    Ok(AnalysisSummary {
        output_rows: analysis.rows.len(),
        report: analysis.report,
        columns,
        output_path: config.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn observations(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                let rd = 3.0 + 0.3 * i as f64;
                let equipment = 5.0 + 0.2 * i as f64 + if i % 2 == 0 { 0.1 } else { -0.1 };
                Observation {
                    year: 2015 + i as i64,
                    rd_investment: rd,
                    equipment_investment: equipment,
                    industry_profit: 1.5 * rd + 0.5 * equipment + 1.0 + 0.05 * (i % 3) as f64,
                    innovation_focus: rd / (rd + equipment),
                }
            })
            .collect()
    }

    #[test]
    fn test_residual_identity_and_row_count() {
        let data = observations(12);
        let analysis = RegressionAnalyzer::default()
            .analyze(&data, &mut SeededRandom::new(42))
            .unwrap();

        assert_eq!(analysis.rows.len(), 12);
        for row in &analysis.rows {
            assert!((row.industry_profit - row.predicted_profit - row.regression_residual).abs() < 1e-9);
            assert_eq!(row.cluster, 1);
        }
        assert_eq!(analysis.report.n_test, 4);
        assert_eq!(analysis.report.recent.len(), 5);
        assert_eq!(analysis.report.recent[4].year, 2026);
        assert!(analysis.report.metrics.r2.is_some());
    }

    #[test]
    fn test_three_rows_reports_undefined_r2() {
        let data = observations(3);
        let analysis = RegressionAnalyzer::default()
            .analyze(&data, &mut SeededRandom::new(42))
            .unwrap();

        assert_eq!(analysis.report.n_test, 1);
        assert_eq!(analysis.report.metrics.r2, None);
        assert!(analysis.report.is_degenerate("R²"));
        assert!(analysis.report.is_degenerate("coefficients"));
        assert_eq!(analysis.rows.len(), 3);
    }

    #[test]
    fn test_single_row_trains_without_test_set() {
        let analysis = RegressionAnalyzer::default()
            .analyze(&observations(1), &mut SeededRandom::new(42))
            .unwrap();

        assert_eq!(analysis.rows.len(), 1);
        assert_eq!(analysis.report.n_test, 0);
        assert_eq!(analysis.report.metrics.mse, None);
        assert!(analysis.report.is_degenerate("R²"));
        assert!(analysis.report.is_degenerate("MSE"));
        assert!(analysis.rows[0].regression_residual.abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_reports_without_fit() {
        let analysis = RegressionAnalyzer::default()
            .analyze(&[], &mut SeededRandom::new(42))
            .unwrap();

        assert!(analysis.rows.is_empty());
        assert!(!analysis.model.is_fitted());
        assert_eq!(analysis.report.intercept, None);
        assert!(analysis.report.coefficients.is_empty());
        assert!(analysis.report.is_degenerate("coefficients"));
        assert!(analysis.report.to_string().contains("R² (test)   undefined"));
    }

    #[test]
    fn test_scripted_split_uses_given_rows() {
        let data = observations(6);
        let mut rng = ScriptedRandom::default().with_order(vec![5, 4, 0, 1, 2, 3]);
        let analysis = RegressionAnalyzer::default().analyze(&data, &mut rng).unwrap();

        assert_eq!(analysis.split.test_indices, vec![5, 4]);
        assert_eq!(analysis.split.train_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_coefficient_names_follow_features() {
        let analysis = RegressionAnalyzer::default()
            .analyze(&observations(12), &mut SeededRandom::new(42))
            .unwrap();
        let names: Vec<&str> = analysis
            .report
            .coefficients
            .iter()
            .map(|c| c.feature.as_str())
            .collect();
        assert_eq!(names, FEATURES.to_vec());
    }
}
