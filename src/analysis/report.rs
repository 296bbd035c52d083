//! Human-readable analysis report
//!
//! Formatting is fixed (R² and coefficients to 4 places, MSE to 2,
//! correlations to 3) so the same inputs always print the same text.

use super::correlation::CorrelationMatrix;
use super::metrics::{DegenerateStatistic, RegressionMetrics};
use crate::schema::Observation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows shown in the recent-years table
pub const RECENT_ROWS: usize = 5;

/// A fitted coefficient and the feature it multiplies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCoefficient {
    pub feature: String,
    pub value: f64,
}

/// Everything the analyzer reports besides the final table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub target: String,
    pub features: Vec<String>,
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// `None` when there were no rows to fit
    pub intercept: Option<f64>,
    pub coefficients: Vec<NamedCoefficient>,
    pub metrics: RegressionMetrics,
    pub recent: Vec<Observation>,
    pub correlation: CorrelationMatrix,
    pub warnings: Vec<DegenerateStatistic>,
}

impl AnalysisReport {
    /// Coefficient for `feature`, if it was part of the model
    pub fn coefficient(&self, feature: &str) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.value)
    }

    /// Whether a statistic was reported as undefined
    pub fn is_degenerate(&self, statistic: &str) -> bool {
        self.warnings.iter().any(|w| w.statistic == statistic)
    }
}

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "undefined".to_string(),
    }
}

/// Write a pipe table; the first column is left-aligned, the rest right-aligned
fn write_table(f: &mut fmt::Formatter<'_>, headers: &[String], rows: &[Vec<String>]) -> fmt::Result {
    let widths: Vec<usize> = (0..headers.len())
        .map(|c| {
            rows.iter()
                .map(|row| row[c].chars().count())
                .chain(std::iter::once(headers[c].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
        write!(f, "|")?;
        for (c, cell) in cells.iter().enumerate() {
            if c == 0 {
                write!(f, " {:<w$} |", cell, w = widths[c])?;
            } else {
                write!(f, " {:>w$} |", cell, w = widths[c])?;
            }
        }
        writeln!(f)
    };

    write_row(f, headers)?;
    write!(f, "|")?;
    for (c, w) in widths.iter().enumerate() {
        if c == 0 {
            write!(f, ":{}|", "-".repeat(w + 1))?;
        } else {
            write!(f, "{}:|", "-".repeat(w + 1))?;
        }
    }
    writeln!(f)?;
    for row in rows {
        write_row(f, row)?;
    }
    Ok(())
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Linear regression: {} ~ {}", self.target, self.features.join(" + "))?;
        writeln!(
            f,
            "  rows {} (train {}, test {})",
            self.n_rows, self.n_train, self.n_test
        )?;
        writeln!(f, "  R² (test)   {}", format_optional(self.metrics.r2, 4))?;
        writeln!(f, "  MSE (test)  {}", format_optional(self.metrics.mse, 2))?;
        writeln!(f)?;
        writeln!(f, "Coefficients:")?;
        writeln!(f, "  {:<22} {}", "intercept", format_optional(self.intercept, 4))?;
        for c in &self.coefficients {
            writeln!(f, "  {:<22} {:.4}", c.feature, c.value)?;
        }

        writeln!(f)?;
        writeln!(f, "Recent years:")?;
        let headers: Vec<String> = ["year", "rd_investment", "equipment_investment", "industry_profit"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows: Vec<Vec<String>> = self
            .recent
            .iter()
            .map(|o| {
                vec![
                    o.year.to_string(),
                    format!("{:.4}", o.rd_investment),
                    format!("{:.4}", o.equipment_investment),
                    format!("{:.4}", o.industry_profit),
                ]
            })
            .collect();
        write_table(f, &headers, &rows)?;

        writeln!(f)?;
        writeln!(f, "Correlation matrix:")?;
        let mut headers = vec![String::new()];
        headers.extend(self.correlation.labels.iter().cloned());
        let rows: Vec<Vec<String>> = self
            .correlation
            .labels
            .iter()
            .zip(self.correlation.values.iter())
            .map(|(label, values)| {
                std::iter::once(label.clone())
                    .chain(values.iter().map(|v| format_optional(*v, 3)))
                    .collect()
            })
            .collect();
        write_table(f, &headers, &rows)?;

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for w in &self.warnings {
                writeln!(f, "  - {}", w)?;
            }
        }
        Ok(())
    }
}
