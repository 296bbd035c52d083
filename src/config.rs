//! Stage configuration
//!
//! Every stage entry point takes a [`StageConfig`] instead of reading
//! hardcoded paths and seeds.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Raw yearly investment table consumed by the builder
pub const RAW_DATA_FILE: &str = "simulated_export_data.csv";
/// Enriched table written by the builder
pub const PROCESSED_DATA_FILE: &str = "processed_time_series_data.csv";
/// Final table written by the analyzer
pub const ANALYSIS_FILE: &str = "final_export_analysis.csv";
/// Dashboard document written by the dashboard stage
pub const DASHBOARD_FILE: &str = "dashboard.json";

/// Seed shared by the noise generator and the train/test split
pub const DEFAULT_SEED: u64 = 42;
/// Share of rows held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.33;

/// Configuration for a single pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// File the stage reads
    pub input_path: PathBuf,

    /// File the stage writes
    pub output_path: PathBuf,

    /// Seed for every pseudo-random draw made by the stage
    pub random_seed: u64,

    /// Fraction of rows used as the test subset (analyzer only)
    pub test_fraction: f64,

    /// Write `predicted_profit` next to the residuals (analyzer only)
    pub persist_predictions: bool,
}

impl StageConfig {
    /// Create a configuration for arbitrary paths with default seed and split
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            random_seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            persist_predictions: false,
        }
    }

    /// Defaults for the dataset builder
    pub fn builder_stage() -> Self {
        Self::new(RAW_DATA_FILE, PROCESSED_DATA_FILE)
    }

    /// Defaults for the regression analyzer
    pub fn analyzer_stage() -> Self {
        Self::new(PROCESSED_DATA_FILE, ANALYSIS_FILE)
    }

    /// Defaults for the dashboard export
    pub fn dashboard_stage() -> Self {
        Self::new(ANALYSIS_FILE, DASHBOARD_FILE)
    }

    /// Rebase relative input and output paths onto `dir`
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if self.input_path.is_relative() {
            self.input_path = dir.join(&self.input_path);
        }
        if self.output_path.is_relative() {
            self.output_path = dir.join(&self.output_path);
        }
        self
    }

    /// Builder method to set the input path
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Builder method to set the output path
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Builder method to set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Builder method to set the test fraction
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Builder method to persist `predicted_profit` in the final table
    pub fn with_predictions(mut self, persist: bool) -> Self {
        self.persist_predictions = persist;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidParameter {
                name: "test_fraction".to_string(),
                value: self.test_fraction.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }
        if self.input_path == self.output_path {
            return Err(PipelineError::InvalidParameter {
                name: "output_path".to_string(),
                value: self.output_path.display().to_string(),
                reason: "must differ from input_path".to_string(),
            });
        }
        Ok(())
    }
}
