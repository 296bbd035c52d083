//! Innovation Focus - investment mix versus industry profit
//!
//! This crate provides a three-stage pipeline over yearly R&D and equipment
//! investment figures:
//! - Dataset building: derived profit and innovation focus
//! - Regression analysis: seeded train/test OLS with residuals
//! - Dashboard export: chart specifications and findings as JSON
//!
//! # Modules
//!
//! ## Stages
//! - [`builder`] - Raw table to enriched table
//! - [`analysis`] - Regression, metrics, correlation and report
//! - [`dashboard`] - Chart document export
//! - [`pipeline`] - Stage orchestration and skip handling
//!
//! ## Infrastructure
//! - [`config`] - Per-stage paths, seed and split settings
//! - [`schema`] - Column names and typed rows
//! - [`random`] - Injectable random source
//! - [`utils`] - CSV/JSON loading and atomic saving
//!
//! ## Services
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Stages
pub mod builder;
pub mod analysis;
pub mod dashboard;
pub mod pipeline;

// Infrastructure
pub mod config;
pub mod schema;
pub mod random;
pub mod utils;

// Services
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Configuration
    pub use crate::config::StageConfig;

    // Rows
    pub use crate::schema::{AnalyzedObservation, Observation, RawObservation};

    // Randomness
    pub use crate::random::{RandomSource, ScriptedRandom, SeededRandom};

    // Stages
    pub use crate::builder::{build_dataset, BuildSummary, DatasetBuilder};
    pub use crate::analysis::{analyze_dataset, AnalysisReport, AnalysisSummary, RegressionAnalyzer};
    pub use crate::dashboard::{render_dashboard, Dashboard, DashboardSummary};

    // Orchestration
    pub use crate::pipeline::{run_all, run_analyzer, run_builder, run_dashboard, PipelineConfig, StageOutcome};
}
