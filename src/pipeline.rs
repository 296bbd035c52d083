//! Stage orchestration
//!
//! Each stage runs standalone. A missing input file is not a failure: the
//! stage is reported as skipped with a remediation hint and writes nothing.

use crate::analysis::{analyze_dataset, AnalysisSummary};
use crate::builder::{build_dataset, BuildSummary};
use crate::config::StageConfig;
use crate::dashboard::{render_dashboard, DashboardSummary};
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Pipeline stage identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Build,
    Analyze,
    Dashboard,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Build => "build",
            Stage::Analyze => "analyze",
            Stage::Dashboard => "dashboard",
        };
        write!(f, "{}", name)
    }
}

/// A stage that did not run because its input was absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStage {
    pub stage: Stage,
    pub missing: PathBuf,
    pub hint: String,
}

impl fmt::Display for SkippedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} skipped: input file '{}' not found. {}",
            self.stage,
            self.missing.display(),
            self.hint
        )
    }
}

/// Result of running one stage
#[derive(Debug, Clone)]
pub enum StageOutcome<T> {
    Completed(T),
    Skipped(SkippedStage),
}

impl<T> StageOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            StageOutcome::Skipped(_) => None,
        }
    }
}

/// Turn `MissingInput` into a skip; every other error propagates
fn at_boundary<T>(stage: Stage, result: Result<T>) -> Result<StageOutcome<T>> {
    match result {
        Ok(value) => Ok(StageOutcome::Completed(value)),
        Err(PipelineError::MissingInput { path, hint }) => {
            warn!(stage = %stage, path = %path.display(), "Input missing, stage skipped");
            Ok(StageOutcome::Skipped(SkippedStage {
                stage,
                missing: path,
                hint,
            }))
        }
        Err(e) => Err(e),
    }
}

pub fn run_builder(config: &StageConfig) -> Result<StageOutcome<BuildSummary>> {
    at_boundary(Stage::Build, build_dataset(config))
}

pub fn run_analyzer(config: &StageConfig) -> Result<StageOutcome<AnalysisSummary>> {
    at_boundary(Stage::Analyze, analyze_dataset(config))
}

pub fn run_dashboard(config: &StageConfig) -> Result<StageOutcome<DashboardSummary>> {
    at_boundary(Stage::Dashboard, render_dashboard(config))
}

/// Configuration for all three stages, chained through their files
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub builder: StageConfig,
    pub analyzer: StageConfig,
    pub dashboard: StageConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            builder: StageConfig::builder_stage(),
            analyzer: StageConfig::analyzer_stage(),
            dashboard: StageConfig::dashboard_stage(),
        }
    }
}

impl PipelineConfig {
    /// Default file names placed under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let defaults = Self::default();
        Self {
            builder: defaults.builder.in_dir(dir),
            analyzer: defaults.analyzer.in_dir(dir),
            dashboard: defaults.dashboard.in_dir(dir),
        }
    }

    /// Use one seed for every stage
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.builder.random_seed = seed;
        self.analyzer.random_seed = seed;
        self.dashboard.random_seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.analyzer.test_fraction = fraction;
        self
    }

    pub fn with_predictions(mut self, persist: bool) -> Self {
        self.analyzer.persist_predictions = persist;
        self
    }
}

/// What a full run produced
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub build: Option<BuildSummary>,
    pub analysis: Option<AnalysisSummary>,
    pub dashboard: Option<DashboardSummary>,
    /// First stage that was skipped; later stages were not attempted
    pub skipped: Option<SkippedStage>,
}

impl PipelineRun {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_none() && self.dashboard.is_some()
    }
}

/// Run build, analyze and dashboard in order, stopping at the first skip
pub fn run_all(config: &PipelineConfig) -> Result<PipelineRun> {
    let mut run = PipelineRun::default();

    match run_builder(&config.builder)? {
        StageOutcome::Completed(summary) => run.build = Some(summary),
        StageOutcome::Skipped(skipped) => {
            run.skipped = Some(skipped);
            return Ok(run);
        }
    }

    match run_analyzer(&config.analyzer)? {
        StageOutcome::Completed(summary) => run.analysis = Some(summary),
        StageOutcome::Skipped(skipped) => {
            run.skipped = Some(skipped);
            return Ok(run);
        }
    }

    match run_dashboard(&config.dashboard)? {
        StageOutcome::Completed(summary) => run.dashboard = Some(summary),
        StageOutcome::Skipped(skipped) => {
            run.skipped = Some(skipped);
            return Ok(run);
        }
    }

    info!("Pipeline complete");
    Ok(run)
}
