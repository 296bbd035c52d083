//! Innovation Focus CLI Module
//!
//! Command-line interface for building, analyzing and exporting the dataset.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::AnalysisSummary;
use crate::builder::BuildSummary;
use crate::config::{StageConfig, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use crate::dashboard::{AxisFormat, DashboardSummary};
use crate::pipeline::{self, PipelineConfig, PipelineRun, SkippedStage, StageOutcome};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_skipped() {
    println!("{}", "skipped".yellow());
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "innovation-focus")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Innovation focus of R&D versus equipment investment")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding the stage files
    #[arg(long, global = true, env = "DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Seed for noise generation and the train/test split
    #[arg(long, global = true, env = "PIPELINE_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Input/output overrides shared by the stage commands
#[derive(Args, Debug, Clone, Default)]
pub struct StagePaths {
    /// Input file (defaults to the stage's file under --data-dir)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (defaults to the stage's file under --data-dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Analyzer options
#[derive(Args, Debug, Clone)]
pub struct AnalyzeOptions {
    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    pub test_fraction: f64,

    /// Also write predicted_profit to the final table
    #[arg(long)]
    pub with_predictions: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Derive profit and innovation focus from the raw investment table
    Build {
        #[command(flatten)]
        paths: StagePaths,
    },

    /// Fit the regression and write predictions and residuals
    Analyze {
        #[command(flatten)]
        paths: StagePaths,

        #[command(flatten)]
        options: AnalyzeOptions,
    },

    /// Export the dashboard document
    Dashboard {
        #[command(flatten)]
        paths: StagePaths,
    },

    /// Run build, analyze and dashboard in order
    Run {
        #[command(flatten)]
        options: AnalyzeOptions,
    },

    /// Show information about a stage file
    Info {
        /// File to inspect
        #[arg(short, long)]
        data: PathBuf,
    },
}

impl Cli {
    fn stage(&self, defaults: StageConfig, paths: &StagePaths) -> StageConfig {
        let mut config = defaults.in_dir(&self.data_dir).with_seed(self.seed);
        if let Some(input) = &paths.input {
            config = config.with_input(input);
        }
        if let Some(output) = &paths.output {
            config = config.with_output(output);
        }
        config
    }

    pub fn builder_config(&self, paths: &StagePaths) -> StageConfig {
        self.stage(StageConfig::builder_stage(), paths)
    }

    pub fn analyzer_config(&self, paths: &StagePaths, options: &AnalyzeOptions) -> StageConfig {
        self.stage(StageConfig::analyzer_stage(), paths)
            .with_test_fraction(options.test_fraction)
            .with_predictions(options.with_predictions)
    }

    pub fn dashboard_config(&self, paths: &StagePaths) -> StageConfig {
        self.stage(StageConfig::dashboard_stage(), paths)
    }

    pub fn pipeline_config(&self, options: &AnalyzeOptions) -> PipelineConfig {
        PipelineConfig::in_dir(&self.data_dir)
            .with_seed(self.seed)
            .with_test_fraction(options.test_fraction)
            .with_predictions(options.with_predictions)
    }
}

// ─── Reporting ─────────────────────────────────────────────────────────────────

fn print_skipped(skipped: &SkippedStage) {
    println!();
    println!(
        "  {} {} {}",
        "!".yellow().bold(),
        format!("{} skipped:", skipped.stage).yellow(),
        format!("input file '{}' not found", skipped.missing.display()).white()
    );
    println!("    {}", muted(&skipped.hint));
    println!();
}

fn print_build(summary: &BuildSummary) {
    println!();
    println!("  {:<16} {}", muted("Input rows"), summary.input_rows);
    println!("  {:<16} {}", muted("Output rows"), summary.output_rows.to_string().white().bold());
    if !summary.dropped.is_empty() {
        println!("  {:<16} {}", muted("Dropped"), summary.dropped.len().to_string().yellow());
        for row in &summary.dropped {
            let year = row.year.map_or_else(|| "?".to_string(), |y| y.to_string());
            println!("    {} {}", year.white(), dim(&row.reason.to_string()));
        }
    }
    println!("  {:<16} {}", muted("Written"), summary.output_path.display());
    println!();
}

fn print_analysis(summary: &AnalysisSummary) {
    println!();
    for line in summary.report.to_string().lines() {
        println!("  {}", line);
    }
    println!();
    println!("  {:<16} {}", muted("Columns"), summary.columns.join(", "));
    println!("  {:<16} {}", muted("Written"), summary.output_path.display());
    println!();
}

fn print_dashboard(summary: &DashboardSummary) {
    let dashboard = &summary.dashboard;
    println!();
    println!("  {}", dashboard.title.white().bold());
    if let Some(period) = dashboard.period {
        println!("  {}", dim(&format!("{} – {}", period.first, period.last)));
    }

    section("Charts");
    for chart in &dashboard.charts {
        let unit = match chart.y_format {
            AxisFormat::Percent => "%",
            AxisFormat::Number => "",
        };
        println!(
            "  {:<22} {} {}",
            chart.id.white(),
            muted(&format!("{:?}", chart.kind).to_lowercase()),
            dim(&format!("{} series{}", chart.series.len(), if unit.is_empty() { String::new() } else { format!(", {}", unit) }))
        );
    }

    section("Innovation focus");
    for (year, focus) in dashboard.focus_by_year() {
        let bar = "█".repeat((focus * 40.0).round().max(0.0) as usize);
        println!("  {}  {} {}", year, accent(&bar), dim(&format!("{:.1}%", focus * 100.0)));
    }

    section("Findings");
    for finding in &dashboard.findings {
        println!("  {} {}", ok("•"), finding.text);
    }
    println!();
    println!("  {:<16} {}", muted("Written"), summary.output_path.display());
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_build(config: &StageConfig) -> anyhow::Result<()> {
    section("Build");

    step_run(&format!("Reading {}", config.input_path.display()));
    let start = Instant::now();
    match pipeline::run_builder(config)? {
        StageOutcome::Completed(summary) => {
            step_done(&format!("{:?}", start.elapsed()));
            print_build(&summary);
        }
        StageOutcome::Skipped(skipped) => {
            step_skipped();
            print_skipped(&skipped);
        }
    }
    Ok(())
}

pub fn cmd_analyze(config: &StageConfig) -> anyhow::Result<()> {
    section("Analyze");

    step_run(&format!("Fitting on {}", config.input_path.display()));
    let start = Instant::now();
    match pipeline::run_analyzer(config)? {
        StageOutcome::Completed(summary) => {
            step_done(&format!("{:?}", start.elapsed()));
            print_analysis(&summary);
        }
        StageOutcome::Skipped(skipped) => {
            step_skipped();
            print_skipped(&skipped);
        }
    }
    Ok(())
}

pub fn cmd_dashboard(config: &StageConfig) -> anyhow::Result<()> {
    section("Dashboard");

    step_run(&format!("Rendering {}", config.input_path.display()));
    let start = Instant::now();
    match pipeline::run_dashboard(config)? {
        StageOutcome::Completed(summary) => {
            step_done(&format!("{:?}", start.elapsed()));
            print_dashboard(&summary);
        }
        StageOutcome::Skipped(skipped) => {
            step_skipped();
            print_skipped(&skipped);
        }
    }
    Ok(())
}

fn print_run(run: &PipelineRun) {
    let status = |done: bool| if done { ok("done") } else { dim("not run") };

    println!();
    line_box_top();
    line_box(&kv("build    ", &status(run.build.is_some()).to_string()));
    line_box(&kv("analyze  ", &status(run.analysis.is_some()).to_string()));
    line_box(&kv("dashboard", &status(run.dashboard.is_some()).to_string()));
    if let Some(r2) = run.analysis.as_ref().and_then(|a| a.report.metrics.r2) {
        line_box(&kv("R² (test)", &format!("{:.4}", r2)));
    }
    line_box_bottom();
}

pub fn cmd_run(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Run");

    let start = Instant::now();
    let run = pipeline::run_all(config)?;

    if let Some(summary) = &run.build {
        print_build(summary);
    }
    if let Some(summary) = &run.analysis {
        print_analysis(summary);
    }
    if let Some(summary) = &run.dashboard {
        print_dashboard(summary);
    }
    if let Some(skipped) = &run.skipped {
        print_skipped(skipped);
    }

    print_run(&run);
    println!("  {}", dim(&format!("{:?}", start.elapsed())));
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<24} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(44)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>6}",
            col.name().as_str(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count()
        );
    }

    println!();
    Ok(())
}

pub fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("innovation-focus run", "Build, analyze and export in one go"),
        ("innovation-focus build", "Derive profit and innovation focus"),
        ("innovation-focus analyze", "Fit the regression on the enriched table"),
        ("innovation-focus analyze --with-predictions", "Keep predicted_profit in the output"),
        ("innovation-focus dashboard", "Write dashboard.json"),
        ("innovation-focus info -d file.csv", "Inspect a stage file"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<44} {}", cmd.white(), muted(desc));
    }

    section("Environment");
    println!("  {:<44} {}", "DATA_DIR".white(), muted("directory holding the stage files"));
    println!("  {:<44} {}", "PIPELINE_SEED".white(), muted("seed for noise and split"));
    println!("  {:<44} {}", "RUST_LOG".white(), muted("log filter, e.g. innovation_focus=debug"));
    println!();
}
