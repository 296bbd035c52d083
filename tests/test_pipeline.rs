//! Integration tests for the full build → analyze → dashboard run

use innovation_focus::config::{StageConfig, ANALYSIS_FILE, DASHBOARD_FILE, PROCESSED_DATA_FILE, RAW_DATA_FILE};
use innovation_focus::dashboard::{render_dashboard, Dashboard, PredictionSource};
use innovation_focus::pipeline::{run_all, run_dashboard, PipelineConfig, Stage, StageOutcome};
use std::fs;
use tempfile::tempdir;

fn raw_table() -> String {
    let mut body = String::from("year,rd_investment,equipment_investment\n");
    for i in 0..12 {
        body.push_str(&format!(
            "{},{:.2},{:.2}\n",
            2013 + i,
            3.0 + 0.2 * i as f64,
            5.0 + if i % 3 == 0 { 0.3 } else { 0.05 * i as f64 }
        ));
    }
    body
}

#[test]
fn test_full_run_writes_every_stage() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(RAW_DATA_FILE), raw_table()).unwrap();

    let run = run_all(&PipelineConfig::in_dir(dir.path())).unwrap();
    assert!(run.is_complete());
    assert_eq!(run.build.as_ref().map(|b| b.output_rows), Some(12));
    assert_eq!(run.analysis.as_ref().map(|a| a.output_rows), Some(12));

    for file in [PROCESSED_DATA_FILE, ANALYSIS_FILE, DASHBOARD_FILE] {
        assert!(dir.path().join(file).is_file(), "{} missing", file);
    }

    let json = fs::read_to_string(dir.path().join(DASHBOARD_FILE)).unwrap();
    let dashboard: Dashboard = serde_json::from_str(&json).unwrap();
    assert_eq!(dashboard.charts.len(), 4);
    assert_eq!(dashboard.findings.len(), 4);
    assert_eq!(dashboard.period.map(|p| (p.first, p.last)), Some((2013, 2024)));
}

#[test]
fn test_full_run_is_reproducible() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    for dir in [&first, &second] {
        fs::write(dir.path().join(RAW_DATA_FILE), raw_table()).unwrap();
        run_all(&PipelineConfig::in_dir(dir.path())).unwrap();
    }

    for file in [PROCESSED_DATA_FILE, ANALYSIS_FILE, DASHBOARD_FILE] {
        assert_eq!(
            fs::read(first.path().join(file)).unwrap(),
            fs::read(second.path().join(file)).unwrap(),
            "{} differs between runs",
            file
        );
    }
}

#[test]
fn test_run_stops_when_raw_table_missing() {
    let dir = tempdir().unwrap();

    let run = run_all(&PipelineConfig::in_dir(dir.path())).unwrap();
    let skipped = run.skipped.unwrap();

    assert_eq!(skipped.stage, Stage::Build);
    assert!(run.analysis.is_none());
    assert!(!dir.path().join(PROCESSED_DATA_FILE).exists());
    assert!(!dir.path().join(DASHBOARD_FILE).exists());
}

#[test]
fn test_dashboard_skipped_without_final_table() {
    let dir = tempdir().unwrap();
    let config = StageConfig::dashboard_stage().in_dir(dir.path());

    match run_dashboard(&config).unwrap() {
        StageOutcome::Skipped(skipped) => {
            assert_eq!(skipped.stage, Stage::Dashboard);
            assert!(skipped.hint.contains("analyze"));
        }
        StageOutcome::Completed(_) => panic!("dashboard ran without input"),
    }
    assert!(!config.output_path.exists());
}

#[test]
fn test_dashboard_reads_table_without_predictions() {
    let dir = tempdir().unwrap();
    let config = StageConfig::dashboard_stage().in_dir(dir.path());
    fs::write(
        &config.input_path,
        "year,rd_investment,equipment_investment,industry_profit,innovation_focus,regression_residual,cluster\n\
         2015,3.0,5.0,8.0,0.375,0.25,1\n\
         2016,3.5,5.2,8.9,0.4022988505747126,-0.5,1\n",
    )
    .unwrap();

    let summary = run_dashboard(&config).unwrap().completed().unwrap();
    assert_eq!(summary.output_path, config.output_path);
    assert_eq!(summary.dashboard, render_dashboard(&config).unwrap().dashboard);
    let chart = summary.dashboard.chart("actual_vs_predicted").unwrap();
    let predicted: Vec<f64> = chart.series[1].points.iter().map(|p| p.y).collect();

    assert_eq!(chart.series[1].source, Some(PredictionSource::Residuals));
    assert!((predicted[0] - 7.75).abs() < 1e-12);
    assert!((predicted[1] - 9.4).abs() < 1e-12);
}

#[test]
fn test_dashboard_uses_persisted_predictions() {
    let dir = tempdir().unwrap();
    let config = StageConfig::dashboard_stage().in_dir(dir.path());
    fs::write(
        &config.input_path,
        "year,rd_investment,equipment_investment,industry_profit,innovation_focus,predicted_profit,regression_residual,cluster\n\
         2015,3.0,5.0,8.0,0.375,7.9,0.1,1\n\
         2016,3.5,5.2,8.9,0.4022988505747126,9.0,-0.1,1\n",
    )
    .unwrap();

    let dashboard = render_dashboard(&config).unwrap().dashboard;
    let chart = dashboard.chart("actual_vs_predicted").unwrap();
    let predicted: Vec<f64> = chart.series[1].points.iter().map(|p| p.y).collect();

    assert_eq!(chart.series[1].source, Some(PredictionSource::Persisted));
    assert_eq!(predicted, vec![7.9, 9.0]);
}
