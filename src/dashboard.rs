//! Dashboard export
//!
//! Turns the final analysis table into a chart document: four chart
//! specifications and a short list of findings. Drawing is left to whatever
//! front end consumes the JSON.

use crate::analysis::{pearson_correlation, LinearRegression};
use crate::config::StageConfig;
use crate::error::Result;
use crate::schema::{self, AnalyzedObservation};
use crate::utils::{round_to, DataLoader, DataSaver};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Remediation printed when the final table is missing
pub const ANALYSIS_INPUT_HINT: &str = "Run `build` and then `analyze` to create the final analysis table.";

pub const DASHBOARD_TITLE: &str = "Innovation strategy of the Japanese automotive industry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisFormat {
    Number,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Where the predicted profit values of a table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// Read from a persisted `predicted_profit` column
    Persisted,
    /// Rebuilt as `industry_profit - regression_residual`
    Residuals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl Point {
    fn xy(x: f64, y: f64) -> Self {
        Self { x, y, label: None, size: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub style: LineStyle,
    pub points: Vec<Point>,
    /// Set on predicted series only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PredictionSource>,
}

/// Least-squares line through a scatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: Option<f64>,
    pub start: Point,
    pub end: Point,
}

impl Trendline {
    /// Fit `y = intercept + slope·x`; `None` for fewer than two distinct x values
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return None;
        }
        let x = Array2::from_shape_fn((xs.len(), 1), |(r, _)| xs[r]);
        let y = Array1::from(ys.to_vec());

        let mut model = LinearRegression::new();
        model.fit(&x, &y).ok()?;
        let slope = model.coefficients.as_ref()?[0];
        let intercept = model.intercept?;
        if !slope.is_finite() || !intercept.is_finite() {
            return None;
        }

        let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if x_min == x_max {
            return None;
        }
        let r_squared = pearson_correlation(x.column(0), y.view()).map(|r| r * r);

        Some(Self {
            slope,
            intercept,
            r_squared,
            start: Point::xy(x_min, intercept + slope * x_min),
            end: Point::xy(x_max, intercept + slope * x_max),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub y_format: AxisFormat,
    pub series: Vec<ChartSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trendline: Option<Trendline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub topic: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: i64,
    pub last: i64,
}

/// The complete dashboard document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub period: Option<YearRange>,
    pub charts: Vec<Chart>,
    pub findings: Vec<Finding>,
}

/// What a completed dashboard stage did
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub dashboard: Dashboard,
    pub output_path: PathBuf,
}

fn year_series(name: &str, rows: &[AnalyzedObservation], value: impl Fn(&AnalyzedObservation) -> f64) -> ChartSeries {
    ChartSeries {
        name: name.to_string(),
        style: LineStyle::Solid,
        points: rows.iter().map(|r| Point::xy(r.year as f64, value(r))).collect(),
        source: None,
    }
}

fn investment_trend(rows: &[AnalyzedObservation]) -> Chart {
    Chart {
        id: "investment_trend".to_string(),
        title: "R&D and equipment investment".to_string(),
        kind: ChartKind::Line,
        x_label: "Year".to_string(),
        y_label: "Investment (trillion yen)".to_string(),
        y_format: AxisFormat::Number,
        series: vec![
            year_series("R&D", rows, |r| r.rd_investment),
            year_series("Equipment", rows, |r| r.equipment_investment),
        ],
        trendline: None,
    }
}

fn innovation_focus(rows: &[AnalyzedObservation]) -> Chart {
    Chart {
        id: "innovation_focus".to_string(),
        title: "R&D share of total investment".to_string(),
        kind: ChartKind::Bar,
        x_label: "Year".to_string(),
        y_label: "R&D share".to_string(),
        y_format: AxisFormat::Percent,
        series: vec![year_series("Innovation focus", rows, |r| r.innovation_focus)],
        trendline: None,
    }
}

fn focus_vs_profit(rows: &[AnalyzedObservation]) -> Chart {
    let xs: Vec<f64> = rows.iter().map(|r| r.innovation_focus).collect();
    let ys: Vec<f64> = rows.iter().map(|r| r.industry_profit).collect();

    Chart {
        id: "focus_vs_profit".to_string(),
        title: "Innovation focus and industry profit".to_string(),
        kind: ChartKind::Scatter,
        x_label: "Innovation focus (R&D share)".to_string(),
        y_label: "Industry profit (trillion yen)".to_string(),
        y_format: AxisFormat::Number,
        series: vec![ChartSeries {
            name: "Years".to_string(),
            style: LineStyle::Solid,
            points: rows
                .iter()
                .map(|r| Point {
                    x: r.innovation_focus,
                    y: r.industry_profit,
                    label: Some(r.year.to_string()),
                    size: Some(r.rd_investment),
                })
                .collect(),
            source: None,
        }],
        trendline: Trendline::fit(&xs, &ys),
    }
}

fn actual_vs_predicted(rows: &[AnalyzedObservation], source: PredictionSource) -> Chart {
    let mut predicted = year_series("Predicted profit", rows, |r| r.predicted_profit);
    predicted.style = LineStyle::Dashed;
    predicted.source = Some(source);

    Chart {
        id: "actual_vs_predicted".to_string(),
        title: "Actual vs predicted profit".to_string(),
        kind: ChartKind::Line,
        x_label: "Year".to_string(),
        y_label: "Profit (trillion yen)".to_string(),
        y_format: AxisFormat::Number,
        series: vec![year_series("Actual profit", rows, |r| r.industry_profit), predicted],
        trendline: None,
    }
}

fn change_text(label: &str, first: f64, last: f64) -> String {
    if first > 0.0 {
        let pct = (last - first) / first * 100.0;
        format!("{} moved from {:.2} to {:.2} trillion yen ({:+.1}%)", label, first, last, pct)
    } else {
        format!("{} moved from {:.2} to {:.2} trillion yen", label, first, last)
    }
}

fn strength(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        a if a >= 0.1 => "weak",
        _ => "negligible",
    }
}

fn findings(rows: &[AnalyzedObservation]) -> Vec<Finding> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return vec![Finding {
            topic: "data".to_string(),
            text: "No observations to analyse.".to_string(),
        }];
    };

    let mut out = Vec::with_capacity(4);

    out.push(Finding {
        topic: "trend".to_string(),
        text: format!(
            "{}; {} between {} and {}.",
            change_text("R&D investment", first.rd_investment, last.rd_investment),
            change_text("equipment investment", first.equipment_investment, last.equipment_investment),
            first.year,
            last.year
        ),
    });

    let mean_focus = rows.iter().map(|r| r.innovation_focus).sum::<f64>() / rows.len() as f64;
    let by_focus = |a: &&AnalyzedObservation, b: &&AnalyzedObservation| a.innovation_focus.total_cmp(&b.innovation_focus);
    let low = rows.iter().min_by(by_focus).unwrap_or(first);
    let high = rows.iter().max_by(by_focus).unwrap_or(last);
    out.push(Finding {
        topic: "innovation_focus".to_string(),
        text: format!(
            "R&D took {:.1}% of total investment on average, from {:.1}% in {} to {:.1}% in {}.",
            mean_focus * 100.0,
            low.innovation_focus * 100.0,
            low.year,
            high.innovation_focus * 100.0,
            high.year
        ),
    });

    let xs = Array1::from(rows.iter().map(|r| r.innovation_focus).collect::<Vec<_>>());
    let ys = Array1::from(rows.iter().map(|r| r.industry_profit).collect::<Vec<_>>());
    let relationship = match pearson_correlation(xs.view(), ys.view()) {
        Some(r) => format!(
            "Innovation focus and industry profit show a {} {} relationship (r = {:.3}).",
            strength(r),
            if r >= 0.0 { "positive" } else { "negative" },
            r
        ),
        None => "The relationship between innovation focus and profit cannot be measured on this data.".to_string(),
    };
    out.push(Finding {
        topic: "relationship".to_string(),
        text: relationship,
    });

    out.push(Finding {
        topic: "forecast".to_string(),
        text: format!(
            "For {} the model predicts {:.2} trillion yen of profit against {:.2} observed (residual {:+.2}).",
            last.year, last.predicted_profit, last.industry_profit, last.regression_residual
        ),
    });

    out
}

impl Dashboard {
    /// Build the dashboard from final rows; rows are ordered by year first.
    /// `predictions` tags the predicted profit series with its origin.
    pub fn from_rows(rows: &[AnalyzedObservation], predictions: PredictionSource) -> Self {
        let mut rows = rows.to_vec();
        rows.sort_by_key(|r| r.year);

        let period = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => Some(YearRange {
                first: first.year,
                last: last.year,
            }),
            _ => None,
        };

        Self {
            title: DASHBOARD_TITLE.to_string(),
            period,
            charts: vec![
                investment_trend(&rows),
                innovation_focus(&rows),
                focus_vs_profit(&rows),
                actual_vs_predicted(&rows, predictions),
            ],
            findings: findings(&rows),
        }
    }

    pub fn chart(&self, id: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.id == id)
    }

    /// Innovation focus per year, rounded for display
    pub fn focus_by_year(&self) -> Vec<(i64, f64)> {
        self.chart("innovation_focus")
            .and_then(|c| c.series.first())
            .map(|s| {
                s.points
                    .iter()
                    .map(|p| (p.x as i64, round_to(p.y, 4)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Dashboard stage: load the final table and write the dashboard document
///
/// Fails with `MissingInput` when the final table does not exist; nothing is
/// written in that case.
pub fn render_dashboard(config: &StageConfig) -> Result<DashboardSummary> {
    config.validate()?;
    info!(input = %config.input_path.display(), "Rendering dashboard");

    let df = DataLoader::new().load_stage_input(&config.input_path, ANALYSIS_INPUT_HINT)?;
    let rows = schema::analyzed_from_frame(&df)?;
    let predictions = if df.get_column_index(schema::columns::PREDICTED_PROFIT).is_some() {
        PredictionSource::Persisted
    } else {
        PredictionSource::Residuals
    };
    let dashboard = Dashboard::from_rows(&rows, predictions);

    DataSaver::save_json(&dashboard, &config.output_path)?;
    info!(
        charts = dashboard.charts.len(),
        findings = dashboard.findings.len(),
        output = %config.output_path.display(),
        "Dashboard written"
    );

    Ok(DashboardSummary {
        dashboard,
        output_path: config.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<AnalyzedObservation> {
        (0..4)
            .rev()
            .map(|i| {
                let rd = 3.0 + i as f64;
                let equipment = 5.0;
                let profit = 1.5 * rd + 0.5 * equipment + 1.0;
                AnalyzedObservation {
                    year: 2015 + i,
                    rd_investment: rd,
                    equipment_investment: equipment,
                    industry_profit: profit,
                    innovation_focus: rd / (rd + equipment),
                    predicted_profit: profit - 0.1,
                    regression_residual: 0.1,
                    cluster: 1,
                }
            })
            .collect()
    }

    #[test]
    fn test_four_charts_in_year_order() {
        let dashboard = Dashboard::from_rows(&rows(), PredictionSource::Persisted);
        assert_eq!(dashboard.charts.len(), 4);
        assert_eq!(dashboard.period, Some(YearRange { first: 2015, last: 2018 }));

        let trend = dashboard.chart("investment_trend").unwrap();
        let years: Vec<f64> = trend.series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(years, vec![2015.0, 2016.0, 2017.0, 2018.0]);

        let focus = dashboard.chart("innovation_focus").unwrap();
        assert_eq!(focus.y_format, AxisFormat::Percent);
        assert_eq!(dashboard.focus_by_year()[0], (2015, 0.375));
    }

    #[test]
    fn test_scatter_has_trendline_and_labels() {
        let dashboard = Dashboard::from_rows(&rows(), PredictionSource::Persisted);
        let scatter = dashboard.chart("focus_vs_profit").unwrap();
        let trend = scatter.trendline.as_ref().unwrap();

        assert!(trend.slope > 0.0);
        assert!(trend.start.x < trend.end.x);
        assert_eq!(scatter.series[0].points[0].label.as_deref(), Some("2015"));
        assert_eq!(scatter.series[0].points[0].size, Some(3.0));
    }

    #[test]
    fn test_predicted_series_dashed() {
        let dashboard = Dashboard::from_rows(&rows(), PredictionSource::Persisted);
        let chart = dashboard.chart("actual_vs_predicted").unwrap();
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[1].style, LineStyle::Dashed);
        assert_eq!(chart.series[0].source, None);
        assert_eq!(chart.series[1].source, Some(PredictionSource::Persisted));
    }

    #[test]
    fn test_prediction_source_serialized_on_predicted_series_only() {
        let dashboard = Dashboard::from_rows(&rows(), PredictionSource::Residuals);
        let value = serde_json::to_value(dashboard.chart("actual_vs_predicted").unwrap()).unwrap();

        assert!(value["series"][0].get("source").is_none());
        assert_eq!(value["series"][1]["source"], "residuals");
    }

    #[test]
    fn test_findings() {
        let dashboard = Dashboard::from_rows(&rows(), PredictionSource::Persisted);
        let topics: Vec<&str> = dashboard.findings.iter().map(|f| f.topic.as_str()).collect();
        assert_eq!(topics, vec!["trend", "innovation_focus", "relationship", "forecast"]);
        assert!(dashboard.findings[2].text.contains("strong positive"));
        assert!(dashboard.findings[3].text.contains("2018"));
    }

    #[test]
    fn test_empty_rows() {
        let dashboard = Dashboard::from_rows(&[], PredictionSource::Residuals);
        assert_eq!(dashboard.period, None);
        assert_eq!(dashboard.findings.len(), 1);
        assert!(dashboard.chart("focus_vs_profit").unwrap().trendline.is_none());
    }

    #[test]
    fn test_trendline_requires_spread() {
        assert!(Trendline::fit(&[0.5, 0.5, 0.5], &[1.0, 2.0, 3.0]).is_none());
        let line = Trendline::fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-9);
        assert!((line.intercept - 1.0).abs() < 1e-9);
        assert!((line.r_squared.unwrap() - 1.0).abs() < 1e-9);
    }
}
