//! Typed records shared by every stage
//!
//! Each stage reads and writes CSV through these records, so the column set a
//! stage produces is the column set the next stage expects.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical column names
pub mod columns {
    pub const YEAR: &str = "year";
    pub const RD_INVESTMENT: &str = "rd_investment";
    pub const EQUIPMENT_INVESTMENT: &str = "equipment_investment";
    pub const INDUSTRY_PROFIT: &str = "industry_profit";
    pub const INNOVATION_FOCUS: &str = "innovation_focus";
    pub const PREDICTED_PROFIT: &str = "predicted_profit";
    pub const REGRESSION_RESIDUAL: &str = "regression_residual";
    pub const CLUSTER: &str = "cluster";
}

use columns::*;

/// Columns the builder needs in its input
pub const RAW_SCHEMA: [&str; 3] = [YEAR, RD_INVESTMENT, EQUIPMENT_INVESTMENT];

/// Exact column order of the builder output
pub const BUILDER_SCHEMA: [&str; 5] = [
    YEAR,
    RD_INVESTMENT,
    EQUIPMENT_INVESTMENT,
    INDUSTRY_PROFIT,
    INNOVATION_FOCUS,
];

/// Exact column order of the analyzer output
pub const ANALYZER_SCHEMA: [&str; 7] = [
    YEAR,
    RD_INVESTMENT,
    EQUIPMENT_INVESTMENT,
    INDUSTRY_PROFIT,
    INNOVATION_FOCUS,
    REGRESSION_RESIDUAL,
    CLUSTER,
];

/// Analyzer output order when predictions are persisted
pub const ANALYZER_SCHEMA_WITH_PREDICTIONS: [&str; 8] = [
    YEAR,
    RD_INVESTMENT,
    EQUIPMENT_INVESTMENT,
    INDUSTRY_PROFIT,
    INNOVATION_FOCUS,
    PREDICTED_PROFIT,
    REGRESSION_RESIDUAL,
    CLUSTER,
];

/// Historical headers accepted on input and mapped to canonical names
pub const LEGACY_ALIASES: [(&str, &str); 8] = [
    ("Year", YEAR),
    ("R&D_Trillion_Yen", RD_INVESTMENT),
    ("Equipment_Trillion_Yen", EQUIPMENT_INVESTMENT),
    ("Industry_Profit", INDUSTRY_PROFIT),
    ("Innovation_Focus", INNOVATION_FOCUS),
    ("Predicted_Profit", PREDICTED_PROFIT),
    ("Regression_Residuals", REGRESSION_RESIDUAL),
    ("Cluster", CLUSTER),
];

/// Segment label written for every row until segmentation exists
pub const PLACEHOLDER_CLUSTER: i64 = 1;

/// One row of the raw yearly table (trillions of yen)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub year: Option<i64>,
    pub rd_investment: Option<f64>,
    pub equipment_investment: Option<f64>,
}

/// One enriched row as written by the builder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub year: i64,
    pub rd_investment: f64,
    pub equipment_investment: f64,
    pub industry_profit: f64,
    pub innovation_focus: f64,
}

/// One row of the final table as written by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedObservation {
    pub year: i64,
    pub rd_investment: f64,
    pub equipment_investment: f64,
    pub industry_profit: f64,
    pub innovation_focus: f64,
    pub predicted_profit: f64,
    pub regression_residual: f64,
    pub cluster: i64,
}

/// Column names of a frame, in order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Rename legacy headers to their canonical names
///
/// A legacy header is left alone when its canonical column is already present.
pub fn normalize_columns(df: &mut DataFrame) -> Result<()> {
    for (legacy, canonical) in LEGACY_ALIASES {
        if df.get_column_index(legacy).is_some() && df.get_column_index(canonical).is_none() {
            df.rename(legacy, canonical.into())?;
        }
    }
    Ok(())
}

/// Fail unless every name in `required` is a column of `df`
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| df.get_column_index(name).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::SchemaError(format!(
            "missing column(s): {}",
            missing.join(", ")
        )))
    }
}

/// Fail unless `df` has exactly `expected` columns in that order
pub fn check_exact_schema(df: &DataFrame, expected: &[&str]) -> Result<()> {
    let actual = column_names(df);
    if actual.iter().map(String::as_str).eq(expected.iter().copied()) {
        Ok(())
    } else {
        Err(PipelineError::SchemaError(format!(
            "expected columns [{}], found [{}]",
            expected.join(", "),
            actual.join(", ")
        )))
    }
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Integer column; a value with a fractional part is rejected, not truncated
fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    f64_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if !v.is_finite() || v.fract() != 0.0 => Err(PipelineError::SchemaError(format!(
                "non-integer '{}' value {} at row {}",
                name, v, row
            ))),
            Some(v) => Ok(Some(v as i64)),
            None => Ok(None),
        })
        .collect()
}

fn required_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    f64_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                PipelineError::SchemaError(format!("null '{}' at row {}", name, row))
            })
        })
        .collect()
}

fn years(df: &DataFrame) -> Result<Vec<i64>> {
    let years: Vec<i64> = i64_column(df, YEAR)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| PipelineError::SchemaError(format!("null '{}' at row {}", YEAR, row)))
        })
        .collect::<Result<_>>()?;
    ensure_unique_years(&years)?;
    Ok(years)
}

/// Fail if any year appears twice
pub fn ensure_unique_years(years: &[i64]) -> Result<()> {
    let mut seen = HashSet::with_capacity(years.len());
    for &year in years {
        if !seen.insert(year) {
            return Err(PipelineError::SchemaError(format!(
                "duplicate year {}",
                year
            )));
        }
    }
    Ok(())
}

/// Read raw rows; year and investments may be null
///
/// Year uniqueness is checked on the rows the builder keeps, not here.
pub fn raw_from_frame(df: &DataFrame) -> Result<Vec<RawObservation>> {
    require_columns(df, &RAW_SCHEMA)?;
    let years = i64_column(df, YEAR)?;
    let rd = f64_column(df, RD_INVESTMENT)?;
    let equipment = f64_column(df, EQUIPMENT_INVESTMENT)?;

    Ok(years
        .into_iter()
        .zip(rd)
        .zip(equipment)
        .map(|((year, rd_investment), equipment_investment)| RawObservation {
            year,
            rd_investment,
            equipment_investment,
        })
        .collect())
}

/// Read enriched rows; every value must be present
pub fn observations_from_frame(df: &DataFrame) -> Result<Vec<Observation>> {
    require_columns(df, &BUILDER_SCHEMA)?;
    let years = years(df)?;
    let rd = required_f64(df, RD_INVESTMENT)?;
    let equipment = required_f64(df, EQUIPMENT_INVESTMENT)?;
    let profit = required_f64(df, INDUSTRY_PROFIT)?;
    let focus = required_f64(df, INNOVATION_FOCUS)?;

    Ok((0..years.len())
        .map(|i| Observation {
            year: years[i],
            rd_investment: rd[i],
            equipment_investment: equipment[i],
            industry_profit: profit[i],
            innovation_focus: focus[i],
        })
        .collect())
}

/// Read final rows
///
/// `predicted_profit` is optional: without it the prediction is recovered
/// from the residual identity `predicted = profit - residual`.
pub fn analyzed_from_frame(df: &DataFrame) -> Result<Vec<AnalyzedObservation>> {
    require_columns(df, &ANALYZER_SCHEMA)?;
    let observations = observations_from_frame(df)?;
    let residuals = required_f64(df, REGRESSION_RESIDUAL)?;
    let clusters = i64_column(df, CLUSTER)?;
    let predicted = if df.get_column_index(PREDICTED_PROFIT).is_some() {
        Some(required_f64(df, PREDICTED_PROFIT)?)
    } else {
        None
    };

    Ok(observations
        .into_iter()
        .enumerate()
        .map(|(i, obs)| AnalyzedObservation {
            year: obs.year,
            rd_investment: obs.rd_investment,
            equipment_investment: obs.equipment_investment,
            industry_profit: obs.industry_profit,
            innovation_focus: obs.innovation_focus,
            predicted_profit: predicted
                .as_ref()
                .map_or(obs.industry_profit - residuals[i], |p| p[i]),
            regression_residual: residuals[i],
            cluster: clusters[i].unwrap_or(PLACEHOLDER_CLUSTER),
        })
        .collect())
}

/// Frame in [`BUILDER_SCHEMA`] order
pub fn observations_to_frame(rows: &[Observation]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(YEAR.into(), rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Column::new(RD_INVESTMENT.into(), rows.iter().map(|r| r.rd_investment).collect::<Vec<_>>()),
        Column::new(
            EQUIPMENT_INVESTMENT.into(),
            rows.iter().map(|r| r.equipment_investment).collect::<Vec<_>>(),
        ),
        Column::new(INDUSTRY_PROFIT.into(), rows.iter().map(|r| r.industry_profit).collect::<Vec<_>>()),
        Column::new(INNOVATION_FOCUS.into(), rows.iter().map(|r| r.innovation_focus).collect::<Vec<_>>()),
    ])?;
    Ok(df)
}

/// Frame in [`ANALYZER_SCHEMA`] order, or [`ANALYZER_SCHEMA_WITH_PREDICTIONS`]
/// when `with_predictions` is set
pub fn analyzed_to_frame(rows: &[AnalyzedObservation], with_predictions: bool) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(YEAR.into(), rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Column::new(RD_INVESTMENT.into(), rows.iter().map(|r| r.rd_investment).collect::<Vec<_>>()),
        Column::new(
            EQUIPMENT_INVESTMENT.into(),
            rows.iter().map(|r| r.equipment_investment).collect::<Vec<_>>(),
        ),
        Column::new(INDUSTRY_PROFIT.into(), rows.iter().map(|r| r.industry_profit).collect::<Vec<_>>()),
        Column::new(INNOVATION_FOCUS.into(), rows.iter().map(|r| r.innovation_focus).collect::<Vec<_>>()),
    ];
    if with_predictions {
        columns.push(Column::new(
            PREDICTED_PROFIT.into(),
            rows.iter().map(|r| r.predicted_profit).collect::<Vec<_>>(),
        ));
    }
    columns.push(Column::new(
        REGRESSION_RESIDUAL.into(),
        rows.iter().map(|r| r.regression_residual).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(CLUSTER.into(), rows.iter().map(|r| r.cluster).collect::<Vec<_>>()));

    Ok(DataFrame::new(columns)?)
}
