//! Dataset builder
//!
//! Turns the raw yearly investment table into the enriched table used by the
//! analyzer: a simulated `industry_profit` and the `innovation_focus` ratio.

use crate::config::StageConfig;
use crate::error::Result;
use crate::random::{RandomSource, SeededRandom};
use crate::schema::{self, Observation, RawObservation};
use crate::utils::{round_to, DataLoader, DataSaver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Remediation printed when the raw table is missing
pub const RAW_INPUT_HINT: &str =
    "Create the raw yearly table (year, rd_investment, equipment_investment) before running `build`.";

/// Why a raw row was left out of the enriched table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DropReason {
    /// The year is null
    MissingYear,
    /// An investment value is null or not finite
    MissingInvestment,
    /// An investment value is below zero
    NegativeInvestment,
    /// The focus ratio is undefined or not strictly inside (0, 1)
    UndefinedFocus,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingYear => write!(f, "missing year"),
            DropReason::MissingInvestment => write!(f, "missing investment"),
            DropReason::NegativeInvestment => write!(f, "negative investment"),
            DropReason::UndefinedFocus => write!(f, "innovation focus undefined"),
        }
    }
}

/// A raw row excluded from the output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroppedRow {
    pub year: Option<i64>,
    pub reason: DropReason,
}

/// In-memory result of [`DatasetBuilder::build`]
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    pub observations: Vec<Observation>,
    pub dropped: Vec<DroppedRow>,
}

/// What a completed builder stage did
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    pub dropped: Vec<DroppedRow>,
    pub output_path: PathBuf,
}

/// Share of R&D in total investment
///
/// `None` when the ratio is undefined or not strictly between 0 and 1.
pub fn innovation_focus(rd_investment: f64, equipment_investment: f64) -> Option<f64> {
    let total = rd_investment + equipment_investment;
    if total == 0.0 {
        return None;
    }
    let focus = rd_investment / total;
    (focus.is_finite() && focus > 0.0 && focus < 1.0).then_some(focus)
}

/// Profit simulation and feature derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetBuilder {
    /// Profit contribution per unit of R&D investment
    pub rd_weight: f64,
    /// Profit contribution per unit of equipment investment
    pub equipment_weight: f64,
    /// Uniform noise bounds added to every profit value
    pub noise_low: f64,
    pub noise_high: f64,
    /// Decimal places kept in `industry_profit`
    pub profit_decimals: i32,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            rd_weight: 1.5,
            equipment_weight: 0.5,
            noise_low: 0.8,
            noise_high: 1.2,
            profit_decimals: 5,
        }
    }

    /// Set the uniform noise bounds
    pub fn with_noise(mut self, low: f64, high: f64) -> Self {
        self.noise_low = low;
        self.noise_high = high;
        self
    }

    /// Enrich raw rows
    ///
    /// One noise value is drawn per input row, in order, before any row is
    /// dropped, so dropping a row never changes the profit of another.
    pub fn build<R: RandomSource + ?Sized>(&self, raw: &[RawObservation], rng: &mut R) -> BuildResult {
        let mut observations = Vec::with_capacity(raw.len());
        let mut dropped = Vec::new();

        for row in raw {
            let noise = rng.uniform(self.noise_low, self.noise_high);

            match self.enrich(row, noise) {
                Ok(observation) => {
                    debug!(year = ?row.year, noise, profit = observation.industry_profit, "Enriched row");
                    observations.push(observation);
                }
                Err(reason) => {
                    warn!(year = ?row.year, %reason, "Dropping row");
                    dropped.push(DroppedRow { year: row.year, reason });
                }
            }
        }

        BuildResult { observations, dropped }
    }

    fn enrich(&self, row: &RawObservation, noise: f64) -> std::result::Result<Observation, DropReason> {
        let year = row.year.ok_or(DropReason::MissingYear)?;
        let (rd, equipment) = match (row.rd_investment, row.equipment_investment) {
            (Some(rd), Some(eq)) if rd.is_finite() && eq.is_finite() => (rd, eq),
            _ => return Err(DropReason::MissingInvestment),
        };
        if rd < 0.0 || equipment < 0.0 {
            return Err(DropReason::NegativeInvestment);
        }
        let focus = innovation_focus(rd, equipment).ok_or(DropReason::UndefinedFocus)?;
        let profit = self.rd_weight * rd + self.equipment_weight * equipment + noise;

        Ok(Observation {
            year,
            rd_investment: rd,
            equipment_investment: equipment,
            industry_profit: round_to(profit, self.profit_decimals),
            innovation_focus: focus,
        })
    }
}

/// Builder stage: load the raw table, enrich it, write the enriched table
///
/// Fails with `MissingInput` when the raw table does not exist; nothing is
/// written in that case.
pub fn build_dataset(config: &StageConfig) -> Result<BuildSummary> {
    config.validate()?;
    info!(input = %config.input_path.display(), "Building dataset");

    let df = DataLoader::new().load_stage_input(&config.input_path, RAW_INPUT_HINT)?;
    let raw = schema::raw_from_frame(&df)?;

    let mut rng = SeededRandom::new(config.random_seed);
    let result = DatasetBuilder::new().build(&raw, &mut rng);
    let years: Vec<i64> = result.observations.iter().map(|o| o.year).collect();
    schema::ensure_unique_years(&years)?;

    let mut out = schema::observations_to_frame(&result.observations)?;
    DataSaver::save_csv(&mut out, &config.output_path)?;

    info!(
        rows = result.observations.len(),
        dropped = result.dropped.len(),
        output = %config.output_path.display(),
        "Dataset written"
    );

    Ok(BuildSummary {
        input_rows: raw.len(),
        output_rows: result.observations.len(),
        dropped: result.dropped,
        output_path: config.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn raw(year: i64, rd: f64, eq: f64) -> RawObservation {
        RawObservation {
            year: Some(year),
            rd_investment: Some(rd),
            equipment_investment: Some(eq),
        }
    }

    #[test]
    fn test_innovation_focus() {
        assert_eq!(innovation_focus(3.0, 5.0), Some(0.375));
        assert!((innovation_focus(3.5, 5.2).unwrap() - 0.4023).abs() < 1e-4);
        assert_eq!(innovation_focus(0.0, 0.0), None);
        assert_eq!(innovation_focus(0.0, 4.0), None);
        assert_eq!(innovation_focus(4.0, 0.0), None);
    }

    #[test]
    fn test_profit_uses_injected_noise() {
        let rows = [raw(2015, 3.0, 5.0)];
        let mut rng = ScriptedRandom::constant(0.5);
        let result = DatasetBuilder::new().build(&rows, &mut rng);

        // 1.5 * 3.0 + 0.5 * 5.0 + 1.0
        assert_eq!(result.observations[0].industry_profit, 8.0);
    }

    #[test]
    fn test_profit_within_noise_bounds() {
        let rows = [raw(2015, 3.0, 5.0), raw(2016, 3.5, 5.2)];
        let result = DatasetBuilder::new().build(&rows, &mut SeededRandom::new(42));

        let p2015 = result.observations[0].industry_profit;
        assert!((7.8..=8.2).contains(&p2015), "profit {}", p2015);
        assert_eq!(result.observations[0].innovation_focus, 0.375);
    }

    #[test]
    fn test_dropped_rows_keep_noise_alignment() {
        let rows = [raw(2015, 1.0, 1.0), raw(2016, 0.0, 0.0), raw(2017, 1.0, 1.0)];
        let mut rng = ScriptedRandom::new(vec![0.0, 0.25, 0.5]);
        let result = DatasetBuilder::new().build(&rows, &mut rng);

        assert_eq!(result.observations.len(), 2);
        assert_eq!(
            result.dropped,
            vec![DroppedRow { year: Some(2016), reason: DropReason::UndefinedFocus }]
        );
        // Third row received the third draw (noise 1.0), not the second
        assert_eq!(result.observations[1].industry_profit, 3.0);
    }

    #[test]
    fn test_missing_and_negative_inputs_dropped() {
        let rows = [
            RawObservation { year: Some(2015), rd_investment: None, equipment_investment: Some(1.0) },
            RawObservation { year: None, rd_investment: Some(1.0), equipment_investment: Some(1.0) },
            raw(2016, -1.0, -1.0),
            raw(2017, f64::NAN, 1.0),
            raw(2018, 2.0, 3.0),
        ];
        let result = DatasetBuilder::new().build(&rows, &mut SeededRandom::new(42));

        assert_eq!(result.observations.len(), 1);
        let reasons: Vec<DropReason> = result.dropped.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DropReason::MissingInvestment,
                DropReason::MissingYear,
                DropReason::NegativeInvestment,
                DropReason::MissingInvestment,
            ]
        );
    }

    #[test]
    fn test_custom_noise_bounds() {
        let rows = [raw(2015, 3.0, 5.0)];
        let builder = DatasetBuilder::new().with_noise(0.0, 0.0);
        let result = builder.build(&rows, &mut SeededRandom::new(42));
        assert_eq!(result.observations[0].industry_profit, 7.0);
    }

    #[test]
    fn test_profit_rounded_to_five_places() {
        let rows = [raw(2015, 1.0, 1.0)];
        let mut rng = ScriptedRandom::constant(0.123456789);
        let result = DatasetBuilder::new().build(&rows, &mut rng);
        let profit = result.observations[0].industry_profit;
        assert_eq!(profit, round_to(profit, 5));
    }
}
