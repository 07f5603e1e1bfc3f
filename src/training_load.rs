use crate::error::{CalculationError, VelocistaError};
use crate::models::LoadSample;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Training load for one session with its rolling acute and chronic averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingLoadPoint {
    pub date: NaiveDate,

    /// Session load: volume x intensity / 10
    pub load: Decimal,

    /// Mean load over the short rolling window
    pub acute_load: Decimal,

    /// Mean load over the long rolling window
    pub chronic_load: Decimal,

    /// Acute:chronic workload ratio
    pub ratio: Decimal,
}

impl TrainingLoadPoint {
    pub fn risk(&self) -> LoadRisk {
        LoadRisk::from_ratio(self.ratio)
    }
}

/// Rolling window sizes for the acute:chronic workload ratio
///
/// Windows count sessions, not calendar days: the acute window covers the
/// last seven recorded sessions regardless of how far apart they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Sessions in the acute window (default: 7)
    pub acute_window: usize,

    /// Sessions in the chronic window (default: 28)
    pub chronic_window: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            acute_window: 7,
            chronic_window: 28,
        }
    }
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), VelocistaError> {
        if self.acute_window == 0 || self.chronic_window == 0 {
            return Err(CalculationError::InvalidParameter {
                calculation: "training load".to_string(),
                parameter: "window".to_string(),
                value: format!("{}/{}", self.acute_window, self.chronic_window),
            }
            .into());
        }
        Ok(())
    }
}

/// Injury risk interpretation of the acute:chronic ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadRisk {
    HighRisk,          // above 1.5
    Optimal,           // 0.8 to 1.5
    UnderConditioning, // below 0.8
}

impl LoadRisk {
    pub fn from_ratio(ratio: Decimal) -> Self {
        if ratio > dec!(1.5) {
            LoadRisk::HighRisk
        } else if ratio < dec!(0.8) {
            LoadRisk::UnderConditioning
        } else {
            LoadRisk::Optimal
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LoadRisk::HighRisk => "High injury risk",
            LoadRisk::Optimal => "Optimal load",
            LoadRisk::UnderConditioning => "Under-conditioning",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            LoadRisk::HighRisk => "Reduce volume or intensity until the ratio drops below 1.5",
            LoadRisk::Optimal => "Keep the current progression",
            LoadRisk::UnderConditioning => "Gradually increase training load",
        }
    }
}

/// Computes per-session load and the acute:chronic workload ratio
#[derive(Debug, Clone, Default)]
pub struct TrainingLoadAnalyzer {
    config: LoadConfig,
}

impl TrainingLoadAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoadConfig) -> Self {
        TrainingLoadAnalyzer { config }
    }

    /// Calculate the load series in date order.
    ///
    /// The ratio falls back to 1 when the chronic load is zero.
    pub fn calculate_training_load(&self, sessions: &[LoadSample]) -> Vec<TrainingLoadPoint> {
        let mut chronological: Vec<&LoadSample> = sessions.iter().collect();
        chronological.sort_by_key(|s| s.date);

        let loads: Vec<Decimal> = chronological
            .iter()
            .map(|s| s.volume * s.intensity / dec!(10))
            .collect();

        let series: Vec<TrainingLoadPoint> = chronological
            .iter()
            .enumerate()
            .map(|(i, session)| {
                let history = &loads[..=i];
                let acute_load = trailing_mean(history, self.config.acute_window);
                let chronic_load = trailing_mean(history, self.config.chronic_window);

                let ratio = if chronic_load > Decimal::ZERO {
                    acute_load / chronic_load
                } else {
                    Decimal::ONE
                };

                TrainingLoadPoint {
                    date: session.date,
                    load: loads[i],
                    acute_load,
                    chronic_load,
                    ratio,
                }
            })
            .collect();

        if let Some(last) = series.last() {
            tracing::debug!(
                sessions = series.len(),
                ratio = %last.ratio,
                risk = ?last.risk(),
                "Training load calculated"
            );
        }

        series
    }
}

/// Mean of the last `window` values
fn trailing_mean(values: &[Decimal], window: usize) -> Decimal {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.is_empty() {
        return Decimal::ZERO;
    }
    tail.iter().sum::<Decimal>() / Decimal::from(tail.len())
}
