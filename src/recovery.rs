//! Recovery interval analysis
//!
//! Recovery samples are the rest periods an athlete takes between
//! repetitions and between sets. For sprint work the rep recovery is the one
//! that governs session quality:
//!
//! - **Average recovery** is computed separately for reps and sets.
//! - **Optimal range** is the rep average +/- 20%, rounded to whole seconds.
//! - **Outliers** are rep recoveries deviating more than 30% from the rep
//!   average. Set recoveries are never flagged.

use crate::error::{CalculationError, VelocistaError};
use crate::models::{RecoveryKind, RecoverySample, RunningMean};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Recommended rep recovery window in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl OptimalRange {
    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A rep recovery that deviates from the average beyond the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOutlier {
    pub session_id: String,

    /// Recovery duration in seconds
    pub value: Decimal,

    /// Absolute deviation from the rep average, in percent
    pub deviation: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAnalysis {
    pub avg_recovery_between_reps: Option<Decimal>,
    pub avg_recovery_between_sets: Option<Decimal>,
    pub optimal_range: Option<OptimalRange>,
    pub outliers: Vec<RecoveryOutlier>,
}

/// Recovery analysis thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Relative deviation above which a rep recovery is an outlier (default: 0.3)
    pub outlier_threshold: Decimal,

    /// Half-width of the optimal range relative to the rep average (default: 0.2)
    pub optimal_margin: Decimal,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            outlier_threshold: dec!(0.3),
            optimal_margin: dec!(0.2),
        }
    }
}

impl RecoveryConfig {
    pub fn validate(&self) -> Result<(), VelocistaError> {
        for (parameter, value) in [
            ("outlier_threshold", self.outlier_threshold),
            ("optimal_margin", self.optimal_margin),
        ] {
            if value.is_sign_negative() {
                return Err(CalculationError::InvalidParameter {
                    calculation: "recovery".to_string(),
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecoveryAnalyzer {
    config: RecoveryConfig,
}

impl RecoveryAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RecoveryConfig) -> Self {
        RecoveryAnalyzer { config }
    }

    pub fn analyze_recovery(&self, samples: &[RecoverySample]) -> RecoveryAnalysis {
        let mut reps = RunningMean::default();
        let mut sets = RunningMean::default();

        for sample in samples {
            match sample.kind {
                RecoveryKind::Rep => reps.push(sample.value),
                RecoveryKind::Set => sets.push(sample.value),
            }
        }

        let rep_mean = reps.mean();
        let optimal_range = rep_mean.map(|mean| OptimalRange {
            min: round_seconds(mean * (Decimal::ONE - self.config.optimal_margin)),
            max: round_seconds(mean * (Decimal::ONE + self.config.optimal_margin)),
        });

        let outliers = match rep_mean {
            Some(mean) if !mean.is_zero() => self.find_outliers(samples, mean),
            _ => Vec::new(),
        };

        if !outliers.is_empty() {
            tracing::debug!(count = outliers.len(), "Recovery outliers detected");
        }

        RecoveryAnalysis {
            avg_recovery_between_reps: rep_mean,
            avg_recovery_between_sets: sets.mean(),
            optimal_range,
            outliers,
        }
    }

    fn find_outliers(&self, samples: &[RecoverySample], mean: Decimal) -> Vec<RecoveryOutlier> {
        samples
            .iter()
            .filter(|s| s.kind == RecoveryKind::Rep)
            .filter_map(|s| {
                let deviation = (s.value - mean).abs() / mean.abs();
                (deviation > self.config.outlier_threshold).then(|| RecoveryOutlier {
                    session_id: s.session_id.clone(),
                    value: s.value,
                    deviation: deviation * dec!(100),
                })
            })
            .collect()
    }
}

fn round_seconds(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
