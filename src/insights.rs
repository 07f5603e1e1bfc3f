use crate::error::{CalculationError, VelocistaError};
use crate::progress::{high_intensity_share, RpeBucket};
use crate::recovery::RecoveryAnalysis;
use crate::training_load::TrainingLoadPoint;
use crate::trends::{PerformanceTrend, TrendDirection};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insight severity, ordered from most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightCategory {
    Overtraining,
    Intensity,
    Progress,
    Performance,
    Recovery,
    Consistency,
}

impl fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InsightCategory::Overtraining => "overtraining",
            InsightCategory::Intensity => "intensity",
            InsightCategory::Progress => "progress",
            InsightCategory::Performance => "performance",
            InsightCategory::Recovery => "recovery",
            InsightCategory::Consistency => "consistency",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartInsight {
    pub category: InsightCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

/// Already-derived aggregates the insight rules are evaluated against
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    /// Load series in date order
    pub training_load: &'a [TrainingLoadPoint],
    pub rpe_distribution: &'a [RpeBucket],
    pub trends: &'a [PerformanceTrend],
    pub recovery: Option<&'a RecoveryAnalysis>,

    /// Sessions recorded within `window_days`
    pub total_sessions: usize,
    pub window_days: u32,
}

/// Insight rule thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Most recent load points inspected for overtraining (default: 7)
    pub overtraining_lookback: usize,

    /// Ratio above which a load point counts as overreaching (default: 1.5)
    pub overtraining_ratio: Decimal,

    /// Overreaching points needed to raise the alert (default: 3)
    pub overtraining_min_points: usize,

    /// RPE considered high intensity (default: 8)
    pub high_intensity_rpe: u8,

    /// Share of high intensity sessions that triggers the alert (default: 0.4)
    pub high_intensity_share: Decimal,

    /// Improving distances needed to report progress (default: 1)
    pub improving_min_distances: usize,

    /// Declining distances needed to raise the alert (default: 2)
    pub declining_min_distances: usize,

    /// Recovery outliers tolerated before the alert (default: 5)
    pub max_recovery_outliers: usize,

    /// Sessions per week below which frequency is low (default: 2)
    pub min_sessions_per_week: Decimal,

    /// Days used to count recent sessions (default: 28)
    pub window_days: u32,
}

impl Default for InsightConfig {
    fn default() -> Self {
        InsightConfig {
            overtraining_lookback: 7,
            overtraining_ratio: dec!(1.5),
            overtraining_min_points: 3,
            high_intensity_rpe: 8,
            high_intensity_share: dec!(0.4),
            improving_min_distances: 1,
            declining_min_distances: 2,
            max_recovery_outliers: 5,
            min_sessions_per_week: dec!(2),
            window_days: 28,
        }
    }
}

impl InsightConfig {
    pub fn validate(&self) -> Result<(), VelocistaError> {
        if self.window_days == 0 || self.overtraining_lookback == 0 {
            return Err(CalculationError::InvalidParameter {
                calculation: "insights".to_string(),
                parameter: "window".to_string(),
                value: format!("{}/{}", self.window_days, self.overtraining_lookback),
            }
            .into());
        }
        if self.high_intensity_rpe > 10 {
            return Err(CalculationError::InvalidParameter {
                calculation: "insights".to_string(),
                parameter: "high_intensity_rpe".to_string(),
                value: self.high_intensity_rpe.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

type InsightRule = fn(&InsightGenerator, &InsightInputs<'_>) -> Option<SmartInsight>;

/// Rules in emission order
const RULES: [InsightRule; 6] = [
    InsightGenerator::overtraining,
    InsightGenerator::high_intensity_frequency,
    InsightGenerator::improving_distances,
    InsightGenerator::declining_distances,
    InsightGenerator::irregular_recovery,
    InsightGenerator::low_frequency,
];

/// Rule-based insight generation over derived training statistics
#[derive(Debug, Clone, Default)]
pub struct InsightGenerator {
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InsightConfig) -> Self {
        InsightGenerator { config }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Evaluate every rule and return the triggered insights, most severe first.
    ///
    /// Insights of equal severity keep rule order.
    pub fn generate_smart_insights(&self, inputs: &InsightInputs<'_>) -> Vec<SmartInsight> {
        let mut insights: Vec<SmartInsight> =
            RULES.iter().filter_map(|rule| rule(self, inputs)).collect();
        insights.sort_by_key(|i| i.severity);

        tracing::debug!(count = insights.len(), "Smart insights generated");
        insights
    }

    fn overtraining(&self, inputs: &InsightInputs<'_>) -> Option<SmartInsight> {
        let points = inputs.training_load;
        let inspected = points.len().min(self.config.overtraining_lookback);
        let overreaching = points[points.len() - inspected..]
            .iter()
            .filter(|p| p.ratio > self.config.overtraining_ratio)
            .count();

        if overreaching < self.config.overtraining_min_points {
            return None;
        }

        Some(SmartInsight {
            category: InsightCategory::Overtraining,
            severity: Severity::High,
            title: "Overtraining risk".to_string(),
            description: format!(
                "{} of your last {} sessions had an acute:chronic load ratio above {}",
                overreaching, inspected, self.config.overtraining_ratio
            ),
            recommendation: "Schedule lighter sessions or a rest day to let chronic load catch up"
                .to_string(),
        })
    }

    fn high_intensity_frequency(&self, inputs: &InsightInputs<'_>) -> Option<SmartInsight> {
        let share = high_intensity_share(inputs.rpe_distribution, self.config.high_intensity_rpe);
        if share <= self.config.high_intensity_share {
            return None;
        }

        Some(SmartInsight {
            category: InsightCategory::Intensity,
            severity: Severity::Medium,
            title: "Frequent high-intensity sessions".to_string(),
            description: format!(
                "{}% of your sessions were rated RPE {} or higher",
                (share * dec!(100)).round_dp(0),
                self.config.high_intensity_rpe
            ),
            recommendation: "Alternate hard days with technical or recovery work".to_string(),
        })
    }

    fn improving_distances(&self, inputs: &InsightInputs<'_>) -> Option<SmartInsight> {
        let improving = distances_with(inputs.trends, TrendDirection::Improving);
        if improving.is_empty() || improving.len() < self.config.improving_min_distances {
            return None;
        }

        Some(SmartInsight {
            category: InsightCategory::Progress,
            severity: Severity::Low,
            title: "Times are improving".to_string(),
            description: format!("You are getting faster over {}", improving.join(", ")),
            recommendation: "Keep the current training structure for these distances".to_string(),
        })
    }

    fn declining_distances(&self, inputs: &InsightInputs<'_>) -> Option<SmartInsight> {
        let declining = distances_with(inputs.trends, TrendDirection::Declining);
        if declining.is_empty() || declining.len() < self.config.declining_min_distances {
            return None;
        }

        Some(SmartInsight {
            category: InsightCategory::Performance,
            severity: Severity::Medium,
            title: "Performance is declining".to_string(),
            description: format!("Your times got slower over {}", declining.join(", ")),
            recommendation: "Review recent load and recovery; fatigue often shows up first as slower times"
                .to_string(),
        })
    }

    fn irregular_recovery(&self, inputs: &InsightInputs<'_>) -> Option<SmartInsight> {
        let recovery = inputs.recovery?;
        let outliers = recovery.outliers.len();
        if outliers <= self.config.max_recovery_outliers {
            return None;
        }

        let description = match recovery.avg_recovery_between_reps {
            Some(avg) => format!(
                "{} rep recoveries were far from your {}s average",
                outliers,
                avg.round_dp(0)
            ),
            None => format!("{} rep recoveries were far from your average", outliers),
        };

        Some(SmartInsight {
            category: InsightCategory::Recovery,
            severity: Severity::Medium,
            title: "Irregular recovery intervals".to_string(),
            description,
            recommendation: "Time your recoveries and keep them within the optimal range"
                .to_string(),
        })
    }

    fn low_frequency(&self, inputs: &InsightInputs<'_>) -> Option<SmartInsight> {
        if inputs.window_days == 0 {
            return None;
        }

        let weeks = Decimal::from(inputs.window_days) / dec!(7);
        let per_week = Decimal::from(inputs.total_sessions) / weeks;
        if per_week >= self.config.min_sessions_per_week {
            return None;
        }

        Some(SmartInsight {
            category: InsightCategory::Consistency,
            severity: Severity::Low,
            title: "Low training frequency".to_string(),
            description: format!(
                "You averaged {} sessions per week over the last {} days",
                per_week.round_dp(1),
                inputs.window_days
            ),
            recommendation: format!(
                "Aim for at least {} sessions per week to keep adaptations going",
                self.config.min_sessions_per_week
            ),
        })
    }
}

fn distances_with(trends: &[PerformanceTrend], direction: TrendDirection) -> Vec<String> {
    trends
        .iter()
        .filter(|t| t.trend == direction)
        .map(|t| format!("{}m", t.distance.normalize()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::RecoveryOutlier;
    use chrono::NaiveDate;

    fn load_point(ratio: Decimal) -> TrainingLoadPoint {
        TrainingLoadPoint {
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            load: dec!(100),
            acute_load: dec!(100),
            chronic_load: dec!(100),
            ratio,
        }
    }

    fn trend(distance: Decimal, direction: TrendDirection) -> PerformanceTrend {
        PerformanceTrend {
            distance,
            recent_avg: dec!(11),
            previous_avg: dec!(11),
            change_percentage: Decimal::ZERO,
            trend: direction,
            recent_count: 1,
            previous_count: 1,
        }
    }

    fn rpe_bucket(rpe: u8, count: usize, percentage: Decimal) -> RpeBucket {
        RpeBucket {
            rpe,
            count,
            percentage,
        }
    }

    fn quiet_inputs() -> InsightInputs<'static> {
        InsightInputs {
            training_load: &[],
            rpe_distribution: &[],
            trends: &[],
            recovery: None,
            total_sessions: 12,
            window_days: 28,
        }
    }

    #[test]
    fn test_no_insights_for_healthy_training() {
        let insights = InsightGenerator::new().generate_smart_insights(&quiet_inputs());
        assert!(insights.is_empty());
    }

    #[test]
    fn test_low_frequency() {
        let inputs = InsightInputs {
            total_sessions: 4,
            window_days: 28,
            ..quiet_inputs()
        };
        let insights = InsightGenerator::new().generate_smart_insights(&inputs);

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Consistency);
        assert_eq!(insights[0].severity, Severity::Low);
    }

    #[test]
    fn test_two_sessions_per_week_is_enough() {
        let inputs = InsightInputs {
            total_sessions: 8,
            window_days: 28,
            ..quiet_inputs()
        };
        assert!(InsightGenerator::new().generate_smart_insights(&inputs).is_empty());
    }

    #[test]
    fn test_overtraining_only_looks_at_last_seven_points() {
        // Three spikes, but the oldest falls outside the last seven points
        let mut points = vec![load_point(dec!(2.0))];
        points.extend((0..4).map(|_| load_point(dec!(1.0))));
        points.extend((0..2).map(|_| load_point(dec!(1.6))));
        points.push(load_point(dec!(1.0)));

        let inputs = InsightInputs {
            training_load: &points,
            ..quiet_inputs()
        };
        assert!(InsightGenerator::new().generate_smart_insights(&inputs).is_empty());

        points.push(load_point(dec!(1.7)));
        let inputs = InsightInputs {
            training_load: &points,
            ..quiet_inputs()
        };
        let insights = InsightGenerator::new().generate_smart_insights(&inputs);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Overtraining);
        assert_eq!(insights[0].severity, Severity::High);
    }

    #[test]
    fn test_high_intensity_share_must_exceed_threshold() {
        let exactly_forty = vec![
            rpe_bucket(5, 3, dec!(60)),
            rpe_bucket(8, 2, dec!(40)),
        ];
        let inputs = InsightInputs {
            rpe_distribution: &exactly_forty,
            ..quiet_inputs()
        };
        assert!(InsightGenerator::new().generate_smart_insights(&inputs).is_empty());

        let half = vec![
            rpe_bucket(5, 1, dec!(50)),
            rpe_bucket(9, 1, dec!(50)),
        ];
        let inputs = InsightInputs {
            rpe_distribution: &half,
            ..quiet_inputs()
        };
        let insights = InsightGenerator::new().generate_smart_insights(&inputs);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Intensity);
    }

    #[test]
    fn test_trend_rules() {
        let one_decline = vec![
            trend(dec!(60), TrendDirection::Declining),
            trend(dec!(100), TrendDirection::Stable),
        ];
        let inputs = InsightInputs {
            trends: &one_decline,
            ..quiet_inputs()
        };
        assert!(InsightGenerator::new().generate_smart_insights(&inputs).is_empty());

        let mixed = vec![
            trend(dec!(60), TrendDirection::Declining),
            trend(dec!(100), TrendDirection::Improving),
            trend(dec!(200), TrendDirection::Declining),
        ];
        let inputs = InsightInputs {
            trends: &mixed,
            ..quiet_inputs()
        };
        let insights = InsightGenerator::new().generate_smart_insights(&inputs);

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].category, InsightCategory::Performance);
        assert!(insights[0].description.contains("60m, 200m"));
        assert_eq!(insights[1].category, InsightCategory::Progress);
        assert!(insights[1].description.contains("100m"));
    }

    #[test]
    fn test_recovery_outlier_limit() {
        let outlier = RecoveryOutlier {
            session_id: "s".to_string(),
            value: dec!(300),
            deviation: dec!(50),
        };
        let mut recovery = RecoveryAnalysis {
            avg_recovery_between_reps: Some(dec!(200)),
            avg_recovery_between_sets: None,
            optimal_range: None,
            outliers: vec![outlier.clone(); 5],
        };

        let inputs = InsightInputs {
            recovery: Some(&recovery),
            ..quiet_inputs()
        };
        assert!(InsightGenerator::new().generate_smart_insights(&inputs).is_empty());

        recovery.outliers.push(outlier);
        let inputs = InsightInputs {
            recovery: Some(&recovery),
            ..quiet_inputs()
        };
        let insights = InsightGenerator::new().generate_smart_insights(&inputs);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Recovery);
        assert_eq!(
            insights[0].description,
            "6 rep recoveries were far from your 200s average"
        );
    }

    #[test]
    fn test_sorted_by_severity_keeping_rule_order() {
        let points: Vec<TrainingLoadPoint> = (0..7).map(|_| load_point(dec!(1.8))).collect();
        let rpe = vec![rpe_bucket(9, 4, dec!(100))];
        let trends = vec![
            trend(dec!(60), TrendDirection::Improving),
            trend(dec!(100), TrendDirection::Declining),
            trend(dec!(200), TrendDirection::Declining),
        ];
        let recovery = RecoveryAnalysis {
            avg_recovery_between_reps: Some(dec!(100)),
            avg_recovery_between_sets: None,
            optimal_range: None,
            outliers: vec![
                RecoveryOutlier {
                    session_id: "s".to_string(),
                    value: dec!(10),
                    deviation: dec!(90),
                };
                6
            ],
        };
        let inputs = InsightInputs {
            training_load: &points,
            rpe_distribution: &rpe,
            trends: &trends,
            recovery: Some(&recovery),
            total_sessions: 4,
            window_days: 28,
        };

        let insights = InsightGenerator::new().generate_smart_insights(&inputs);
        let order: Vec<(Severity, InsightCategory)> =
            insights.iter().map(|i| (i.severity, i.category)).collect();

        assert_eq!(
            order,
            vec![
                (Severity::High, InsightCategory::Overtraining),
                (Severity::Medium, InsightCategory::Intensity),
                (Severity::Medium, InsightCategory::Performance),
                (Severity::Medium, InsightCategory::Recovery),
                (Severity::Low, InsightCategory::Progress),
                (Severity::Low, InsightCategory::Consistency),
            ]
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = InsightConfig {
            window_days: 0,
            ..InsightConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(InsightConfig::default().validate().is_ok());
    }
}
