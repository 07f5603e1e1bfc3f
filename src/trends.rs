use crate::error::{CalculationError, VelocistaError};
use crate::models::{DistanceBucket, PerformanceSample, RunningMean};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a distance's times between two consecutive windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Times got faster
    Improving,
    Stable,
    /// Times got slower
    Declining,
}

impl TrendDirection {
    /// Classify a percentage change in average time.
    ///
    /// Lower times are better, so a negative change beyond the band is an
    /// improvement.
    pub fn from_change(change_percentage: Decimal, stable_band: Decimal) -> Self {
        if change_percentage < -stable_band {
            TrendDirection::Improving
        } else if change_percentage > stable_band {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTrend {
    /// Distance in meters
    pub distance: Decimal,

    /// Average time in the recent window
    pub recent_avg: Decimal,

    /// Average time in the window before it
    pub previous_avg: Decimal,

    pub change_percentage: Decimal,

    pub trend: TrendDirection,

    pub recent_count: usize,
    pub previous_count: usize,
}

/// Performance trend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Length of each comparison window in days (default: 30)
    pub recent_window_days: u32,

    /// Percentage change treated as stable in either direction (default: 2)
    pub stable_band: Decimal,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            recent_window_days: 30,
            stable_band: dec!(2),
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), VelocistaError> {
        if self.recent_window_days == 0 {
            return Err(CalculationError::InvalidParameter {
                calculation: "performance trends".to_string(),
                parameter: "recent_window_days".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.stable_band.is_sign_negative() {
            return Err(CalculationError::InvalidParameter {
                calculation: "performance trends".to_string(),
                parameter: "stable_band".to_string(),
                value: self.stable_band.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct WindowAccumulator {
    recent: RunningMean,
    previous: RunningMean,
}

/// Compares recent and previous average times per distance
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrendConfig) -> Self {
        TrendAnalyzer { config }
    }

    /// Analyze trends with the configured window, as of the given date
    pub fn analyze_performance_trends(
        &self,
        samples: &[PerformanceSample],
        as_of: Option<NaiveDate>,
    ) -> Vec<PerformanceTrend> {
        self.analyze_with_window(samples, as_of, self.config.recent_window_days)
    }

    /// Analyze trends over two consecutive windows of `window_days`.
    ///
    /// The recent window covers dates on or after `as_of - window_days`, the
    /// previous window the `window_days` before that. Older samples are
    /// ignored and distances missing from either window are not reported.
    pub fn analyze_with_window(
        &self,
        samples: &[PerformanceSample],
        as_of: Option<NaiveDate>,
        window_days: u32,
    ) -> Vec<PerformanceTrend> {
        let as_of = as_of.unwrap_or_else(|| chrono::Utc::now().date_naive());
        let window = chrono::Days::new(window_days as u64);
        let recent_cutoff = as_of.checked_sub_days(window).unwrap_or(NaiveDate::MIN);
        let previous_cutoff = recent_cutoff
            .checked_sub_days(window)
            .unwrap_or(NaiveDate::MIN);

        let mut windows: BTreeMap<DistanceBucket, WindowAccumulator> = BTreeMap::new();

        for sample in samples {
            if sample.date >= recent_cutoff {
                windows.entry(sample.bucket()).or_default().recent.push(sample.time);
            } else if sample.date >= previous_cutoff {
                windows.entry(sample.bucket()).or_default().previous.push(sample.time);
            }
        }

        let trends: Vec<PerformanceTrend> = windows
            .into_iter()
            .filter_map(|(bucket, acc)| {
                let recent_avg = acc.recent.mean()?;
                let previous_avg = acc.previous.mean()?;
                let change_percentage =
                    (recent_avg - previous_avg).checked_div(previous_avg)? * dec!(100);

                Some(PerformanceTrend {
                    distance: bucket.meters(),
                    recent_avg,
                    previous_avg,
                    change_percentage,
                    trend: TrendDirection::from_change(change_percentage, self.config.stable_band),
                    recent_count: acc.recent.count(),
                    previous_count: acc.previous.count(),
                })
            })
            .collect();

        tracing::debug!(
            %as_of,
            window_days,
            distances = trends.len(),
            "Performance trends analyzed"
        );

        trends
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn sample(distance: Decimal, time: Decimal, days_ago: u64) -> PerformanceSample {
        PerformanceSample {
            distance,
            time,
            date: as_of().checked_sub_days(chrono::Days::new(days_ago)).unwrap(),
            session_type: None,
        }
    }

    #[test]
    fn test_improving_trend() {
        let analyzer = TrendAnalyzer::new();
        let trends = analyzer.analyze_performance_trends(
            &[
                sample(dec!(100), dec!(11.0), 5),
                sample(dec!(100), dec!(11.4), 40),
                sample(dec!(100), dec!(11.6), 45),
            ],
            Some(as_of()),
        );

        assert_eq!(trends.len(), 1);
        let trend = &trends[0];
        assert_eq!(trend.recent_avg, dec!(11.0));
        assert_eq!(trend.previous_avg, dec!(11.5));
        assert_eq!(trend.recent_count, 1);
        assert_eq!(trend.previous_count, 2);
        assert!(trend.change_percentage < dec!(-4));
        assert_eq!(trend.trend, TrendDirection::Improving);
    }

    #[test]
    fn test_declining_and_stable() {
        let analyzer = TrendAnalyzer::new();
        let trends = analyzer.analyze_performance_trends(
            &[
                sample(dec!(60), dec!(7.5), 1),
                sample(dec!(60), dec!(7.0), 31),
                sample(dec!(200), dec!(24.2), 2),
                sample(dec!(200), dec!(24.0), 35),
            ],
            Some(as_of()),
        );

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].distance, dec!(60));
        assert_eq!(trends[0].trend, TrendDirection::Declining);
        assert_eq!(trends[1].distance, dec!(200));
        assert_eq!(trends[1].trend, TrendDirection::Stable);
    }

    #[test]
    fn test_window_boundaries() {
        let analyzer = TrendAnalyzer::new();
        // 30 days ago is the first recent day, 60 days ago the first previous day
        let trends = analyzer.analyze_performance_trends(
            &[
                sample(dec!(100), dec!(11.0), 30),
                sample(dec!(100), dec!(12.0), 60),
                sample(dec!(100), dec!(5.0), 61),
            ],
            Some(as_of()),
        );

        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].recent_avg, dec!(11.0));
        assert_eq!(trends[0].previous_avg, dec!(12.0));
    }

    #[test]
    fn test_distance_missing_a_window_is_excluded() {
        let analyzer = TrendAnalyzer::new();
        let trends = analyzer.analyze_performance_trends(
            &[
                sample(dec!(100), dec!(11.0), 3),
                sample(dec!(150), dec!(17.0), 40),
                sample(dec!(300), dec!(40.0), 100),
            ],
            Some(as_of()),
        );

        assert!(trends.is_empty());
    }

    #[test]
    fn test_custom_window() {
        let analyzer = TrendAnalyzer::new();
        let samples = [sample(dec!(100), dec!(11.0), 3), sample(dec!(100), dec!(12.0), 10)];

        assert_eq!(analyzer.analyze_with_window(&samples, Some(as_of()), 7).len(), 1);
        assert!(analyzer.analyze_with_window(&samples, Some(as_of()), 30).is_empty());
    }

    #[test]
    fn test_trend_direction_band() {
        assert_eq!(TrendDirection::from_change(dec!(-2), dec!(2)), TrendDirection::Stable);
        assert_eq!(TrendDirection::from_change(dec!(2), dec!(2)), TrendDirection::Stable);
        assert_eq!(TrendDirection::from_change(dec!(-2.01), dec!(2)), TrendDirection::Improving);
        assert_eq!(TrendDirection::from_change(dec!(2.01), dec!(2)), TrendDirection::Declining);
    }

    proptest! {
        #[test]
        fn test_trend_matches_change_percentage(
            entries in prop::collection::vec(
                (prop::sample::select(vec![60i64, 100, 200]), 900i64..3000i64, 0u64..70u64),
                0..40,
            )
        ) {
            let samples: Vec<PerformanceSample> = entries
                .into_iter()
                .map(|(d, centis, ago)| sample(Decimal::from(d), Decimal::new(centis, 2), ago))
                .collect();

            let analyzer = TrendAnalyzer::new();
            let trends = analyzer.analyze_performance_trends(&samples, Some(as_of()));

            for pair in trends.windows(2) {
                prop_assert!(pair[0].distance < pair[1].distance);
            }
            for trend in &trends {
                prop_assert!(trend.recent_count > 0 && trend.previous_count > 0);
                let expected = if trend.change_percentage < dec!(-2) {
                    TrendDirection::Improving
                } else if trend.change_percentage > dec!(2) {
                    TrendDirection::Declining
                } else {
                    TrendDirection::Stable
                };
                prop_assert_eq!(trend.trend, expected);
            }

            prop_assert_eq!(trends, analyzer.analyze_performance_trends(&samples, Some(as_of())));
        }
    }
}
