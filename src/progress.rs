use crate::models::{LocationSample, MonthlySessionSample, RpeSample, RunningMean};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Training totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProgress {
    /// Month key in `YYYY-MM` form
    pub month: String,

    pub session_count: usize,

    /// Total distance in meters
    pub total_distance: Decimal,

    /// Mean of the sessions' average speeds (m/s), None if no session had one
    pub avg_speed: Option<Decimal>,

    /// Sessions in which a personal best was set
    pub pb_count: usize,
}

/// Per-location performance summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStat {
    pub location: String,

    /// Number of distinct sessions held at the location
    pub session_count: usize,

    /// Mean of the recorded times in seconds
    pub avg_performance: Option<Decimal>,

    /// Fastest recorded time in seconds
    pub best_performance: Option<Decimal>,
}

/// Share of sessions reported at one RPE value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpeBucket {
    pub rpe: u8,
    pub count: usize,
    pub percentage: Decimal,
}

#[derive(Debug, Default)]
struct MonthAccumulator {
    session_count: usize,
    total_distance: Decimal,
    speed: RunningMean,
    pb_count: usize,
}

#[derive(Debug, Default)]
struct LocationAccumulator<'a> {
    sessions: HashSet<&'a str>,
    times: RunningMean,
    best: Option<Decimal>,
}

/// Groups session-level records by month, location and RPE
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator;

impl ProgressAggregator {
    pub fn new() -> Self {
        ProgressAggregator
    }

    /// Aggregate sessions per calendar month, oldest month first
    pub fn calculate_monthly_progress(
        &self,
        sessions: &[MonthlySessionSample],
    ) -> Vec<MonthlyProgress> {
        let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();

        for session in sessions {
            let month = months
                .entry(session.date.format("%Y-%m").to_string())
                .or_default();

            month.session_count += 1;
            month.total_distance += session.distance;
            if let Some(speed) = session.avg_speed {
                month.speed.push(speed);
            }
            if session.is_pb {
                month.pb_count += 1;
            }
        }

        months
            .into_iter()
            .map(|(month, acc)| MonthlyProgress {
                month,
                session_count: acc.session_count,
                total_distance: acc.total_distance,
                avg_speed: acc.speed.mean(),
                pb_count: acc.pb_count,
            })
            .collect()
    }

    /// Summarize performance per location.
    ///
    /// Locations match exactly (case-sensitive) and several records from the
    /// same session count once.
    pub fn analyze_location_stats(&self, samples: &[LocationSample]) -> Vec<LocationStat> {
        let mut locations: BTreeMap<&str, LocationAccumulator> = BTreeMap::new();

        for sample in samples {
            let location = locations.entry(sample.location.as_str()).or_default();
            location.sessions.insert(sample.session_id.as_str());

            if let Some(time) = sample.avg_time {
                location.times.push(time);
                location.best = Some(location.best.map_or(time, |best| best.min(time)));
            }
        }

        locations
            .into_iter()
            .map(|(location, acc)| LocationStat {
                location: location.to_string(),
                session_count: acc.sessions.len(),
                avg_performance: acc.times.mean(),
                best_performance: acc.best,
            })
            .collect()
    }

    /// Distribution of sessions per reported RPE, lowest RPE first
    pub fn calculate_rpe_distribution(&self, samples: &[RpeSample]) -> Vec<RpeBucket> {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for sample in samples {
            *counts.entry(sample.rpe).or_insert(0) += 1;
        }

        let total = Decimal::from(samples.len());
        counts
            .into_iter()
            .map(|(rpe, count)| RpeBucket {
                rpe,
                count,
                percentage: Decimal::from(count) / total * dec!(100),
            })
            .collect()
    }
}

/// Fraction (0-1) of sessions reported at or above `min_rpe`
pub fn high_intensity_share(distribution: &[RpeBucket], min_rpe: u8) -> Decimal {
    let total: usize = distribution.iter().map(|b| b.count).sum();
    if total == 0 {
        return Decimal::ZERO;
    }

    let high: usize = distribution
        .iter()
        .filter(|b| b.rpe >= min_rpe)
        .map(|b| b.count)
        .sum();

    Decimal::from(high) / Decimal::from(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn month_sample(
        date: &str,
        distance: Decimal,
        speed: Option<Decimal>,
        is_pb: bool,
    ) -> MonthlySessionSample {
        MonthlySessionSample {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            distance,
            avg_speed: speed,
            is_pb,
        }
    }

    fn location(name: &str, session: &str, time: Option<Decimal>) -> LocationSample {
        LocationSample {
            location: name.to_string(),
            session_id: session.to_string(),
            avg_time: time,
        }
    }

    fn rpe(session: &str, value: u8) -> RpeSample {
        RpeSample {
            session_id: session.to_string(),
            rpe: value,
        }
    }

    #[test]
    fn test_monthly_grouping() {
        let progress = ProgressAggregator::new().calculate_monthly_progress(&[
            month_sample("2024-02-10", dec!(1200), Some(dec!(8.5)), false),
            month_sample("2024-01-31", dec!(800), None, true),
            month_sample("2024-02-01", dec!(600), Some(dec!(9.5)), true),
            month_sample("2023-12-15", dec!(1000), None, false),
        ]);

        let months: Vec<&str> = progress.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-02"]);

        let february = &progress[2];
        assert_eq!(february.session_count, 2);
        assert_eq!(february.total_distance, dec!(1800));
        assert_eq!(february.avg_speed, Some(dec!(9)));
        assert_eq!(february.pb_count, 1);

        let january = &progress[1];
        assert_eq!(january.avg_speed, None);
        assert_eq!(january.pb_count, 1);
    }

    #[test]
    fn test_location_sessions_are_deduplicated() {
        let stats = ProgressAggregator::new().analyze_location_stats(&[
            location("Stadium", "s1", Some(dec!(11.0))),
            location("Stadium", "s1", Some(dec!(11.4))),
        ]);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].session_count, 1);
        assert_eq!(stats[0].avg_performance, Some(dec!(11.2)));
        assert_eq!(stats[0].best_performance, Some(dec!(11.0)));
    }

    #[test]
    fn test_location_names_are_case_sensitive() {
        let stats = ProgressAggregator::new().analyze_location_stats(&[
            location("stadium", "s1", None),
            location("Stadium", "s2", Some(dec!(12))),
        ]);

        assert_eq!(stats.len(), 2);
        let lower = stats.iter().find(|s| s.location == "stadium").unwrap();
        assert_eq!(lower.session_count, 1);
        assert!(lower.avg_performance.is_none());
        assert!(lower.best_performance.is_none());
    }

    #[test]
    fn test_rpe_distribution() {
        let aggregator = ProgressAggregator::new();
        let distribution = aggregator.calculate_rpe_distribution(&[
            rpe("a", 9),
            rpe("b", 6),
            rpe("c", 9),
            rpe("d", 8),
        ]);

        assert_eq!(distribution.len(), 3);
        assert_eq!(distribution[0].rpe, 6);
        assert_eq!(distribution[0].percentage, dec!(25));
        assert_eq!(distribution[2].rpe, 9);
        assert_eq!(distribution[2].count, 2);
        assert_eq!(distribution[2].percentage, dec!(50));

        assert_eq!(high_intensity_share(&distribution, 8), dec!(0.75));
    }

    #[test]
    fn test_empty_inputs() {
        let aggregator = ProgressAggregator::new();
        assert!(aggregator.calculate_monthly_progress(&[]).is_empty());
        assert!(aggregator.analyze_location_stats(&[]).is_empty());
        assert!(aggregator.calculate_rpe_distribution(&[]).is_empty());
        assert_eq!(high_intensity_share(&[], 8), Decimal::ZERO);
    }
}
