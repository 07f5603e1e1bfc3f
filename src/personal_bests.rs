use crate::models::{DistanceBucket, PerformanceSample};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Best time recorded for a distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    /// Distance in meters
    pub distance: Decimal,

    /// Best time in seconds
    pub time: Decimal,

    /// Date the best time was set
    pub date: NaiveDate,

    /// Percentage time reduction versus the previous record, None for the first record
    pub improvement: Option<Decimal>,

    pub session_type: Option<String>,
}

/// Tracks the running personal best per distance over a chronological history
#[derive(Debug, Clone, Default)]
pub struct PersonalBestTracker;

impl PersonalBestTracker {
    pub fn new() -> Self {
        PersonalBestTracker
    }

    /// Calculate the current personal best for every distance.
    ///
    /// Samples are replayed in date order (ties keep input order). A sample
    /// only becomes the new record when its time is strictly lower than the
    /// current one; the output is sorted by distance.
    pub fn calculate_personal_bests(&self, samples: &[PerformanceSample]) -> Vec<PersonalBest> {
        let mut chronological: Vec<&PerformanceSample> = samples.iter().collect();
        chronological.sort_by_key(|s| s.date);

        let mut records: BTreeMap<DistanceBucket, PersonalBest> = BTreeMap::new();

        for sample in chronological {
            match records.get_mut(&sample.bucket()) {
                None => {
                    records.insert(
                        sample.bucket(),
                        PersonalBest {
                            distance: sample.distance,
                            time: sample.time,
                            date: sample.date,
                            improvement: None,
                            session_type: sample.session_type.clone(),
                        },
                    );
                }
                Some(record) if sample.time < record.time => {
                    let improvement = (record.time - sample.time)
                        .checked_div(record.time)
                        .map(|ratio| ratio * dec!(100));

                    *record = PersonalBest {
                        distance: sample.distance,
                        time: sample.time,
                        date: sample.date,
                        improvement,
                        session_type: sample.session_type.clone(),
                    };
                }
                Some(_) => {}
            }
        }

        tracing::debug!(
            samples = samples.len(),
            distances = records.len(),
            "Personal bests calculated"
        );

        records.into_values().collect()
    }
}
