use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Grouping key for distance-based aggregations.
///
/// Distances are compared by exact numeric value: `100` and `100.0` land in
/// the same bucket, `100` and `100.1` never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceBucket(Decimal);

impl DistanceBucket {
    pub fn new(distance: Decimal) -> Self {
        DistanceBucket(distance)
    }

    /// Distance in meters
    pub fn meters(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for DistanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0.normalize())
    }
}

/// One timed result over a distance on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// Distance in meters
    pub distance: Decimal,

    /// Time in seconds
    pub time: Decimal,

    /// Date the result was recorded
    pub date: NaiveDate,

    /// Type of the session the result belongs to (e.g. "speed", "competition")
    pub session_type: Option<String>,
}

impl PerformanceSample {
    pub fn bucket(&self) -> DistanceBucket {
        DistanceBucket::new(self.distance)
    }
}

/// Whether a recovery interval was taken between repetitions or between sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryKind {
    Rep,
    Set,
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryKind::Rep => write!(f, "rep"),
            RecoveryKind::Set => write!(f, "set"),
        }
    }
}

/// One recovery interval measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySample {
    pub session_id: String,

    /// Recovery duration in seconds
    pub value: Decimal,

    #[serde(rename = "type")]
    pub kind: RecoveryKind,
}

/// Training load inputs of a single session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSample {
    pub date: NaiveDate,

    /// Session volume in meters
    pub volume: Decimal,

    /// Session intensity on a 0-10 scale
    pub intensity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub location: String,
    pub session_id: String,
    pub avg_time: Option<Decimal>,
}

/// Per-session input for the monthly progress aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySessionSample {
    pub date: NaiveDate,

    /// Total distance covered in the session (meters)
    pub distance: Decimal,

    /// Average speed in m/s, if any exercise was timed
    pub avg_speed: Option<Decimal>,

    /// True if a personal best was set during the session
    pub is_pb: bool,
}

/// Rate of perceived exertion reported for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpeSample {
    pub session_id: String,
    pub rpe: u8,
}

/// A recorded training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier for the session
    pub id: String,

    pub date: NaiveDate,

    #[serde(default)]
    pub session_type: Option<String>,

    /// Track or venue where the session took place
    #[serde(default)]
    pub location: Option<String>,

    /// Rate of Perceived Exertion (0-10)
    #[serde(default)]
    pub rpe: Option<u8>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// A single exercise performed within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub session_id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Distance of one repetition in meters
    pub distance: Decimal,

    /// Best (or only) time for the distance in seconds
    #[serde(default)]
    pub time: Option<Decimal>,

    #[serde(default = "default_count")]
    pub sets: u16,

    #[serde(default = "default_count")]
    pub reps: u16,

    /// Recovery between repetitions in seconds
    #[serde(default)]
    pub recovery_between_reps: Option<Decimal>,

    /// Recovery between sets in seconds
    #[serde(default)]
    pub recovery_between_sets: Option<Decimal>,

    #[serde(default)]
    pub is_pb: bool,
}

fn default_count() -> u16 {
    1
}

impl ExerciseRecord {
    /// Total meters covered across all sets and repetitions
    pub fn volume(&self) -> Decimal {
        self.distance * Decimal::from(self.sets) * Decimal::from(self.reps)
    }
}

/// A training log export: sessions plus the exercises recorded in them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,

    #[serde(default)]
    pub exercises: Vec<ExerciseRecord>,
}

impl TrainingLog {
    pub fn new(sessions: Vec<SessionRecord>, exercises: Vec<ExerciseRecord>) -> Self {
        TrainingLog {
            sessions,
            exercises,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session_index(&self) -> HashMap<&str, &SessionRecord> {
        self.sessions.iter().map(|s| (s.id.as_str(), s)).collect()
    }

    fn exercise_index(&self) -> HashMap<&str, Vec<&ExerciseRecord>> {
        let mut index: HashMap<&str, Vec<&ExerciseRecord>> = HashMap::new();
        for exercise in &self.exercises {
            index
                .entry(exercise.session_id.as_str())
                .or_default()
                .push(exercise);
        }
        index
    }

    /// Sessions dated within `(as_of - days, as_of]`
    pub fn sessions_in_window(&self, as_of: NaiveDate, days: u32) -> usize {
        let start = as_of
            .checked_sub_days(chrono::Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN);
        self.sessions
            .iter()
            .filter(|s| s.date > start && s.date <= as_of)
            .count()
    }

    /// Timed exercises joined with their session's date and type
    pub fn performance_samples(&self) -> Vec<PerformanceSample> {
        let sessions = self.session_index();

        self.exercises
            .iter()
            .filter_map(|exercise| {
                let time = exercise.time?;
                let session = sessions.get(exercise.session_id.as_str())?;
                Some(PerformanceSample {
                    distance: exercise.distance,
                    time,
                    date: session.date,
                    session_type: session.session_type.clone(),
                })
            })
            .collect()
    }

    pub fn recovery_samples(&self) -> Vec<RecoverySample> {
        let mut samples = Vec::new();

        for exercise in &self.exercises {
            if let Some(value) = exercise.recovery_between_reps {
                samples.push(RecoverySample {
                    session_id: exercise.session_id.clone(),
                    value,
                    kind: RecoveryKind::Rep,
                });
            }
            if let Some(value) = exercise.recovery_between_sets {
                samples.push(RecoverySample {
                    session_id: exercise.session_id.clone(),
                    value,
                    kind: RecoveryKind::Set,
                });
            }
        }

        samples
    }

    /// One load sample per session with a reported RPE.
    ///
    /// Volume is the sum of the session's exercise volumes and the RPE is
    /// used as the intensity.
    pub fn load_samples(&self) -> Vec<LoadSample> {
        let exercises = self.exercise_index();

        self.sessions
            .iter()
            .filter_map(|session| {
                let rpe = session.rpe?;
                Some(LoadSample {
                    date: session.date,
                    volume: session_volume(exercises.get(session.id.as_str())),
                    intensity: Decimal::from(rpe),
                })
            })
            .collect()
    }

    /// Location samples for every session that names a location.
    ///
    /// Sessions without a timed exercise still yield one sample so they are
    /// counted.
    pub fn location_samples(&self) -> Vec<LocationSample> {
        let exercises = self.exercise_index();
        let mut samples = Vec::new();

        for session in &self.sessions {
            let Some(location) = &session.location else {
                continue;
            };

            let times: Vec<Decimal> = exercises
                .get(session.id.as_str())
                .map(|list| list.iter().filter_map(|e| e.time).collect())
                .unwrap_or_default();

            if times.is_empty() {
                samples.push(LocationSample {
                    location: location.clone(),
                    session_id: session.id.clone(),
                    avg_time: None,
                });
            } else {
                samples.extend(times.into_iter().map(|time| LocationSample {
                    location: location.clone(),
                    session_id: session.id.clone(),
                    avg_time: Some(time),
                }));
            }
        }

        samples
    }

    pub fn monthly_samples(&self) -> Vec<MonthlySessionSample> {
        let exercises = self.exercise_index();

        self.sessions
            .iter()
            .map(|session| {
                let list = exercises.get(session.id.as_str());

                let mut speed = RunningMean::default();
                let mut is_pb = false;
                for exercise in list.into_iter().flatten() {
                    is_pb |= exercise.is_pb;
                    if let Some(time) = exercise.time.filter(|t| !t.is_zero()) {
                        speed.push(exercise.distance / time);
                    }
                }

                MonthlySessionSample {
                    date: session.date,
                    distance: session_volume(list),
                    avg_speed: speed.mean(),
                    is_pb,
                }
            })
            .collect()
    }

    pub fn rpe_samples(&self) -> Vec<RpeSample> {
        self.sessions
            .iter()
            .filter_map(|session| {
                session.rpe.map(|rpe| RpeSample {
                    session_id: session.id.clone(),
                    rpe,
                })
            })
            .collect()
    }
}

fn session_volume(exercises: Option<&Vec<&ExerciseRecord>>) -> Decimal {
    exercises
        .into_iter()
        .flatten()
        .map(|e| e.volume())
        .sum()
}

/// Arithmetic mean accumulator scoped to a single aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RunningMean {
    sum: Decimal,
    count: usize,
}

impl RunningMean {
    pub(crate) fn push(&mut self, value: Decimal) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn mean(&self) -> Option<Decimal> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / Decimal::from(self.count))
        }
    }
}
