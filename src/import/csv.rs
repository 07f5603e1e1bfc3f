use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::models::{ExerciseRecord, SessionRecord, TrainingLog};

/// One exercise per row, with the session columns repeated on every row.
///
/// A row without a distance records a session with no exercises.
#[derive(Debug, Deserialize)]
struct CsvRow {
    session_id: String,
    date: NaiveDate,
    session_type: Option<String>,
    location: Option<String>,
    rpe: Option<u8>,
    notes: Option<String>,
    exercise: Option<String>,
    distance: Option<Decimal>,
    time: Option<Decimal>,
    sets: Option<u16>,
    reps: Option<u16>,
    recovery_between_reps: Option<Decimal>,
    recovery_between_sets: Option<Decimal>,
    is_pb: Option<bool>,
}

/// CSV importer with flexible column names
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(
            &mut column_mapping,
            "session_id",
            &["session_id", "session", "sessionid"],
        );
        Self::add_mapping(&mut column_mapping, "date", &["date", "session_date", "day"]);
        Self::add_mapping(
            &mut column_mapping,
            "session_type",
            &["session_type", "type", "sessiontype"],
        );
        Self::add_mapping(&mut column_mapping, "location", &["location", "venue", "track"]);
        Self::add_mapping(&mut column_mapping, "rpe", &["rpe", "effort", "perceived_exertion"]);
        Self::add_mapping(&mut column_mapping, "exercise", &["exercise", "exercise_name", "name"]);
        Self::add_mapping(&mut column_mapping, "distance", &["distance", "distance_m", "meters"]);
        Self::add_mapping(&mut column_mapping, "time", &["time", "time_s", "seconds", "best_time"]);
        Self::add_mapping(
            &mut column_mapping,
            "recovery_between_reps",
            &["recovery_between_reps", "rep_recovery", "recovery_reps"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "recovery_between_sets",
            &["recovery_between_sets", "set_recovery", "recovery_sets"],
        );
        Self::add_mapping(&mut column_mapping, "is_pb", &["is_pb", "pb", "personal_best"]);

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_error(reason: impl Into<String>) -> ImportExportError {
        ImportExportError::ParseError {
            format: "CSV".to_string(),
            reason: reason.into(),
        }
    }

    /// Parse CSV content into a training log
    pub fn parse_reader<R: std::io::Read>(&self, reader: R) -> Result<TrainingLog> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let headers: StringRecord = reader
            .headers()?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();
        for required in ["session_id", "date"] {
            if !headers.iter().any(|h| h == required) {
                let reason = format!("missing required column '{}'", required);
                return Err(Self::parse_error(reason).into());
            }
        }
        reader.set_headers(headers);

        let mut log = TrainingLog::default();
        let mut seen_sessions: HashMap<String, NaiveDate> = HashMap::new();

        for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
            // Header is line 1
            let row = result.map_err(|e| Self::parse_error(format!("line {}: {}", index + 2, e)))?;

            match seen_sessions.get(&row.session_id) {
                Some(date) if *date != row.date => {
                    tracing::warn!(
                        session = %row.session_id,
                        first = %date,
                        row_date = %row.date,
                        "Conflicting dates for session, keeping the first"
                    );
                }
                Some(_) => {}
                None => {
                    seen_sessions.insert(row.session_id.clone(), row.date);
                    log.sessions.push(SessionRecord {
                        id: row.session_id.clone(),
                        date: row.date,
                        session_type: row.session_type.clone(),
                        location: row.location.clone(),
                        rpe: row.rpe,
                        notes: row.notes.clone(),
                    });
                }
            }

            if let Some(distance) = row.distance {
                log.exercises.push(ExerciseRecord {
                    session_id: row.session_id,
                    name: row.exercise,
                    distance,
                    time: row.time,
                    sets: row.sets.unwrap_or(1),
                    reps: row.reps.unwrap_or(1),
                    recovery_between_reps: row.recovery_between_reps,
                    recovery_between_sets: row.recovery_between_sets,
                    is_pb: row.is_pb.unwrap_or(false),
                });
            }
        }

        Ok(log)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<TrainingLog> {
        let file = std::fs::File::open(file_path)?;
        self.parse_reader(file)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rows_grouped_into_sessions() {
        let data = "\
session_id,date,type,location,rpe,exercise,distance,time,sets,reps,rep_recovery,set_recovery,pb
s1,2024-05-01,speed,Track,8,Flying 30,30,3.1,2,3,180,420,true
s1,2024-05-01,speed,Track,8,Block start,60,7.05,,,,,
s2,2024-05-03,tempo,Park,5,,,,,,,,
";
        let log = CsvImporter::new().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(log.sessions.len(), 2);
        assert_eq!(log.sessions[0].session_type.as_deref(), Some("speed"));
        assert_eq!(log.sessions[0].rpe, Some(8));
        assert_eq!(log.sessions[1].location.as_deref(), Some("Park"));

        assert_eq!(log.exercises.len(), 2);
        let first = &log.exercises[0];
        assert_eq!(first.name.as_deref(), Some("Flying 30"));
        assert_eq!(first.time, Some(dec!(3.1)));
        assert_eq!((first.sets, first.reps), (2, 3));
        assert_eq!(first.recovery_between_reps, Some(dec!(180)));
        assert_eq!(first.recovery_between_sets, Some(dec!(420)));
        assert!(first.is_pb);

        let second = &log.exercises[1];
        assert_eq!((second.sets, second.reps), (1, 1));
        assert!(second.recovery_between_reps.is_none());
        assert!(!second.is_pb);
    }

    #[test]
    fn test_column_aliases() {
        let importer = CsvImporter::new();
        assert_eq!(importer.normalize_column_name("Session ID"), "session_id");
        assert_eq!(importer.normalize_column_name("Venue"), "location");
        assert_eq!(importer.normalize_column_name("best-time"), "time");
        assert_eq!(importer.normalize_column_name("wind"), "wind");
    }

    #[test]
    fn test_missing_required_column() {
        let data = "date,distance\n2024-01-01,100\n";
        let err = CsvImporter::new().parse_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("session_id"));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let data = "session_id,date,distance\ns1,2024-01-01,100\ns2,not-a-date,60\n";
        let err = CsvImporter::new().parse_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let data = "session_id,date,distance,time,wind\ns1,2024-01-01,100,10.95,+1.2\n";
        let log = CsvImporter::new().parse_reader(data.as_bytes()).unwrap();
        assert_eq!(log.exercises[0].time, Some(dec!(10.95)));
    }
}
