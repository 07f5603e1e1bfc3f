use crate::error::{ImportExportError, Result, VelocistaError};
use crate::models::TrainingLog;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;

pub mod csv;
pub mod json;

/// Trait for reading a training log from a file format
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read the training log from the file
    fn import_file(&self, file_path: &Path) -> Result<TrainingLog>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Picks an importer by file extension
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::JsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self { importers }
    }

    /// Import and validate a training log, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<TrainingLog> {
        if !file_path.exists() {
            return Err(ImportExportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let importer = self
            .importers
            .iter()
            .find(|i| i.can_import(file_path))
            .ok_or_else(|| ImportExportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?;

        tracing::info!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            "Importing training log"
        );

        let log = importer.import_file(file_path)?;
        validate_log(&log)?;

        tracing::debug!(
            sessions = log.sessions.len(),
            exercises = log.exercises.len(),
            "Training log imported"
        );

        Ok(log)
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn has_extension(file_path: &Path, extension: &str) -> bool {
    file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Check a training log before it reaches the statistics engine.
///
/// Rejects duplicate session ids, RPE outside 0-10, non-positive distances,
/// negative times or recoveries, and exercises pointing to unknown sessions.
pub fn validate_log(log: &TrainingLog) -> Result<()> {
    let mut session_ids = HashSet::new();

    for session in &log.sessions {
        if !session_ids.insert(session.id.as_str()) {
            return Err(VelocistaError::Validation(format!(
                "Duplicate session id: {}",
                session.id
            )));
        }
        if let Some(rpe) = session.rpe.filter(|rpe| *rpe > 10) {
            return Err(VelocistaError::Validation(format!(
                "Session {} has RPE {} outside 0-10",
                session.id, rpe
            )));
        }
    }

    for (index, exercise) in log.exercises.iter().enumerate() {
        if !session_ids.contains(exercise.session_id.as_str()) {
            return Err(VelocistaError::Validation(format!(
                "Exercise {} references unknown session {}",
                index, exercise.session_id
            )));
        }
        if exercise.distance <= Decimal::ZERO {
            return Err(VelocistaError::Validation(format!(
                "Exercise {} in session {} has non-positive distance {}",
                index, exercise.session_id, exercise.distance
            )));
        }

        let negative = [
            ("time", exercise.time),
            ("recovery_between_reps", exercise.recovery_between_reps),
            ("recovery_between_sets", exercise.recovery_between_sets),
        ]
        .into_iter()
        .find(|(_, value)| value.map_or(false, |v| v.is_sign_negative() && !v.is_zero()));

        if let Some((field, value)) = negative {
            return Err(VelocistaError::Validation(format!(
                "Exercise {} in session {} has negative {}: {}",
                index,
                exercise.session_id,
                field,
                value.unwrap_or_default()
            )));
        }
    }

    Ok(())
}
