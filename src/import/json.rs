use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::models::TrainingLog;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads a serialized `TrainingLog` (`{"sessions": [...], "exercises": [...]}`)
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<TrainingLog> {
        let reader = BufReader::new(File::open(file_path)?);
        let log = serde_json::from_reader(reader).map_err(|e| ImportExportError::ParseError {
            format: "JSON".to_string(),
            reason: format!("{} (line {}, column {})", e, e.line(), e.column()),
        })?;
        Ok(log)
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}
