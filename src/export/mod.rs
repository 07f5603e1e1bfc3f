use crate::error::{ImportExportError, Result};
use crate::stats::StatsReport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ImportExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

pub(crate) fn export_failed(path: &Path, error: impl std::fmt::Display) -> ImportExportError {
    ImportExportError::ExportFailed {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

/// Write a stats report.
///
/// JSON goes to a single file. CSV writes one file per table into `output`,
/// which is created as a directory. Returns the files written.
pub fn export_report(
    report: &StatsReport,
    output: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    let written = match format {
        ExportFormat::Json => {
            json::export_json(report, output)?;
            vec![output.to_path_buf()]
        }
        ExportFormat::Csv => csv::export_report_tables(report, output)?,
    };

    tracing::info!(
        format = format.extension(),
        files = written.len(),
        output = %output.display(),
        "Report exported"
    );

    Ok(written)
}
