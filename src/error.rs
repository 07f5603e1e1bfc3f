//! Unified error hierarchy for Velocista
//!
//! The statistics engine itself never fails; errors come from the edges of
//! the crate: reading training logs, writing exports and loading
//! configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all Velocista operations
#[derive(Debug, Error)]
pub enum VelocistaError {
    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },
}

/// Result type alias for Velocista operations
pub type Result<T> = std::result::Result<T, VelocistaError>;

impl VelocistaError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, VelocistaError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VelocistaError::ImportExport(ImportExportError::FileNotFound { .. }) => {
                ErrorSeverity::Warning
            }
            VelocistaError::Validation(_) => ErrorSeverity::Warning,
            VelocistaError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            VelocistaError::ImportExport(ImportExportError::FileNotFound { path }) => {
                format!("Could not find training log: {}", path.display())
            }
            VelocistaError::ImportExport(ImportExportError::UnsupportedFormat { format }) => {
                format!("Unsupported file format '{}'. Use json or csv.", format)
            }
            VelocistaError::ImportExport(ImportExportError::ExportFailed { path, reason }) => {
                format!("Could not write {}: {}", path.display(), reason)
            }
            VelocistaError::Configuration(reason) => {
                format!("Invalid configuration in {}. Fix or remove the file.", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical error requiring immediate attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = VelocistaError::ImportExport(ImportExportError::FileNotFound {
            path: PathBuf::from("/test/log.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = VelocistaError::Configuration("bad window".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        let err = VelocistaError::Io(std::io::Error::new(std::io::ErrorKind::Interrupted, "x"));
        assert!(err.is_retryable());

        let err = VelocistaError::Validation("test".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = VelocistaError::ImportExport(ImportExportError::FileNotFound {
            path: PathBuf::from("log.json"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err: VelocistaError = CalculationError::InvalidParameter {
            calculation: "trends".to_string(),
            parameter: "window".to_string(),
            value: "0".to_string(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Calculation error: Invalid parameter for trends: window=0"
        );
    }
}
