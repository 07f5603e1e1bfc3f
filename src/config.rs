use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::ExportFormat;
use crate::logging::LogConfig;
use crate::error::VelocistaError;
use crate::stats::StatsConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Analyzer windows and thresholds
    #[serde(default)]
    pub stats: StatsConfig,

    /// Logging defaults (overridden by CLI flags and RUST_LOG)
    #[serde(default)]
    pub logging: LogConfig,

    /// Export preferences
    #[serde(default)]
    pub export: ExportSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Format used when `--format` is not given
    pub default_format: ExportFormat,

    /// Directory used for relative export paths
    pub output_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            default_format: ExportFormat::Json,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            stats: StatsConfig::default(),
            logging: LogConfig::default(),
            export: ExportSettings::default(),
        }
    }
}

/// Keys accepted by `get_value` / `set_value`
pub const CONFIG_KEYS: &[&str] = &[
    "stats.load.acute_window",
    "stats.load.chronic_window",
    "stats.recovery.outlier_threshold",
    "stats.recovery.optimal_margin",
    "stats.trends.recent_window_days",
    "stats.trends.stable_band",
    "stats.insights.overtraining_lookback",
    "stats.insights.overtraining_ratio",
    "stats.insights.overtraining_min_points",
    "stats.insights.high_intensity_rpe",
    "stats.insights.high_intensity_share",
    "stats.insights.improving_min_distances",
    "stats.insights.declining_min_distances",
    "stats.insights.max_recovery_outliers",
    "stats.insights.min_sessions_per_week",
    "stats.insights.window_days",
    "logging.level",
    "logging.format",
    "export.default_format",
    "export.output_dir",
];

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, key, e))
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.stats.validate().map_err(|e| {
            VelocistaError::Configuration(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise. A file that exists but
    /// cannot be read or fails validation is an error.
    pub fn load_if_present(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Set one dotted key in the config file at `path` and save it.
    ///
    /// The file is left untouched when it cannot be loaded or the new value
    /// is rejected.
    pub fn update_file(path: &Path, key: &str, value: &str) -> Result<Self> {
        let mut config = Self::load_if_present(path)?;
        config.set_value(key, value)?;
        config.save_to_file(path)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".velocista")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        match Self::load_if_present(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Ignoring unreadable config file"
                );
                Self::default()
            }
        }
    }

    /// Read a configuration value by dotted key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let stats = &self.stats;
        let value = match key {
            "stats.load.acute_window" => stats.load.acute_window.to_string(),
            "stats.load.chronic_window" => stats.load.chronic_window.to_string(),
            "stats.recovery.outlier_threshold" => stats.recovery.outlier_threshold.to_string(),
            "stats.recovery.optimal_margin" => stats.recovery.optimal_margin.to_string(),
            "stats.trends.recent_window_days" => stats.trends.recent_window_days.to_string(),
            "stats.trends.stable_band" => stats.trends.stable_band.to_string(),
            "stats.insights.overtraining_lookback" => {
                stats.insights.overtraining_lookback.to_string()
            }
            "stats.insights.overtraining_ratio" => stats.insights.overtraining_ratio.to_string(),
            "stats.insights.overtraining_min_points" => {
                stats.insights.overtraining_min_points.to_string()
            }
            "stats.insights.high_intensity_rpe" => stats.insights.high_intensity_rpe.to_string(),
            "stats.insights.high_intensity_share" => {
                stats.insights.high_intensity_share.to_string()
            }
            "stats.insights.improving_min_distances" => {
                stats.insights.improving_min_distances.to_string()
            }
            "stats.insights.declining_min_distances" => {
                stats.insights.declining_min_distances.to_string()
            }
            "stats.insights.max_recovery_outliers" => {
                stats.insights.max_recovery_outliers.to_string()
            }
            "stats.insights.min_sessions_per_week" => {
                stats.insights.min_sessions_per_week.to_string()
            }
            "stats.insights.window_days" => stats.insights.window_days.to_string(),
            "logging.level" => self.logging.level.to_filter(),
            "logging.format" => format!("{:?}", self.logging.format).to_lowercase(),
            "export.default_format" => self.export.default_format.extension().to_string(),
            "export.output_dir" => self.export.output_dir.display().to_string(),
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        };
        Ok(value)
    }

    /// Set a configuration value by dotted key.
    ///
    /// The change is validated before it is applied.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        let stats = &mut updated.stats;

        match key {
            "stats.load.acute_window" => stats.load.acute_window = parse(key, value)?,
            "stats.load.chronic_window" => stats.load.chronic_window = parse(key, value)?,
            "stats.recovery.outlier_threshold" => {
                stats.recovery.outlier_threshold = parse(key, value)?
            }
            "stats.recovery.optimal_margin" => stats.recovery.optimal_margin = parse(key, value)?,
            "stats.trends.recent_window_days" => {
                stats.trends.recent_window_days = parse(key, value)?
            }
            "stats.trends.stable_band" => stats.trends.stable_band = parse(key, value)?,
            "stats.insights.overtraining_lookback" => {
                stats.insights.overtraining_lookback = parse(key, value)?
            }
            "stats.insights.overtraining_ratio" => {
                stats.insights.overtraining_ratio = parse(key, value)?
            }
            "stats.insights.overtraining_min_points" => {
                stats.insights.overtraining_min_points = parse(key, value)?
            }
            "stats.insights.high_intensity_rpe" => {
                stats.insights.high_intensity_rpe = parse(key, value)?
            }
            "stats.insights.high_intensity_share" => {
                stats.insights.high_intensity_share = parse(key, value)?
            }
            "stats.insights.improving_min_distances" => {
                stats.insights.improving_min_distances = parse(key, value)?
            }
            "stats.insights.declining_min_distances" => {
                stats.insights.declining_min_distances = parse(key, value)?
            }
            "stats.insights.max_recovery_outliers" => {
                stats.insights.max_recovery_outliers = parse(key, value)?
            }
            "stats.insights.min_sessions_per_week" => {
                stats.insights.min_sessions_per_week = parse(key, value)?
            }
            "stats.insights.window_days" => stats.insights.window_days = parse(key, value)?,
            "logging.level" => updated.logging.level = parse(key, value)?,
            "logging.format" => updated.logging.format = parse(key, value)?,
            "export.default_format" => updated.export.default_format = parse(key, value)?,
            "export.output_dir" => updated.export.output_dir = PathBuf::from(value),
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }

        updated.stats.validate()?;
        updated.metadata.updated_at = Utc::now();
        *self = updated;
        Ok(())
    }
}
