// Library interface for the Velocista statistics engine
// The CLI and the integration tests both build on these modules

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod insights;
pub mod logging;
pub mod models;
pub mod personal_bests;
pub mod progress;
pub mod recovery;
pub mod stats;
pub mod training_load;
pub mod trends;

// Re-export commonly used types for convenience
pub use models::*;
pub use error::{CalculationError, ImportExportError, Result, VelocistaError};
pub use insights::{
    InsightCategory, InsightConfig, InsightGenerator, InsightInputs, Severity, SmartInsight,
};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use personal_bests::{PersonalBest, PersonalBestTracker};
pub use progress::{LocationStat, MonthlyProgress, ProgressAggregator, RpeBucket};
pub use recovery::{
    OptimalRange, RecoveryAnalysis, RecoveryAnalyzer, RecoveryConfig, RecoveryOutlier,
};
pub use stats::{StatsCalculator, StatsConfig, StatsReport};
pub use training_load::{LoadConfig, LoadRisk, TrainingLoadAnalyzer, TrainingLoadPoint};
pub use trends::{PerformanceTrend, TrendAnalyzer, TrendConfig, TrendDirection};
