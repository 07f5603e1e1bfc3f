//! Statistics engine facade
//!
//! `StatsCalculator` bundles the individual analyzers behind one immutable
//! configuration and can run all of them over a `TrainingLog` at once.

use crate::error::Result;
use crate::insights::{InsightConfig, InsightGenerator, InsightInputs, SmartInsight};
use crate::models::{
    LoadSample, LocationSample, MonthlySessionSample, PerformanceSample, RecoverySample, RpeSample,
    TrainingLog,
};
use crate::personal_bests::{PersonalBest, PersonalBestTracker};
use crate::progress::{LocationStat, MonthlyProgress, ProgressAggregator, RpeBucket};
use crate::recovery::{RecoveryAnalysis, RecoveryAnalyzer, RecoveryConfig};
use crate::training_load::{LoadConfig, TrainingLoadAnalyzer, TrainingLoadPoint};
use crate::trends::{PerformanceTrend, TrendAnalyzer, TrendConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Windows and thresholds for every analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub load: LoadConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,

    #[serde(default)]
    pub trends: TrendConfig,

    #[serde(default)]
    pub insights: InsightConfig,
}

impl StatsConfig {
    pub fn validate(&self) -> Result<()> {
        self.load.validate()?;
        self.recovery.validate()?;
        self.trends.validate()?;
        self.insights.validate()?;
        Ok(())
    }
}

/// Every derived structure for a training log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Reference date for windowed statistics
    pub as_of: NaiveDate,

    pub total_sessions: usize,

    /// Sessions within the insight window
    pub recent_sessions: usize,

    pub personal_bests: Vec<PersonalBest>,
    pub training_load: Vec<TrainingLoadPoint>,
    pub recovery: RecoveryAnalysis,
    pub trends: Vec<PerformanceTrend>,
    pub monthly_progress: Vec<MonthlyProgress>,
    pub locations: Vec<LocationStat>,
    pub rpe_distribution: Vec<RpeBucket>,
    pub insights: Vec<SmartInsight>,
}

/// Core statistics engine
#[derive(Debug, Clone, Default)]
pub struct StatsCalculator {
    personal_bests: PersonalBestTracker,
    load: TrainingLoadAnalyzer,
    recovery: RecoveryAnalyzer,
    trends: TrendAnalyzer,
    progress: ProgressAggregator,
    insights: InsightGenerator,
}

impl StatsCalculator {
    /// Create a calculator with default windows and thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator with a validated custom configuration
    pub fn with_config(config: StatsConfig) -> Result<Self> {
        config.validate()?;

        Ok(StatsCalculator {
            personal_bests: PersonalBestTracker::new(),
            load: TrainingLoadAnalyzer::with_config(config.load),
            recovery: RecoveryAnalyzer::with_config(config.recovery),
            trends: TrendAnalyzer::with_config(config.trends),
            progress: ProgressAggregator::new(),
            insights: InsightGenerator::with_config(config.insights),
        })
    }

    pub fn calculate_personal_bests(&self, samples: &[PerformanceSample]) -> Vec<PersonalBest> {
        self.personal_bests.calculate_personal_bests(samples)
    }

    pub fn calculate_training_load(&self, sessions: &[LoadSample]) -> Vec<TrainingLoadPoint> {
        self.load.calculate_training_load(sessions)
    }

    pub fn analyze_recovery(&self, samples: &[RecoverySample]) -> RecoveryAnalysis {
        self.recovery.analyze_recovery(samples)
    }

    pub fn analyze_performance_trends(
        &self,
        samples: &[PerformanceSample],
        as_of: Option<NaiveDate>,
    ) -> Vec<PerformanceTrend> {
        self.trends.analyze_performance_trends(samples, as_of)
    }

    pub fn analyze_performance_trends_with_window(
        &self,
        samples: &[PerformanceSample],
        as_of: Option<NaiveDate>,
        window_days: u32,
    ) -> Vec<PerformanceTrend> {
        self.trends.analyze_with_window(samples, as_of, window_days)
    }

    pub fn calculate_monthly_progress(
        &self,
        sessions: &[MonthlySessionSample],
    ) -> Vec<MonthlyProgress> {
        self.progress.calculate_monthly_progress(sessions)
    }

    pub fn analyze_location_stats(&self, samples: &[LocationSample]) -> Vec<LocationStat> {
        self.progress.analyze_location_stats(samples)
    }

    pub fn calculate_rpe_distribution(&self, samples: &[RpeSample]) -> Vec<RpeBucket> {
        self.progress.calculate_rpe_distribution(samples)
    }

    pub fn generate_smart_insights(&self, inputs: &InsightInputs<'_>) -> Vec<SmartInsight> {
        self.insights.generate_smart_insights(inputs)
    }

    /// Run every analyzer over a training log
    pub fn build_report(&self, log: &TrainingLog, as_of: Option<NaiveDate>) -> StatsReport {
        let as_of = as_of.unwrap_or_else(|| chrono::Utc::now().date_naive());
        let window_days = self.insights.config().window_days;

        let performance = log.performance_samples();
        let personal_bests = self.calculate_personal_bests(&performance);
        let trends = self.analyze_performance_trends(&performance, Some(as_of));
        let training_load = self.calculate_training_load(&log.load_samples());
        let recovery = self.analyze_recovery(&log.recovery_samples());
        let monthly_progress = self.calculate_monthly_progress(&log.monthly_samples());
        let locations = self.analyze_location_stats(&log.location_samples());
        let rpe_distribution = self.calculate_rpe_distribution(&log.rpe_samples());
        let recent_sessions = log.sessions_in_window(as_of, window_days);

        let insights = self.generate_smart_insights(&InsightInputs {
            training_load: &training_load,
            rpe_distribution: &rpe_distribution,
            trends: &trends,
            recovery: Some(&recovery),
            total_sessions: recent_sessions,
            window_days,
        });

        tracing::info!(
            sessions = log.sessions.len(),
            exercises = log.exercises.len(),
            insights = insights.len(),
            %as_of,
            "Stats report built"
        );

        StatsReport {
            as_of,
            total_sessions: log.sessions.len(),
            recent_sessions,
            personal_bests,
            training_load,
            recovery,
            trends,
            monthly_progress,
            locations,
            rpe_distribution,
            insights,
        }
    }
}
