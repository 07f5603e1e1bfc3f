use crate::error::Result;
use crate::export::export_failed;
use crate::insights::SmartInsight;
use crate::personal_bests::PersonalBest;
use crate::progress::{LocationStat, MonthlyProgress, RpeBucket};
use crate::stats::StatsReport;
use crate::training_load::TrainingLoadPoint;
use crate::trends::PerformanceTrend;
use chrono::NaiveDate;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct PersonalBestRow<'a> {
    distance: Decimal,
    time: Decimal,
    date: NaiveDate,
    improvement_pct: Option<Decimal>,
    session_type: Option<&'a str>,
}

#[derive(Serialize)]
struct TrainingLoadRow {
    date: NaiveDate,
    load: Decimal,
    acute_load: Decimal,
    chronic_load: Decimal,
    ratio: Decimal,
    risk: &'static str,
}

#[derive(Serialize)]
struct TrendRow {
    distance: Decimal,
    recent_avg: Decimal,
    previous_avg: Decimal,
    change_pct: Decimal,
    trend: crate::trends::TrendDirection,
    recent_count: usize,
    previous_count: usize,
}

fn write_rows<T, I, P>(rows: I, output_path: P) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let output_path = output_path.as_ref();
    let mut writer = Writer::from_path(output_path).map_err(|e| export_failed(output_path, e))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| export_failed(output_path, e))?;
    Ok(())
}

/// Export personal bests, improvement rounded to two decimals
pub fn export_personal_bests<P: AsRef<Path>>(bests: &[PersonalBest], output_path: P) -> Result<()> {
    write_rows(
        bests.iter().map(|pb| PersonalBestRow {
            distance: pb.distance,
            time: pb.time,
            date: pb.date,
            improvement_pct: pb.improvement.map(|i| i.round_dp(2)),
            session_type: pb.session_type.as_deref(),
        }),
        output_path,
    )
}

/// Export the training load series (suitable for spreadsheet plotting)
pub fn export_training_load<P: AsRef<Path>>(
    points: &[TrainingLoadPoint],
    output_path: P,
) -> Result<()> {
    write_rows(
        points.iter().map(|p| TrainingLoadRow {
            date: p.date,
            load: p.load.round_dp(2),
            acute_load: p.acute_load.round_dp(2),
            chronic_load: p.chronic_load.round_dp(2),
            ratio: p.ratio.round_dp(2),
            risk: p.risk().description(),
        }),
        output_path,
    )
}

pub fn export_trends<P: AsRef<Path>>(trends: &[PerformanceTrend], output_path: P) -> Result<()> {
    write_rows(
        trends.iter().map(|t| TrendRow {
            distance: t.distance,
            recent_avg: t.recent_avg.round_dp(3),
            previous_avg: t.previous_avg.round_dp(3),
            change_pct: t.change_percentage.round_dp(2),
            trend: t.trend,
            recent_count: t.recent_count,
            previous_count: t.previous_count,
        }),
        output_path,
    )
}

pub fn export_monthly_progress<P: AsRef<Path>>(
    months: &[MonthlyProgress],
    output_path: P,
) -> Result<()> {
    write_rows(months, output_path)
}

pub fn export_location_stats<P: AsRef<Path>>(
    locations: &[LocationStat],
    output_path: P,
) -> Result<()> {
    write_rows(locations, output_path)
}

pub fn export_rpe_distribution<P: AsRef<Path>>(
    buckets: &[RpeBucket],
    output_path: P,
) -> Result<()> {
    write_rows(buckets, output_path)
}

pub fn export_insights<P: AsRef<Path>>(insights: &[SmartInsight], output_path: P) -> Result<()> {
    write_rows(insights, output_path)
}

/// Write every table of a report into `dir`, one CSV file each
pub fn export_report_tables(report: &StatsReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| export_failed(dir, e))?;

    let path = |name: &str| dir.join(format!("{}.csv", name));
    let files = vec![
        path("personal_bests"),
        path("training_load"),
        path("trends"),
        path("monthly_progress"),
        path("locations"),
        path("rpe_distribution"),
        path("insights"),
    ];

    export_personal_bests(&report.personal_bests, &files[0])?;
    export_training_load(&report.training_load, &files[1])?;
    export_trends(&report.trends, &files[2])?;
    export_monthly_progress(&report.monthly_progress, &files[3])?;
    export_location_stats(&report.locations, &files[4])?;
    export_rpe_distribution(&report.rpe_distribution, &files[5])?;
    export_insights(&report.insights, &files[6])?;

    Ok(files)
}
