use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use velocista::config::{AppConfig, CONFIG_KEYS};
use velocista::export::{export_report, ExportFormat};
use velocista::import::ImportManager;
use velocista::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use velocista::{Severity, StatsCalculator, StatsConfig, TrainingLog, VelocistaError};

/// Velocista - Sprint Training Statistics CLI
///
/// Derives personal bests, training load, recovery patterns, performance
/// trends and coaching insights from a sprint training log.
#[derive(Parser)]
#[command(name = "velocista")]
#[command(version)]
#[command(about = "Sprint training statistics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Console log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Training log file (JSON or CSV)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Reference date for windowed statistics (YYYY-MM-DD, default: today)
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current personal best per distance
    Pbs {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Show daily load with acute/chronic averages and their ratio
    Load {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Analyze recovery intervals between reps and sets
    Recovery {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Compare recent and previous performance per distance
    Trends {
        #[command(flatten)]
        source: InputArgs,

        /// Window length in days (default from config)
        #[arg(short, long)]
        window: Option<u32>,
    },

    /// Summarize training per calendar month
    Monthly {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Summarize performance per training location
    Locations {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Generate coaching insights
    Insights {
        #[command(flatten)]
        source: InputArgs,

        /// Session frequency window in days (default from config)
        #[arg(short, long)]
        window: Option<u32>,
    },

    /// Build the full statistics report and export it
    Report {
        #[command(flatten)]
        source: InputArgs,

        /// Output file (JSON) or directory (CSV)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format (json, csv)
        #[arg(short = 'f', long)]
        format: Option<ExportFormat>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

#[derive(Tabled)]
struct PersonalBestRow {
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Time (s)")]
    time: String,
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Improvement")]
    improvement: String,
    #[tabled(rename = "Session")]
    session_type: String,
}

#[derive(Tabled)]
struct LoadRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Load")]
    load: Decimal,
    #[tabled(rename = "Acute")]
    acute: Decimal,
    #[tabled(rename = "Chronic")]
    chronic: Decimal,
    #[tabled(rename = "Ratio")]
    ratio: Decimal,
    #[tabled(rename = "Risk")]
    risk: &'static str,
}

#[derive(Tabled)]
struct OutlierRow {
    #[tabled(rename = "Session")]
    session_id: String,
    #[tabled(rename = "Recovery (s)")]
    value: Decimal,
    #[tabled(rename = "Deviation")]
    deviation: String,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Recent avg")]
    recent: Decimal,
    #[tabled(rename = "Previous avg")]
    previous: Decimal,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Trend")]
    trend: String,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Distance (m)")]
    distance: Decimal,
    #[tabled(rename = "Avg speed (m/s)")]
    avg_speed: String,
    #[tabled(rename = "PBs")]
    pbs: usize,
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Avg time (s)")]
    avg: String,
    #[tabled(rename = "Best time (s)")]
    best: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        let message = match err.downcast_ref::<VelocistaError>() {
            Some(e) => {
                tracing::debug!(
                    severity = ?e.severity(),
                    retryable = e.is_retryable(),
                    "Command failed"
                );
                e.user_message()
            }
            None => format!("{:#}", err),
        };
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let loaded = AppConfig::load_if_present(&config_path);

    let mut log_config = match &loaded {
        Ok(config) => config.logging.clone(),
        Err(_) => LogConfig::default(),
    };
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    let _guard = init_logging(&log_config)?;

    let config = match loaded {
        Ok(config) => config,
        // `config --set` writes the file back
        Err(e) if matches!(cli.command, Commands::Config { .. }) => return Err(e),
        Err(e) => {
            tracing::warn!(
                path = %config_path.display(),
                error = %e,
                "Ignoring unreadable config file, using defaults"
            );
            AppConfig::default()
        }
    };

    match cli.command {
        Commands::Pbs { source } => {
            let log = load_log(&source.input)?;
            let calculator = build_calculator(&config.stats)?;
            let bests = calculator.calculate_personal_bests(&log.performance_samples());

            println!("{}", "Personal bests".green().bold());
            print_table(bests.iter().map(|pb| PersonalBestRow {
                distance: format!("{}m", pb.distance.normalize()),
                time: pb.time.normalize().to_string(),
                date: pb.date,
                improvement: pb
                    .improvement
                    .map(|i| format!("{}%", i.round_dp(2)))
                    .unwrap_or_else(|| "-".to_string()),
                session_type: pb.session_type.clone().unwrap_or_else(|| "-".to_string()),
            }));
        }

        Commands::Load { source } => {
            let log = load_log(&source.input)?;
            let calculator = build_calculator(&config.stats)?;
            let points = calculator.calculate_training_load(&log.load_samples());

            println!("{}", "Training load".blue().bold());
            print_table(points.iter().map(|p| LoadRow {
                date: p.date,
                load: p.load.round_dp(1),
                acute: p.acute_load.round_dp(1),
                chronic: p.chronic_load.round_dp(1),
                ratio: p.ratio.round_dp(2),
                risk: p.risk().description(),
            }));

            if let Some(last) = points.last() {
                println!("\n{} {}", "Latest:".bold(), last.risk().recommendation());
            }
        }

        Commands::Recovery { source } => {
            let log = load_log(&source.input)?;
            let calculator = build_calculator(&config.stats)?;
            let analysis = calculator.analyze_recovery(&log.recovery_samples());

            println!("{}", "Recovery analysis".cyan().bold());
            println!(
                "  Between reps: {}",
                format_seconds(analysis.avg_recovery_between_reps)
            );
            println!(
                "  Between sets: {}",
                format_seconds(analysis.avg_recovery_between_sets)
            );
            if let Some(range) = analysis.optimal_range {
                println!("  Optimal rep recovery: {}-{}s", range.min, range.max);
            }

            if !analysis.outliers.is_empty() {
                println!("\n{}", "Irregular recoveries".yellow().bold());
                print_table(analysis.outliers.iter().map(|o| OutlierRow {
                    session_id: o.session_id.clone(),
                    value: o.value.normalize(),
                    deviation: format!("{}%", o.deviation.round_dp(1)),
                }));
            }
        }

        Commands::Trends { source, window } => {
            let log = load_log(&source.input)?;
            let calculator = build_calculator(&config.stats)?;
            let window = window.unwrap_or(config.stats.trends.recent_window_days);
            let trends = calculator.analyze_performance_trends_with_window(
                &log.performance_samples(),
                source.as_of,
                window,
            );

            println!(
                "{}",
                format!("Performance trends ({} day windows)", window).magenta().bold()
            );
            print_table(trends.iter().map(|t| TrendRow {
                distance: format!("{}m", t.distance.normalize()),
                recent: t.recent_avg.round_dp(2),
                previous: t.previous_avg.round_dp(2),
                change: format_change(t.change_percentage),
                trend: format!("{:?}", t.trend),
            }));
        }

        Commands::Monthly { source } => {
            let log = load_log(&source.input)?;
            let calculator = build_calculator(&config.stats)?;
            let months = calculator.calculate_monthly_progress(&log.monthly_samples());

            println!("{}", "Monthly progress".green().bold());
            print_table(months.iter().map(|m| MonthRow {
                month: m.month.clone(),
                sessions: m.session_count,
                distance: m.total_distance.normalize(),
                avg_speed: m
                    .avg_speed
                    .map(|s| s.round_dp(2).to_string())
                    .unwrap_or_else(|| "-".to_string()),
                pbs: m.pb_count,
            }));
        }

        Commands::Locations { source } => {
            let log = load_log(&source.input)?;
            let calculator = build_calculator(&config.stats)?;
            let locations = calculator.analyze_location_stats(&log.location_samples());

            println!("{}", "Locations".green().bold());
            print_table(locations.iter().map(|l| LocationRow {
                location: l.location.clone(),
                sessions: l.session_count,
                avg: l
                    .avg_performance
                    .map(|a| a.round_dp(2).to_string())
                    .unwrap_or_else(|| "-".to_string()),
                best: l
                    .best_performance
                    .map(|b| b.normalize().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }));
        }

        Commands::Insights { source, window } => {
            let log = load_log(&source.input)?;
            let mut stats = config.stats.clone();
            if let Some(window) = window {
                stats.insights.window_days = window;
            }
            let report = build_calculator(&stats)?.build_report(&log, source.as_of);

            println!("{}", format!("Insights as of {}", report.as_of).cyan().bold());
            if report.insights.is_empty() {
                println!("{}", "  Nothing to flag. Keep it up.".dimmed());
            }
            for insight in &report.insights {
                let tag = format!("[{}]", insight.severity);
                let tag = match insight.severity {
                    Severity::High => tag.red().bold(),
                    Severity::Medium => tag.yellow().bold(),
                    Severity::Low => tag.blue(),
                };
                println!("\n{} {} ({})", tag, insight.title.bold(), insight.category);
                println!("  {}", insight.description);
                println!("  {} {}", "→".green(), insight.recommendation);
            }
        }

        Commands::Report {
            source,
            output,
            format,
        } => {
            let log = load_log(&source.input)?;
            let report = build_calculator(&config.stats)?.build_report(&log, source.as_of);

            let format = format
                .or_else(|| output.as_deref().and_then(ExportFormat::from_path))
                .unwrap_or(config.export.default_format);
            let output = output.unwrap_or_else(|| match format {
                ExportFormat::Json => PathBuf::from("velocista_report.json"),
                ExportFormat::Csv => PathBuf::from("velocista_report"),
            });
            let output = if output.is_relative() {
                config.export.output_dir.join(output)
            } else {
                output
            };

            let written = export_report(&report, &output, format)?;

            println!("{}", "Report exported".yellow().bold());
            println!(
                "  Sessions: {} ({} in the last {} days)",
                report.total_sessions, report.recent_sessions, config.stats.insights.window_days
            );
            println!("  Personal bests: {}", report.personal_bests.len());
            println!("  Insights: {}", report.insights.len());
            for path in written {
                println!("  {} {}", "✓".green(), path.display());
            }
        }

        Commands::Config { list, set, get } => {
            if list {
                println!("{}", "Configuration".white().bold());
                println!("  File: {}", config_path.display().to_string().dimmed());
                for key in CONFIG_KEYS {
                    println!("  {} = {}", key, config.get_value(key)?);
                }
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .context("Expected key=value, e.g. stats.load.acute_window=7")?;
                AppConfig::update_file(&config_path, key.trim(), value.trim())?;
                println!("{} {} = {}", "✓".green(), key.trim(), value.trim());
            } else if let Some(key) = get {
                println!("{}", config.get_value(&key)?);
            } else {
                println!("Use --list, --get <key> or --set <key=value>");
            }
        }
    }

    Ok(())
}

fn build_calculator(stats: &StatsConfig) -> Result<StatsCalculator> {
    StatsCalculator::with_config(stats.clone()).context("Invalid statistics configuration")
}

fn load_log(path: &Path) -> Result<TrainingLog> {
    let log = ImportManager::new().import_file(path)?;
    if log.is_empty() {
        tracing::warn!(file = %path.display(), "Training log has no sessions");
    }
    Ok(log)
}

fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    let rows: Vec<T> = rows.into_iter().collect();
    if rows.is_empty() {
        println!("{}", "  No data".dimmed());
        return;
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn format_seconds(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{}s", v.round_dp(1)))
        .unwrap_or_else(|| "-".to_string())
}

fn format_change(change: Decimal) -> String {
    let change = change.round_dp(1);
    if change > Decimal::ZERO {
        format!("+{}%", change)
    } else {
        format!("{}%", change)
    }
}
