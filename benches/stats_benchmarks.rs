use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use velocista::{ExerciseRecord, SessionRecord, StatsCalculator, TrainingLog};

/// Benchmarks for the statistics engine over growing training logs

const DISTANCES: [Decimal; 4] = [dec!(30), dec!(60), dec!(100), dec!(150)];

fn create_training_log(days: usize) -> TrainingLog {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let locations = ["Track", "Park", "Indoor"];
    let mut sessions = Vec::with_capacity(days);
    let mut exercises = Vec::with_capacity(days * 2);

    for day in 0..days {
        let id = format!("s{}", day);
        sessions.push(SessionRecord {
            id: id.clone(),
            date: start + Duration::days(day as i64),
            session_type: Some(if day % 7 == 6 { "competition" } else { "speed" }.to_string()),
            location: Some(locations[day % locations.len()].to_string()),
            rpe: Some((5 + day % 5) as u8),
            notes: None,
        });

        for (i, distance) in DISTANCES.iter().enumerate().skip(day % 2).step_by(2) {
            // Slow drift with a weekly wobble
            let base = *distance / dec!(9.5);
            let wobble = Decimal::from((day % 7) as i64) * dec!(0.02);
            let drift = Decimal::from(day as i64) * dec!(0.001);
            exercises.push(ExerciseRecord {
                session_id: id.clone(),
                name: Some(format!("{}m rep {}", distance, i)),
                distance: *distance,
                time: Some((base + wobble - drift).max(dec!(2.5))),
                sets: 2,
                reps: 3,
                recovery_between_reps: Some(Decimal::from(150 + (day % 11) as i64 * 10)),
                recovery_between_sets: Some(dec!(480)),
                is_pb: false,
            });
        }
    }

    TrainingLog::new(sessions, exercises)
}

fn bench_personal_bests(c: &mut Criterion) {
    let calculator = StatsCalculator::new();
    let mut group = c.benchmark_group("Personal Bests");

    for &days in &[30, 365, 1825] {
        let samples = create_training_log(days).performance_samples();

        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("calculate_personal_bests", days),
            &samples,
            |b, samples| {
                b.iter(|| calculator.calculate_personal_bests(black_box(samples)));
            },
        );
    }

    group.finish();
}

fn bench_training_load(c: &mut Criterion) {
    let calculator = StatsCalculator::new();
    let mut group = c.benchmark_group("Training Load");

    for &days in &[30, 365, 1825] {
        let sessions = create_training_log(days).load_samples();

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(
            BenchmarkId::new("calculate_training_load", days),
            &sessions,
            |b, sessions| {
                b.iter(|| calculator.calculate_training_load(black_box(sessions)));
            },
        );
    }

    group.finish();
}

fn bench_full_report(c: &mut Criterion) {
    let calculator = StatsCalculator::new();
    let mut group = c.benchmark_group("Stats Report");
    group.sample_size(20);

    for &days in &[90, 365, 1825] {
        let log = create_training_log(days);
        let as_of = log.sessions.last().map(|s| s.date);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("build_report", days), &log, |b, log| {
            b.iter(|| calculator.build_report(black_box(log), as_of));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_personal_bests, bench_training_load, bench_full_report);
criterion_main!(benches);
