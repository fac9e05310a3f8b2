// Criterion benchmarks for Schedule Helper

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use chrono::{Duration, TimeZone, Utc};
use schedule_helper::adapters::EmailExtractor;
use schedule_helper::core::{generate_slots, AvailabilityMatcher, BusyInterval, SlotWindow, TimeInstant};

fn hourly_slots(count: usize, offset_minutes: i64) -> Vec<TimeInstant> {
    let base = Utc.with_ymd_and_hms(2025, 7, 14, 9, 0, 0).unwrap();
    (0..count)
        .map(|i| TimeInstant::from_utc(base + Duration::hours(i as i64) + Duration::minutes(offset_minutes)))
        .collect()
}

fn bench_matching(c: &mut Criterion) {
    let matcher = AvailabilityMatcher::new();
    let interviewer = hourly_slots(20, 0);

    let mut group = c.benchmark_group("match_availability");

    for candidate_count in [1, 5, 20, 100].iter() {
        // Offset by 90 minutes so most pairs land in the close tier
        let candidate = hourly_slots(*candidate_count, 90);

        group.bench_with_input(
            BenchmarkId::new("candidates", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| matcher.match_availability(black_box(&candidate), black_box(&interviewer)));
            },
        );
    }

    group.finish();
}

fn bench_slot_sweep(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 7, 14, 7, 30, 0).unwrap();
    let window = SlotWindow::default();
    let busy: Vec<BusyInterval> = (0..10)
        .map(|i| {
            let start = now + Duration::hours(2 + i * 5);
            BusyInterval {
                start: TimeInstant::from_utc(start),
                end: TimeInstant::from_utc(start + Duration::minutes(90)),
            }
        })
        .collect();

    c.bench_function("generate_slots_with_busy", |b| {
        b.iter(|| generate_slots(black_box(now), black_box(&window), black_box(&busy)));
    });
}

fn bench_extraction(c: &mut Criterion) {
    let extractor = EmailExtractor::new().unwrap();
    let now = Utc.with_ymd_and_hms(2025, 7, 14, 12, 0, 0).unwrap();
    let body = "Hi! I'm available Tuesday at 2pm or Wednesday at 10:30am. \
                Tomorrow at 4pm could also work, otherwise 7/18 at 9am.";

    c.bench_function("extract_times", |b| {
        b.iter(|| extractor.extract_times(black_box(body), chrono_tz::UTC, now));
    });
}

criterion_group!(
    benches,
    bench_matching,
    bench_slot_sweep,
    bench_extraction
);

criterion_main!(benches);
