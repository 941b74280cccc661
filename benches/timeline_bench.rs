//! Benchmarks for timeline ordering, frame size selection and duplicate
//! detection.
//!
//! Measures the per-run bookkeeping over a few years of daily photos, with
//! and without heavy timestamp collisions.
//!
//! Run with: `cargo bench --bench timeline_bench`

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use photolapse::reconcile::find_duplicate_clusters;
use photolapse::{order, select_size, PhotoRecord, TimestampSource};

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// `count` daily photos in scrambled order; every `collide_every`-th photo
/// shares its predecessor's timestamp.
fn dataset(count: usize, collide_every: usize) -> Vec<PhotoRecord> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(20, 0, 0))
        .unwrap_or_default();

    (0..count)
        .map(|i| {
            let day = (i * 7_919) % count;
            let day = if collide_every > 0 && day % collide_every == 0 && day > 0 {
                day - 1
            } else {
                day
            };
            let (width, height) = if i % 5 == 0 { (3000, 4000) } else { (4000, 3000) };
            PhotoRecord {
                path: PathBuf::from(format!("IMG_{i:05}.jpg")),
                captured_at: start + Duration::days(day as i64),
                width,
                height,
                source: TimestampSource::Exif,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("order");
    for count in [365, 1_825, 10_000] {
        let records = dataset(count, 0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &records, |b, r| {
            b.iter(|| order(black_box(r.clone())));
        });
    }
    group.finish();
}

fn bench_select_size(c: &mut Criterion) {
    let records = dataset(1_825, 0);
    c.bench_function("select_size/1825", |b| {
        b.iter(|| select_size(black_box(&records)));
    });
}

fn bench_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("duplicate_clusters");
    for collide_every in [0, 10, 2] {
        let records = dataset(1_825, collide_every);
        group.bench_with_input(
            BenchmarkId::new("every", collide_every),
            &records,
            |b, r| b.iter(|| find_duplicate_clusters(black_box(r))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_order, bench_select_size, bench_duplicates);
criterion_main!(benches);
