//! Benchmarks for the alignment hot path
//!
//! Run with: cargo bench --package motion-coach-compare

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;

use motion_coach_compare::{MultiResolutionDtw, WindowedDtw};
use motion_coach_core::{FeatureMatrix, SequenceAligner, FEATURE_DIM};

/// Feature rows resembling a smoothed exercise recording: slow periodic
/// angle drift plus small per-column offsets.
fn recording(frames: usize, phase: f64) -> FeatureMatrix {
    FeatureMatrix::new(Array2::from_shape_fn((frames, FEATURE_DIM), |(i, j)| {
        let t = i as f64 * 0.05 + phase;
        (t + j as f64 * 0.13).sin() * 0.5 + j as f64 * 0.01
    }))
}

fn bench_exact_dtw(c: &mut Criterion) {
    let mut group = c.benchmark_group("Exact DTW");

    for &frames in &[100, 250, 500] {
        let a = recording(frames, 0.0);
        let b = recording(frames, 0.7);
        group.throughput(Throughput::Elements((frames * frames) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |bench, _| {
            let aligner = WindowedDtw::new(None);
            bench.iter(|| aligner.align(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

fn bench_windowed_dtw(c: &mut Criterion) {
    let mut group = c.benchmark_group("Windowed DTW");

    let frames = 500;
    let a = recording(frames, 0.0);
    let b = recording(frames, 0.7);
    for &window in &[25, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |bench, &w| {
            let aligner = WindowedDtw::new(Some(w));
            bench.iter(|| aligner.align(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

fn bench_approximate_dtw(c: &mut Criterion) {
    let mut group = c.benchmark_group("Approximate DTW");

    for &frames in &[500, 1000, 2000] {
        let a = recording(frames, 0.0);
        let b = recording(frames, 0.7);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |bench, _| {
            let aligner = MultiResolutionDtw::default();
            bench.iter(|| aligner.align(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_exact_dtw,
    bench_windowed_dtw,
    bench_approximate_dtw
);
criterion_main!(benches);
