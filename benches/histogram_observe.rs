use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use registro::metrics::histogram::{BucketBoundaries, Histogram};
use registro::metrics::summary::{Summary, SummaryConfig};

const NUM_THREADS: usize = 8;
const ITERATIONS_PER_THREAD: usize = 100_000;

fn bench_concurrent_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_observe");

    group.bench_function(
        BenchmarkId::new(
            "Histogram",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            b.iter(|| {
                let histogram = Arc::new(Histogram::new(BucketBoundaries::default()).unwrap());
                let mut handles = vec![];

                for t in 0..NUM_THREADS {
                    let histogram_clone = Arc::clone(&histogram);
                    let handle = thread::spawn(move || {
                        for i in 0..ITERATIONS_PER_THREAD {
                            histogram_clone.observe(((i + t) % 1000) as f64 / 100.0);
                        }
                    });
                    handles.push(handle);
                }

                for handle in handles {
                    handle.join().unwrap();
                }

                black_box(histogram.collect())
            })
        },
    );

    group.bench_function(
        BenchmarkId::new(
            "Summary",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            b.iter(|| {
                let summary = Arc::new(Summary::new(SummaryConfig::default()).unwrap());
                let mut handles = vec![];

                for t in 0..NUM_THREADS {
                    let summary_clone = Arc::clone(&summary);
                    let handle = thread::spawn(move || {
                        for i in 0..ITERATIONS_PER_THREAD {
                            summary_clone.observe(((i + t) % 1000) as f64 / 100.0);
                        }
                    });
                    handles.push(handle);
                }

                for handle in handles {
                    handle.join().unwrap();
                }

                black_box(summary.collect())
            })
        },
    );

    group.finish();
}

fn bench_bucket_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_lookup");

    for count in [10, 100, 1000] {
        let histogram = Histogram::new(BucketBoundaries::linear(0.0, 1.0, count)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut value = 0.0;
            b.iter(|| {
                value = (value + 0.37) % count as f64;
                histogram.observe(black_box(value));
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_concurrent_observe, bench_bucket_lookup);
criterion_main!(benches);
