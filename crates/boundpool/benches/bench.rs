use boundpool::Pool;
use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use crossbeam_utils::sync::WaitGroup;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::scope,
    time::Instant,
};

// Number of jobs pushed through the pool per benchmark iteration.
const TOTAL_JOBS: usize = 16_384;

/// Submits `TOTAL_JOBS` trivial jobs from one producer and waits for all of
/// them, keeping the pool alive across iterations.
fn bench_submit_drain(c: &mut Criterion, group_name: &str, queue_capacity: usize) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_JOBS as u64));

    for max_workers in [1, 2, 4, 8] {
        let pool = Pool::new(max_workers, queue_capacity).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        group.bench_function(
            format!("jobs/{TOTAL_JOBS}/workers/{max_workers}"),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();
                    for _ in 0..iters {
                        let wg = WaitGroup::new();
                        for _ in 0..TOTAL_JOBS {
                            let counter = counter.clone();
                            let wg = wg.clone();
                            pool.submit(move || {
                                black_box(counter.fetch_add(1, Ordering::Relaxed));
                                drop(wg);
                            })
                            .unwrap();
                        }
                        wg.wait();
                    }
                    start.elapsed()
                });
            },
        );

        pool.release();
    }

    group.finish();
}

/// Same workload split across several producers contending on one queue.
fn bench_contended_producers(c: &mut Criterion) {
    let mut group = c.benchmark_group("producers/contended");
    group.throughput(Throughput::Elements(TOTAL_JOBS as u64));

    for producers in [2, 4, 8] {
        let pool = Pool::new(4, 1_024).unwrap();
        let per_producer = TOTAL_JOBS / producers;

        group.bench_function(format!("jobs/{TOTAL_JOBS}/producers/{producers}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let wg = WaitGroup::new();
                    scope(|s| {
                        for _ in 0..producers {
                            let wg = wg.clone();
                            let pool = &pool;
                            s.spawn(move || {
                                for _ in 0..per_producer {
                                    let wg = wg.clone();
                                    pool.submit(move || drop(black_box(wg))).unwrap();
                                }
                            });
                        }
                    });
                    wg.wait();
                }
                start.elapsed()
            });
        });

        pool.release();
    }

    group.finish();
}

fn benchmark_buffered(c: &mut Criterion) {
    bench_submit_drain(c, "queue/buffered", 1_024);
}

fn benchmark_rendezvous(c: &mut Criterion) {
    bench_submit_drain(c, "queue/rendezvous", 0);
}

criterion_group!(
    benches,
    benchmark_buffered,
    benchmark_rendezvous,
    bench_contended_producers
);
criterion_main!(benches);
