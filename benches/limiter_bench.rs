//! Benchmarks for the limiter.
//!
//! Benchmarks cover:
//! - Window refill with ready outcomes at several limits
//! - Async tasks yielding once per invocation
//! - Strategy overhead over a raw limiter run

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use prometheus_limiter::core::{Limiter, LimiterOptions, TaskOutcome};
use prometheus_limiter::runtime::TokioSpawner;
use prometheus_limiter::strategies;

use tokio::runtime::Runtime;
use tokio::sync::oneshot;

// ============================================================================
// Helper Functions
// ============================================================================

async fn run_ready(size: usize, limit: Option<usize>) {
    let options = LimiterOptions {
        limit,
        bail_on_error: true,
    };
    let limiter = Limiter::new(
        (0..size).collect::<Vec<_>>(),
        |value: usize, _key| TaskOutcome::<usize, String>::ready(value * 2),
        options,
        TokioSpawner::current(),
    )
    .unwrap();

    let (tx, rx) = oneshot::channel();
    let tx = parking_lot::Mutex::new(Some(tx));
    limiter.on_done(move || {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(());
        }
    });
    limiter.start().unwrap();
    drop(limiter);
    rx.await.unwrap();
}

// ============================================================================
// Limiter Benchmarks
// ============================================================================

fn bench_ready_outcomes(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter_ready_outcomes");

    for limit in [Some(1), Some(8), Some(64), None] {
        let size = 1_000usize;
        group.throughput(Throughput::Elements(size as u64));
        let id = limit.map_or_else(|| "unbounded".to_string(), |l| l.to_string());
        group.bench_with_input(BenchmarkId::from_parameter(id), &limit, |b, &limit| {
            b.to_async(Runtime::new().unwrap())
                .iter(|| async move { run_ready(black_box(size), limit).await });
        });
    }

    group.finish();
}

fn bench_async_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter_async_tasks");

    for size in [100usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let output = strategies::map(
                    (0..size).collect(),
                    |value: usize, _key| async move {
                        tokio::task::yield_now().await;
                        Ok::<_, String>(value)
                    },
                    LimiterOptions::new().with_limit(16),
                )
                .await
                .unwrap();
                black_box(output);
            });
        });
    }

    group.finish();
}

fn bench_any_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter_any");

    group.bench_function("first_success_of_1000", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| async {
            let found = strategies::any(
                (0..1_000usize).collect(),
                |value: usize, _key| async move {
                    if value == 500 {
                        Ok(value)
                    } else {
                        Err("miss".to_string())
                    }
                },
                LimiterOptions::new().with_limit(32),
            )
            .await
            .unwrap();
            black_box(found);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ready_outcomes,
    bench_async_tasks,
    bench_any_short_circuit
);
criterion_main!(benches);
