//! # Retrieval Benchmarks
//!
//! Compares the hit path of both strategies. Misses are dominated by the
//! simulated latency and are not interesting to measure here.
//!
//! * **eager_hit**: spawns a task and awaits a shared handle for a known value.
//! * **lean_hit**: builds a ready single-use handle and takes it synchronously.
//! * **lean_hit_observe**: same as `lean_hit`, but awaited through `observe`.
//!
//! ```bash
//! cargo bench --bench retrieval_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fetchpath::{RetrievalConfig, RetrievalService, ResultStore};
use futures::executor::block_on;
use std::sync::Arc;
use std::time::Duration;

const MEASUREMENT_TIME_MS: u64 = 2000;
const WARMUP_TIME_MS: u64 = 500;

fn hit_path_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("failed to build tokio runtime");
    let service = RetrievalService::with_config(
        Arc::new(ResultStore::seeded()),
        RetrievalConfig::default(),
    );

    let mut group = c.benchmark_group("hit_path");
    group.measurement_time(Duration::from_millis(MEASUREMENT_TIME_MS));
    group.warm_up_time(Duration::from_millis(WARMUP_TIME_MS));

    group.bench_function("eager_hit", |b| {
        b.iter(|| runtime.block_on(service.fetch_eager(black_box("ready"))))
    });

    group.bench_function("lean_hit", |b| {
        b.iter(|| service.fetch_lean(black_box("ready")).try_take())
    });

    group.bench_function("lean_hit_observe", |b| {
        b.iter(|| {
            let handle = service.fetch_lean(black_box("ready"));
            block_on(handle.observe())
        })
    });

    group.finish();
}

criterion_group!(benches, hit_path_benchmark);
criterion_main!(benches);
