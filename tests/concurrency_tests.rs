//! Scheduling behaviour of the two strategies under concurrent misses
//!
//! All tests run on a single-threaded runtime so that a blocked worker is the
//! only worker.

use fetchpath::{RetrievalConfig, RetrievalService, ResultStore};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const LATENCY: Duration = Duration::from_millis(100);
const CONCURRENT: u32 = 4;

fn service() -> RetrievalService {
    RetrievalService::with_config(
        Arc::new(ResultStore::seeded()),
        RetrievalConfig::default().with_simulated_latency(LATENCY),
    )
}

fn spawn_ticker() -> Arc<AtomicUsize> {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = ticks.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(10)).await;
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });
    ticks
}

#[tokio::test(flavor = "current_thread")]
async fn test_eager_misses_overlap() {
    let service = service();
    let started = Instant::now();

    let outcomes = join_all((0..CONCURRENT).map(|_| service.fetch_eager("miss"))).await;

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(started.elapsed() < LATENCY * 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_lean_misses_serialize() {
    let service = service();
    let started = Instant::now();

    let outcomes = join_all(
        (0..CONCURRENT).map(|_| async { service.fetch_lean("miss").observe().await }),
    )
    .await;

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(started.elapsed() >= LATENCY * CONCURRENT);
}

#[tokio::test(flavor = "current_thread")]
async fn test_lean_miss_starves_other_tasks() {
    let service = service();
    let ticks = spawn_ticker();
    tokio::task::yield_now().await;

    let before = ticks.load(Ordering::Relaxed);
    let _outcome = service.fetch_lean("miss");
    let after = ticks.load(Ordering::Relaxed);

    assert_eq!(before, after);
}

#[tokio::test(flavor = "current_thread")]
async fn test_eager_miss_lets_other_tasks_run() {
    let service = service();
    let ticks = spawn_ticker();
    tokio::task::yield_now().await;

    let before = ticks.load(Ordering::Relaxed);
    service.fetch_eager("miss").await.unwrap();
    let after = ticks.load(Ordering::Relaxed);

    assert!(after - before >= 3, "ticker advanced {} times", after - before);
}
