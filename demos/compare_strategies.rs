//! Walks through both retrieval strategies and the double-observation fault
//!
//! Run with `RUST_LOG=fetchpath=debug` to see store lookups as they happen.

use fetchpath::allocation::CountingAllocator;
use fetchpath::{api, init_global_store, Result, ResultStore, RetrievalService, Strategy};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    init_global_store(ResultStore::seeded())?;
    let service = RetrievalService::new();

    for category in ["ready", "fresh"] {
        let eager = service.fetch_eager(category).await?;
        println!(
            "eager {:>5}: {:?} in {} ms, {} MB",
            category,
            eager.items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            eager.elapsed_ms,
            eager.simulated_memory_mb
        );

        let lean = service.fetch_lean(category).observe().await?;
        println!(
            "lean  {:>5}: {:?} in {} ms, {} MB",
            category,
            lean.items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            lean.elapsed_ms,
            lean.simulated_memory_mb
        );
    }

    let handle = service.fetch_misusable();
    println!("first observation: {:?}", handle.observe().await?);
    match handle.observe().await {
        Ok(items) => println!("second observation unexpectedly succeeded: {:?}", items),
        Err(e) => println!("second observation failed: {}", e),
    }

    for path in ["/eager/benchmark/ready", "/lean/benchmark/ready", "/lean/broken"] {
        let response = api::handle(&service, path).await;
        println!("{} -> {} {}", path, response.status, response.body);
    }

    for strategy in [Strategy::Eager, Strategy::Lean] {
        let metrics = service.metrics(strategy);
        println!(
            "{}: {} fetches, hit rate {:.2}, mean {:?}, {} bytes allocated",
            strategy.as_str(),
            metrics.fetches(),
            metrics.hit_rate(),
            metrics.average_elapsed(),
            metrics.allocated_bytes()
        );
    }

    Ok(())
}
