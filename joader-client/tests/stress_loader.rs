//! Stress tests for the record pipeline
//!
//! Run with: cargo test --release --test stress_loader -- --nocapture

mod common;

use std::time::{Duration, Instant};

use common::MockServer;
use joader_client::{LoaderClient, LoaderConfig, LoaderError};
use tokio::runtime::Handle;

/// Configuration for stress tests
struct StressConfig {
    num_records: u64,
    nums: u32,
    max_per_next: usize,
    queue_capacity: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            num_records: 20_000,
            nums: 1,
            max_per_next: 64,
            queue_capacity: 512,
        }
    }
}

fn loader_config(stress: &StressConfig) -> LoaderConfig {
    LoaderConfig::new("stress", "stress_loader", "127.0.0.1:4321")
        .with_nums(stress.nums)
        .with_queue_capacity(stress.queue_capacity)
        .with_poll_interval(Duration::from_millis(1))
}

/// Throughput of a single consumer draining the whole dataset
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stress_single_consumer_throughput() {
    let stress = StressConfig::default();
    let server = MockServer::new(stress.num_records, stress.nums);
    server.configure(|b| b.max_per_next = stress.max_per_next);

    let mut loader =
        LoaderClient::create_with(&Handle::current(), server.connector(), loader_config(&stress))
            .await
            .unwrap();

    let start = Instant::now();
    let mut records = 0u64;
    let mut bytes = 0usize;
    loop {
        match loader.next_ref().await {
            Ok(payload) => bytes += payload.len(),
            Err(LoaderError::EndOfStream) => break,
            Err(e) => panic!("read failed: {e}"),
        }
        loader.mark_consumed().unwrap();
        records += 1;
    }
    let elapsed = start.elapsed();

    println!("Single consumer throughput:");
    println!("  Records: {}", records);
    println!("  Bytes: {}", bytes);
    println!("  Elapsed: {:?}", elapsed);
    println!(
        "  Throughput: {:.0} records/s",
        records as f64 / elapsed.as_secs_f64()
    );

    assert_eq!(records, stress.num_records);
    assert!(loader.metrics().next_rpcs.get() >= stress.num_records / stress.max_per_next as u64);
    loader.delete().await.into_result().unwrap();
}

/// Several hosts draining their partitions concurrently
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_concurrent_hosts() {
    let stress = StressConfig {
        nums: 4,
        queue_capacity: 16,
        ..Default::default()
    };
    let server = MockServer::new(stress.num_records, stress.nums);
    server.configure(|b| b.max_per_next = stress.max_per_next);

    let mut loaders = Vec::new();
    for _ in 0..stress.nums {
        loaders.push(
            LoaderClient::create_with(
                &Handle::current(),
                server.connector(),
                loader_config(&stress),
            )
            .await
            .unwrap(),
        );
    }

    let start = Instant::now();
    let tasks: Vec<_> = loaders
        .into_iter()
        .map(|mut loader| {
            tokio::spawn(async move {
                let mut count = 0u64;
                while loader.next_dummy().await.is_ok() {
                    loader.mark_consumed().unwrap();
                    count += 1;
                }
                loader.delete().await.into_result().unwrap();
                count
            })
        })
        .collect();

    let mut total = 0;
    for task in tasks {
        total += task.await.unwrap();
    }
    let elapsed = start.elapsed();

    println!("Concurrent hosts:");
    println!("  Hosts: {}", stress.nums);
    println!("  Records: {}", total);
    println!("  Elapsed: {:?}", elapsed);

    assert_eq!(total, stress.num_records);
}
