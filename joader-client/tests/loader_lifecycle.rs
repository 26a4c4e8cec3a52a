//! Loader creation, reset and teardown

mod common;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use common::MockServer;
use joader_client::runtime::{LoaderRuntime, RuntimeConfig};
use joader_client::{LoaderClient, LoaderConfig, LoaderError, ShutdownStatus};
use tokio::runtime::Handle;

fn config() -> LoaderConfig {
    LoaderConfig::new("dummy", "dummy_loader", "127.0.0.1:4321")
        .with_poll_interval(Duration::from_millis(5))
        .with_handshake_timeout(Duration::from_secs(5))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handshake_timeout_is_reported() {
    let server = MockServer::new(10, 1);
    server.configure(|b| b.create_delay = Some(Duration::from_secs(3)));

    let started = Instant::now();
    let result = LoaderClient::create_with(
        &Handle::current(),
        server.connector(),
        config().with_handshake_timeout(Duration::from_millis(200)),
    )
    .await;

    assert!(matches!(result, Err(LoaderError::HandshakeTimeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_failure_propagates() {
    let server = MockServer::new(10, 1);
    server.configure(|b| b.fail_create.push_back(tonic::Code::InvalidArgument));

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        LoaderClient::create_with(&Handle::current(), server.connector(), config()),
    )
    .await
    .expect("create hung on failure");

    match result {
        Err(LoaderError::Rpc { method, code, .. }) => {
            assert_eq!(method, "CreateDataloader");
            assert_eq!(code, tonic::Code::InvalidArgument);
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("create should have failed"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_config_is_rejected_before_spawning() {
    let server = MockServer::new(10, 1);
    let result = LoaderClient::create_with(
        &Handle::current(),
        server.connector(),
        config().with_nums(0),
    )
    .await;
    assert!(matches!(result, Err(LoaderError::InvalidConfig { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_restarts_from_the_first_record() {
    let server = MockServer::new(10, 1);
    server.configure(|b| b.idle_when_empty = true);

    let mut loader = LoaderClient::create_with(&Handle::current(), server.connector(), config())
        .await
        .unwrap();
    for expected in ["0", "1", "2"] {
        assert_eq!(&loader.next().await.unwrap()[..], expected.as_bytes());
        loader.mark_consumed().unwrap();
    }

    loader.reset().await.unwrap();
    assert_eq!(server.reset_calls.load(Ordering::SeqCst), 1);

    assert_eq!(&loader.next().await.unwrap()[..], b"0");
    loader.mark_consumed().unwrap();
    assert_eq!(&loader.next().await.unwrap()[..], b"1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_interrupts_poll_sleep() {
    let server = MockServer::new(3, 1);
    server.configure(|b| b.idle_when_empty = true);

    let loader = LoaderClient::create_with(
        &Handle::current(),
        server.connector(),
        config().with_poll_interval(Duration::from_millis(500)),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    let outcome = loader.delete().await;
    assert!(outcome.response.is_ok());
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(outcome.shutdown, ShutdownStatus::Graceful);
    assert!(outcome.shutdown_error().is_none());
    assert_eq!(server.delete_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_with_full_queue_is_graceful() {
    let server = MockServer::new(50, 1);
    server.configure(|b| b.max_per_next = 1);

    let loader = LoaderClient::create_with(
        &Handle::current(),
        server.connector(),
        config().with_queue_capacity(4),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(loader.metrics().records_fetched.get(), 4);

    let outcome = tokio::time::timeout(Duration::from_secs(2), loader.delete())
        .await
        .expect("delete hung");
    assert!(outcome.is_clean());
    assert_eq!(outcome.shutdown, ShutdownStatus::Graceful);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stuck_worker_is_force_terminated() {
    let server = MockServer::new(10, 1);
    server.configure(|b| b.next_delay = Some(Duration::from_secs(60)));

    let loader = LoaderClient::create_with(
        &Handle::current(),
        server.connector(),
        config().with_shutdown_grace(Duration::from_millis(200)),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    let outcome = loader.delete().await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(
        outcome.shutdown,
        ShutdownStatus::ForceTerminated {
            grace: Duration::from_millis(200)
        }
    );
    assert!(matches!(
        outcome.shutdown_error(),
        Some(LoaderError::ShutdownTimeout { .. })
    ));
    assert!(outcome.response.is_ok());
    assert!(!outcome.is_clean());
    assert!(matches!(
        outcome.into_result(),
        Err(LoaderError::ShutdownTimeout { .. })
    ));
    assert_eq!(server.delete_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forced_stop_and_failed_delete_are_both_reported() {
    let server = MockServer::new(10, 1);
    server.configure(|b| {
        b.next_delay = Some(Duration::from_secs(60));
        b.fail_delete = Some(tonic::Code::Unavailable);
    });

    let loader = LoaderClient::create_with(
        &Handle::current(),
        server.connector(),
        config().with_shutdown_grace(Duration::from_millis(200)),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let outcome = loader.delete().await;
    assert!(matches!(
        outcome.shutdown,
        ShutdownStatus::ForceTerminated { .. }
    ));
    match &outcome.response {
        Err(LoaderError::Rpc { method, code, .. }) => {
            assert_eq!(*method, "DeleteDataloader");
            assert_eq!(*code, tonic::Code::Unavailable);
        }
        other => panic!("expected delete rpc failure, got {other:?}"),
    }
    assert!(outcome.shutdown_error().is_some());
    assert_eq!(server.delete_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn info_reflects_progress() {
    let server = MockServer::new(5, 1);
    let mut loader = LoaderClient::create_with(&Handle::current(), server.connector(), config())
        .await
        .unwrap();
    loader.next().await.unwrap();
    loader.mark_consumed().unwrap();

    let info = loader.info();
    assert_eq!(info.name, "dummy_loader");
    assert_eq!(info.length, 5);
    assert_eq!(info.records_read, 1);
    assert_eq!(info.shm_path, server.shm_path());
}

#[test]
fn blocking_caller_uses_loader_runtime() {
    let runtime = LoaderRuntime::new(RuntimeConfig {
        fetch_threads: 1,
        ..Default::default()
    })
    .unwrap();
    let server = MockServer::new(20, 1);
    let handle = runtime.fetch_handle();

    let mut loader = runtime
        .block_on(LoaderClient::create_with(&handle, server.connector(), config()))
        .unwrap();

    let mut count = 0;
    while let Ok(bytes) = runtime.block_on(loader.next()) {
        assert_eq!(bytes, count.to_string().as_bytes());
        loader.mark_consumed().unwrap();
        count += 1;
    }
    assert_eq!(count, 20);

    runtime.block_on(loader.delete()).into_result().unwrap();
    runtime.shutdown();
}
