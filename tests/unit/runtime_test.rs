//! Tests for the tokio spawner and worker set

use std::time::Duration;

use keyed_work_queue::core::{Context, KeyedQueue};
use keyed_work_queue::runtime::{TokioSpawner, WorkerSet};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_worker_set_shutdown_joins_idle_workers() {
    let queue = KeyedQueue::<u32>::new(8);
    let root = Context::new();
    let workers = WorkerSet::start(&queue, 3, &root, &TokioSpawner::current());
    assert_eq!(workers.len(), 3);
    assert!(!workers.is_empty());

    let joined = workers.shutdown(Duration::from_secs(2)).await;
    assert_eq!(joined, 3);
    assert!(workers.context().err().is_some());
    // The caller's scope is untouched.
    assert!(root.err().is_none());
}

#[tokio::test]
async fn test_worker_set_stops_when_parent_cancelled() {
    let queue = KeyedQueue::<u32>::new(8);
    let root = Context::new();
    let workers = WorkerSet::start(&queue, 2, &root, &TokioSpawner::current());

    root.cancel();
    assert!(workers.context().err().is_some());
    assert_eq!(workers.shutdown(Duration::from_secs(2)).await, 2);
}

#[tokio::test]
async fn test_shutdown_lets_running_unit_finish() {
    let queue = KeyedQueue::<u32>::new(8);
    let root = Context::new();
    let workers = WorkerSet::start(&queue, 1, &root, &TokioSpawner::current());

    let (started_tx, started_rx) = tokio::sync::oneshot::channel();
    queue
        .put(&root, 1, move |_| async move {
            let _ = started_tx.send(());
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await
        .unwrap();
    started_rx.await.unwrap();

    assert_eq!(workers.shutdown(Duration::from_secs(2)).await, 1);
    let stats = queue.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.active, 0);

    let snapshot = queue.snapshot(&root).await.unwrap();
    assert_eq!(snapshot.locked_keys, 0);
}

#[tokio::test]
async fn test_shutdown_aborts_stuck_worker() {
    let queue = KeyedQueue::<u32>::new(8);
    let root = Context::new();
    let workers = WorkerSet::start(&queue, 1, &root, &TokioSpawner::current());

    let (started_tx, started_rx) = tokio::sync::oneshot::channel();
    queue
        .put(&root, 1, move |_| async move {
            let _ = started_tx.send(());
            std::future::pending::<()>().await;
        })
        .await
        .unwrap();
    started_rx.await.unwrap();

    assert_eq!(workers.shutdown(Duration::from_millis(50)).await, 0);

    // The aborted loop's key is handed back in the background.
    let snapshot = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = queue.snapshot(&root).await.unwrap();
            if snapshot.locked_keys == 0 {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("aborted worker should release its key");
    assert_eq!(snapshot.empty_keys, 1);
    assert_eq!(queue.stats().active, 0);
}
