//! Tests for cancellation scopes and the attacher

use std::time::Duration;

use keyed_work_queue::core::{Context, ContextError, KeyedQueue};

#[tokio::test]
async fn test_with_timeout_ends_with_deadline_exceeded() {
    let ctx = Context::new().with_timeout(Duration::from_millis(20));
    assert!(ctx.err().is_none());
    assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
}

#[tokio::test]
async fn test_parent_cancel_reaches_timeout_child() {
    let root = Context::new();
    let ctx = root.with_timeout(Duration::from_secs(60));
    root.cancel();
    assert_eq!(ctx.done().await, ContextError::Cancelled);
}

#[tokio::test]
async fn test_child_of_background_is_cancellable() {
    let ctx = Context::background().child();
    assert!(ctx.is_cancellable());
    ctx.cancel();
    assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    assert!(Context::background().err().is_none());
}

#[tokio::test]
async fn test_unit_attaches_event_scope() {
    let queue = KeyedQueue::<&'static str>::new(4);
    let root = Context::new();
    let worker_ctx = root.child();
    let worker = {
        let queue = queue.clone();
        let worker_ctx = worker_ctx.clone();
        tokio::spawn(async move { queue.worker(&worker_ctx).await })
    };

    let event_ctx = Context::new();
    let (result_tx, result_rx) = tokio::sync::oneshot::channel();
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    {
        let event_ctx = event_ctx.clone();
        queue
            .put(&root, "#ops", move |attach| async move {
                let (ctx, guard) = attach.attach(&event_ctx);
                let _ = ready_tx.send(());
                let reason = ctx.done().await;
                let worker_alive = attach.worker_context().err().is_none();
                guard.release();
                let _ = result_tx.send((reason, worker_alive));
            })
            .await
            .unwrap();
    }

    ready_rx.await.unwrap();
    event_ctx.cancel();

    let (reason, worker_alive) = tokio::time::timeout(Duration::from_secs(2), result_rx)
        .await
        .expect("unit should observe the event cancel")
        .unwrap();
    assert_eq!(reason, ContextError::Cancelled);
    assert!(worker_alive);

    worker_ctx.cancel();
    assert!(worker.await.unwrap().unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_attach_background_scope_returns_worker_context() {
    let queue = KeyedQueue::<u8>::new(1);
    let root = Context::new();
    let worker_ctx = root.child();
    let worker = {
        let queue = queue.clone();
        let worker_ctx = worker_ctx.clone();
        tokio::spawn(async move { queue.worker(&worker_ctx).await })
    };

    let (tx, rx) = tokio::sync::oneshot::channel();
    queue
        .put(&root, 0, move |attach| async move {
            let (ctx, _guard) = attach.attach(&Context::background());
            let _ = tx.send(ctx);
        })
        .await
        .unwrap();

    let ctx = rx.await.unwrap();
    assert!(ctx.err().is_none());
    worker_ctx.cancel();
    assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    let _ = worker.await;
}

#[tokio::test]
async fn test_attach_to_ended_scope_is_ended_before_yielding() {
    let queue = KeyedQueue::<u8>::new(1);
    let root = Context::new();
    let worker_ctx = root.child();
    let worker = {
        let queue = queue.clone();
        let worker_ctx = worker_ctx.clone();
        tokio::spawn(async move { queue.worker(&worker_ctx).await })
    };

    let event_ctx = Context::new();
    event_ctx.cancel();
    let (tx, rx) = tokio::sync::oneshot::channel();
    queue
        .put(&root, 0, move |attach| async move {
            let (ctx, _guard) = attach.attach(&event_ctx);
            let _ = tx.send(ctx.err());
        })
        .await
        .unwrap();

    assert_eq!(rx.await.unwrap(), Some(ContextError::Cancelled));
    worker_ctx.cancel();
    let _ = worker.await;
}
