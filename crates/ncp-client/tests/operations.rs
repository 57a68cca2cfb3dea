use std::time::Duration;

use ncp_client::{ClientError, Operations};
use ncp_core::progress::{OperationKind, OperationStatus};

const FOREVER: Duration = Duration::from_secs(3_600);

async fn never_returns() -> Result<(), ClientError> {
    tokio::time::sleep(FOREVER).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn pending_progress_follows_elapsed_time_and_caps() {
    let ops = Operations::new();
    let pending = ops.start(OperationKind::NcpGeneration, never_returns());
    let id = pending.id();

    let snap = ops.snapshot(id).unwrap();
    assert_eq!(snap.percent, 0);
    assert_eq!(snap.status, OperationStatus::Pending);

    tokio::time::advance(Duration::from_secs(60)).await;
    let snap = ops.snapshot(id).unwrap();
    assert_eq!(snap.percent, 50);
    assert_eq!(snap.elapsed_display(), "1:00");

    tokio::time::advance(Duration::from_secs(600)).await;
    assert_eq!(ops.snapshot(id).unwrap().percent, 90);
    assert_eq!(ops.active_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_and_removes_from_active_set() {
    let ops = Operations::new();
    let pending = ops.start(OperationKind::ExplanationGeneration, never_returns());
    let id = pending.id();

    assert!(ops.cancel(id));
    assert!(ops.snapshot(id).is_none());
    assert!(ops.is_empty());

    let err = pending.wait().await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
    assert!(!ops.cancel(id));
}

#[tokio::test]
async fn finished_operation_reads_complete() {
    let ops = Operations::new();
    let pending = ops.start(OperationKind::NcpGeneration, async { Ok::<_, ClientError>(42) });
    let id = pending.id();

    assert_eq!(pending.wait().await.unwrap(), 42);

    let snap = ops.snapshot(id).unwrap();
    assert_eq!(snap.status, OperationStatus::Completed);
    assert_eq!(snap.percent, 100);
    assert_eq!(ops.active_count(), 0);

    ops.remove(id);
    assert!(ops.is_empty());
}

#[tokio::test]
async fn failed_operation_keeps_its_error() {
    let ops = Operations::new();
    let pending = ops.start(OperationKind::NcpGeneration, async { Err::<(), _>(ClientError::Timeout) });
    let id = pending.id();

    let err = pending.wait().await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout));
    assert_eq!(ops.snapshot(id).unwrap().status, OperationStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn ticker_reports_once_per_second() {
    let ops = Operations::new();
    let _pending = ops.start(OperationKind::NcpGeneration, never_returns());
    let mut ticker = ops.ticker();

    let first = ticker.tick().await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].elapsed_secs, 0);

    let second = ticker.tick().await;
    assert_eq!(second[0].elapsed_secs, 1);

    let third = ticker.tick().await;
    assert_eq!(third[0].elapsed_secs, 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_clears_everything() {
    let ops = Operations::new();
    let a = ops.start(OperationKind::NcpGeneration, never_returns());
    let b = ops.start(OperationKind::ExplanationGeneration, never_returns());
    assert_eq!(ops.snapshots().len(), 2);

    ops.cancel_all();

    assert!(ops.is_empty());
    assert!(matches!(a.wait().await, Err(ClientError::Cancelled)));
    assert!(matches!(b.wait().await, Err(ClientError::Cancelled)));
}
