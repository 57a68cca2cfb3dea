use std::time::Duration;

use ncp_core::progress::{
    estimate_percent, OperationKind, OperationStatus, ProgressSnapshot, PENDING_CAP,
};
use uuid::Uuid;

#[test]
fn zero_elapsed_is_zero_percent() {
    assert_eq!(estimate_percent(Duration::ZERO), 0);
}

#[test]
fn progress_is_linear_over_the_window() {
    assert_eq!(estimate_percent(Duration::from_secs(30)), 25);
    assert_eq!(estimate_percent(Duration::from_secs(60)), 50);
    assert_eq!(estimate_percent(Duration::from_millis(1_200)), 1);
}

#[test]
fn progress_caps_at_ninety_while_pending() {
    assert_eq!(estimate_percent(Duration::from_secs(108)), PENDING_CAP);
    assert_eq!(estimate_percent(Duration::from_secs(120)), PENDING_CAP);
    assert_eq!(estimate_percent(Duration::from_secs(60 * 60)), PENDING_CAP);
}

#[test]
fn only_completion_reaches_one_hundred() {
    let id = Uuid::new_v4();
    let elapsed = Duration::from_secs(300);

    let pending = ProgressSnapshot::new(id, OperationKind::NcpGeneration, OperationStatus::Pending, elapsed);
    assert_eq!(pending.percent, 90);

    let done = ProgressSnapshot::new(id, OperationKind::NcpGeneration, OperationStatus::Completed, Duration::from_secs(5));
    assert_eq!(done.percent, 100);
    assert!(done.status.is_finished());
}

#[test]
fn elapsed_display_is_minutes_and_seconds() {
    let snap = ProgressSnapshot::new(
        Uuid::new_v4(),
        OperationKind::ExplanationGeneration,
        OperationStatus::Pending,
        Duration::from_secs(75),
    );
    assert_eq!(snap.elapsed_display(), "1:15");
}
