// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync coordinator.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use super::*;
use crate::sync::store::FileStore;
use crate::sync::test_helpers::{make_report, FlakyStore, ScriptedSubmitter};
use tempfile::tempdir;
use tokio::sync::broadcast::error::TryRecvError;

struct Harness {
    store: Arc<FlakyStore>,
    queue: Arc<QueueStore>,
    submitter: Arc<ScriptedSubmitter>,
    coordinator: SyncCoordinator<ScriptedSubmitter>,
}

fn harness(items: &[&str]) -> Harness {
    let store = FlakyStore::new();
    let queue = Arc::new(QueueStore::new(Arc::clone(&store)));
    for name in items {
        queue.enqueue(make_report(name)).unwrap();
    }
    let submitter = ScriptedSubmitter::new();
    let coordinator = SyncCoordinator::new(Arc::clone(&queue), Arc::clone(&submitter));
    Harness {
        store,
        queue,
        submitter,
        coordinator,
    }
}

fn drain_events(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => events.push(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
}

#[tokio::test]
async fn test_empty_queue_is_a_noop() {
    let h = harness(&[]);
    let mut rx = h.coordinator.subscribe();

    let summary = h.coordinator.drain_queue().await.unwrap();

    assert!(summary.is_noop());
    assert_eq!(summary, DrainSummary::default());
    assert_eq!(h.store.writes(), 0);
    assert!(h.submitter.calls().is_empty());
    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test]
async fn test_all_accepted_empties_queue() {
    let h = harness(&["A", "B", "C"]);

    let summary = h.coordinator.drain_queue().await.unwrap();

    assert_eq!(
        summary,
        DrainSummary {
            attempted: 3,
            succeeded: 3,
            failed: 0,
            auth_expired: false
        }
    );
    assert_eq!(h.submitter.calls(), ["A", "B", "C"]);
    assert!(h.queue.is_empty());
    assert_eq!(h.store.raw(crate::sync::queue::QUEUE_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_mixed_outcome_keeps_only_failures() {
    let h = harness(&["A", "B", "C"]);
    h.submitter.fail("B");
    let mut rx = h.coordinator.subscribe();

    let summary = h.coordinator.drain_queue().await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.auth_expired);
    assert_eq!(h.store.persisted(), ["B"]);
    assert_eq!(
        drain_events(&mut rx),
        [SyncEvent::DrainFinished(summary)]
    );
}

#[tokio::test]
async fn test_failures_preserve_relative_order() {
    let h = harness(&["A", "B", "C", "D", "E"]);
    h.submitter.fail("B");
    h.submitter.fail("D");
    h.submitter.fail("E");

    h.coordinator.drain_queue().await.unwrap();

    assert_eq!(h.store.persisted(), ["B", "D", "E"]);
}

#[tokio::test]
async fn test_auth_expiry_stops_pass_and_keeps_everything() {
    let h = harness(&["A", "B", "C"]);
    h.submitter.expire("A");
    let mut rx = h.coordinator.subscribe();

    let summary = h.coordinator.drain_queue().await.unwrap();

    assert!(summary.auth_expired);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(h.submitter.calls(), ["A"]);
    assert_eq!(h.store.persisted(), ["A", "B", "C"]);

    let events = drain_events(&mut rx);
    let logouts = events
        .iter()
        .filter(|e| **e == SyncEvent::ForceLogout)
        .count();
    assert_eq!(logouts, 1);
}

#[tokio::test]
async fn test_auth_expiry_mid_pass_keeps_sent_items_removed() {
    let h = harness(&["A", "B", "C"]);
    h.submitter.expire("B");

    let summary = h.coordinator.drain_queue().await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(h.submitter.calls(), ["A", "B"]);
    assert_eq!(h.store.persisted(), ["B", "C"]);
}

#[tokio::test]
async fn test_item_is_retried_on_next_pass() {
    let h = harness(&["A"]);
    h.submitter.fail("A");

    let first = h.coordinator.drain_queue().await.unwrap();
    assert_eq!(first.failed, 1);
    assert_eq!(h.store.persisted(), ["A"]);

    let second = h.coordinator.drain_queue().await.unwrap();
    assert_eq!(second.succeeded, 1);
    assert!(h.queue.is_empty());
}

#[tokio::test]
async fn test_checkpoints_after_each_accepted_report() {
    let h = harness(&["A", "B", "C"]);
    h.submitter.fail("B");

    // Record what is on "disk" at the moment each submission starts
    let seen = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::clone(&h.store);
    let seen_hook = Arc::clone(&seen);
    h.submitter.on_submit(move |_| {
        seen_hook.lock().unwrap().push(store.persisted());
    });

    h.coordinator.drain_queue().await.unwrap();

    // A crash during any submission would have left pre-drain minus sent
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0], ["A", "B", "C"]);
    assert_eq!(seen[1], ["B", "C"]);
    assert_eq!(seen[2], ["B", "C"]);
    assert_eq!(h.store.persisted(), ["B"]);
}

#[tokio::test]
async fn test_reports_enqueued_during_drain_survive() {
    let h = harness(&["A", "B"]);
    h.submitter.fail("A");

    let queue = Arc::clone(&h.queue);
    h.submitter.on_submit(move |report| {
        if report.description() == "B" {
            queue.enqueue(make_report("late")).unwrap();
        }
    });

    h.coordinator.drain_queue().await.unwrap();

    assert_eq!(h.store.persisted(), ["A", "late"]);
}

#[tokio::test]
async fn test_concurrent_drain_requests_run_one_pass() {
    let h = harness(&["A", "B"]);

    let (first, second) = tokio::join!(h.coordinator.drain_queue(), h.coordinator.drain_queue());

    let ran: Vec<_> = [first, second].into_iter().flatten().collect();
    assert_eq!(ran.len(), 1);
    assert_eq!(ran[0].attempted, 2);
    assert_eq!(h.submitter.calls(), ["A", "B"]);
}

#[tokio::test]
async fn test_drains_over_a_shared_directory_run_one_pass() {
    let dir = tempdir().unwrap();
    let open = || Arc::new(QueueStore::new(FileStore::open(dir.path()).unwrap()));
    let queue = open();
    queue.enqueue(make_report("A")).unwrap();

    let submitter = ScriptedSubmitter::new();
    let first = SyncCoordinator::new(Arc::clone(&queue), Arc::clone(&submitter));
    let second = SyncCoordinator::new(open(), Arc::clone(&submitter));

    let (a, b) = tokio::join!(first.drain_queue(), second.drain_queue());

    assert_eq!([a, b].into_iter().flatten().count(), 1);
    assert_eq!(submitter.calls(), ["A"]);
    assert!(open().is_empty());
}

#[tokio::test]
async fn test_drain_lock_is_released_after_pass() {
    let dir = tempdir().unwrap();
    let queue = Arc::new(QueueStore::new(FileStore::open(dir.path()).unwrap()));
    let submitter = ScriptedSubmitter::new();
    let coordinator = SyncCoordinator::new(Arc::clone(&queue), Arc::clone(&submitter));

    queue.enqueue(make_report("A")).unwrap();
    coordinator.drain_queue().await.unwrap();
    queue.enqueue(make_report("B")).unwrap();
    coordinator.drain_queue().await.unwrap();

    assert_eq!(submitter.calls(), ["A", "B"]);
    assert!(queue.try_lock_drain().unwrap().is_some());
}

#[tokio::test]
async fn test_storage_failure_during_drain_is_retried_later() {
    let h = harness(&["A", "B"]);
    h.store.set_fail_writes(true);

    let summary = h.coordinator.drain_queue().await.unwrap();
    assert_eq!(summary.succeeded, 2);

    // Disk still holds the old queue, memory knows both were sent
    assert_eq!(h.store.persisted(), ["A", "B"]);
    assert!(h.queue.is_empty());

    h.store.set_fail_writes(false);
    h.queue.enqueue(make_report("C")).unwrap();
    assert_eq!(h.store.persisted(), ["C"]);
}

#[tokio::test]
async fn test_is_draining_reflects_pass() {
    let h = harness(&[]);
    assert!(!h.coordinator.is_draining());
    h.coordinator.drain_queue().await;
    assert!(!h.coordinator.is_draining());
}
