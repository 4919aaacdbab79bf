// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: drains the offline queue against the remote service.
//!
//! A drain pass submits every queued report oldest-first, one at a time.
//! Accepted reports are removed and the queue is checkpointed right away, so
//! a crash mid-pass leaves exactly the pre-drain queue minus what the service
//! confirmed. Failed reports stay in place, in order. An expired session stops
//! the pass and asks the caller to log out.
//!
//! One pass runs at a time per store: a mutex excludes callers in this
//! process and a store lock excludes other processes.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use super::queue::{Queue, QueueStore};
use super::transport::{RejectReason, SubmitOutcome, Submitter};

/// Aggregate counts for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Reports handed to the submitter.
    pub attempted: usize,
    /// Reports the service accepted (and that were removed from the queue).
    pub succeeded: usize,
    /// Reports that stay queued after being attempted.
    pub failed: usize,
    /// The pass stopped early because the session expired.
    pub auth_expired: bool,
}

impl DrainSummary {
    /// True when nothing was queued.
    pub fn is_noop(&self) -> bool {
        self.attempted == 0
    }
}

/// Events emitted for UI subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A drain pass that had work to do has finished.
    DrainFinished(DrainSummary),
    /// The remote service rejected the session; the user must log in again.
    ForceLogout,
}

/// Capacity of the event channel; slow subscribers lag rather than block.
const EVENT_CAPACITY: usize = 16;

/// Drains the queue through a submitter, one pass at a time.
pub struct SyncCoordinator<S: Submitter> {
    store: Arc<QueueStore>,
    submitter: Arc<S>,
    /// Held for the duration of a pass.
    drain_lock: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

impl<S: Submitter> SyncCoordinator<S> {
    pub fn new(store: Arc<QueueStore>, submitter: Arc<S>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SyncCoordinator {
            store,
            submitter,
            drain_lock: Mutex::new(()),
            events,
        }
    }

    /// Subscribe to drain and logout events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Publish an event to subscribers. Having no subscribers is fine.
    pub fn notify(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }

    /// True while a drain pass is running.
    pub fn is_draining(&self) -> bool {
        self.drain_lock.try_lock().is_err()
    }

    /// Run one drain pass.
    ///
    /// Returns `None` without doing anything if another pass is already in
    /// progress, in this process or in another one sharing the store. Partial failure is an ordinary outcome reported through the
    /// summary, never an error.
    pub async fn drain_queue(&self) -> Option<DrainSummary> {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            tracing::debug!("drain already in progress, ignoring request");
            return None;
        };
        let _store_lock = match self.store.try_lock_drain() {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                tracing::debug!("another process is draining the queue, ignoring request");
                return None;
            }
            Err(e) => {
                tracing::warn!("failed to take drain lock: {}", e);
                return None;
            }
        };

        let snapshot = self.store.load();
        if snapshot.is_empty() {
            return Some(DrainSummary::default());
        }

        tracing::info!("draining {} queued report(s)", snapshot.len());

        let mut summary = DrainSummary::default();
        let mut head_len = snapshot.len();
        let mut kept: Queue = Vec::new();
        let mut untried = snapshot.into_iter();

        while let Some(report) = untried.next() {
            summary.attempted += 1;
            tracing::debug!("submitting queued report: {:?}", report.description());

            match self.submitter.submit(&report).await {
                SubmitOutcome::Accepted(_) => {
                    summary.succeeded += 1;
                    let head: Queue = kept.iter().cloned().chain(untried.clone()).collect();
                    head_len = self.write_back(head_len, head);
                }
                SubmitOutcome::Rejected(RejectReason::AuthExpired) => {
                    summary.failed += 1;
                    summary.auth_expired = true;
                    tracing::warn!("session expired during sync, stopping pass");
                    kept.push(report);
                    kept.extend(untried.by_ref());
                    break;
                }
                SubmitOutcome::TransientFailure(reason) => {
                    summary.failed += 1;
                    tracing::warn!("queued report not delivered, will retry: {}", reason);
                    kept.push(report);
                }
            }
        }

        self.write_back(head_len, kept);

        tracing::info!(
            "drain finished: {} attempted, {} succeeded, {} failed",
            summary.attempted,
            summary.succeeded,
            summary.failed
        );

        if summary.auth_expired {
            self.notify(SyncEvent::ForceLogout);
        }
        self.notify(SyncEvent::DrainFinished(summary));

        Some(summary)
    }

    /// Replace the drained head of the persisted queue and return the length
    /// the head now has. A failed write is held in memory by the store; if the
    /// store could not even be read, the old head is still in place.
    fn write_back(&self, head_len: usize, head: Queue) -> usize {
        let new_len = head.len();
        match self.store.replace_head(head_len, head) {
            Ok(()) => new_len,
            Err(e) => {
                tracing::warn!("failed to checkpoint offline queue: {}", e);
                if self.store.has_unsaved_changes() {
                    new_len
                } else {
                    head_len
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
