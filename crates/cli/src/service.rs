// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The report service: the surface a UI layer talks to.
//!
//! It owns the process-scoped pieces (queue, connectivity monitor, session,
//! coordinator) and wires them together:
//! - [`ReportService::enqueue_or_submit`] decides between uploading now and
//!   queueing, and never loses a validated report
//! - [`ReportService::drain_queue`] runs a sync pass on demand
//! - [`ReportService::attach_source`] starts consuming connectivity snapshots
//!   and drains automatically on every offline→online transition
//! - [`ReportService::shutdown`] stops background tasks
//!
//! An expired session clears the credential and publishes
//! [`SyncEvent::ForceLogout`] on the channel returned by
//! [`ReportService::subscribe`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use aq_core::{ReportDraft, SubmittedReport};

use crate::error::Result;
use crate::session::Session;
use crate::sync::{
    spawn_probe_loop, ConnectivityEvent, ConnectivityMonitor, DrainSummary, NetworkProbe,
    NetworkSnapshot, QueueStore, RejectReason, SubmitOutcome, Submitter, SyncCoordinator,
    SyncEvent,
};

/// Why a report went to the offline queue instead of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueReason {
    /// No connectivity at submit time.
    Offline,
    /// The session expired; the report waits for the next login.
    AuthExpired,
    /// The upload failed; it will be retried on the next sync.
    SubmitFailed,
}

/// Immediate result of [`ReportService::enqueue_or_submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// The service accepted the report.
    Submitted(Option<SubmittedReport>),
    /// The report is queued for a later sync.
    Queued {
        reason: QueueReason,
        /// False if the queue could not be written to disk; the report is
        /// held in memory and persisted with the next queue write.
        durable: bool,
    },
}

const SNAPSHOT_CHANNEL_CAPACITY: usize = 8;

/// Offline-first report delivery for one process.
pub struct ReportService<S: Submitter + 'static> {
    store: Arc<QueueStore>,
    submitter: Arc<S>,
    monitor: Arc<ConnectivityMonitor>,
    session: Arc<Session>,
    coordinator: Arc<SyncCoordinator<S>>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl<S: Submitter + 'static> ReportService<S> {
    pub fn new(
        store: Arc<QueueStore>,
        submitter: Arc<S>,
        monitor: Arc<ConnectivityMonitor>,
        session: Arc<Session>,
    ) -> Self {
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&submitter),
        ));
        ReportService {
            store,
            submitter,
            monitor,
            session,
            coordinator,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Subscribe to drain results and forced-logout signals.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.coordinator.subscribe()
    }

    /// Validate a draft, then upload it if online or queue it otherwise.
    ///
    /// Validation failures are returned before any I/O. Once validated, the
    /// report either reaches the server or lands in the queue: a failed or
    /// rejected upload queues it too. After a successful upload any backlog
    /// is drained in the background.
    pub async fn enqueue_or_submit(&self, draft: ReportDraft) -> Result<Disposition> {
        let report = draft.validate()?;

        if !self.monitor.is_connected() {
            tracing::info!("offline, queueing report");
            return self.queue(report, QueueReason::Offline);
        }

        match self.submitter.submit(&report).await {
            SubmitOutcome::Accepted(stored) => {
                tracing::info!("report submitted");
                self.spawn_drain();
                Ok(Disposition::Submitted(stored))
            }
            SubmitOutcome::Rejected(RejectReason::AuthExpired) => {
                self.force_logout();
                self.queue(report, QueueReason::AuthExpired)
            }
            SubmitOutcome::TransientFailure(reason) => {
                tracing::warn!("submit failed, queueing report: {}", reason);
                self.queue(report, QueueReason::SubmitFailed)
            }
        }
    }

    /// Run one drain pass now. `None` if a pass is already running.
    pub async fn drain_queue(&self) -> Option<DrainSummary> {
        drain_and_settle(&self.coordinator, &self.session).await
    }

    /// Number of reports waiting in the queue.
    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// Feed connectivity snapshots from `source` into the monitor, draining
    /// the queue on every offline→online transition.
    pub fn attach_source(&self, source: mpsc::Receiver<NetworkSnapshot>) {
        // Subscribe before the pump starts so the first transition is seen
        let mut events = self.monitor.subscribe();

        let monitor = Arc::clone(&self.monitor);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            monitor.run(source, cancel).await;
        });

        let monitor = Arc::clone(&self.monitor);
        let coordinator = Arc::clone(&self.coordinator);
        let session = Arc::clone(&self.session);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => return,
                    event = events.recv() => event,
                };
                match event {
                    Ok(ConnectivityEvent::Online) => {
                        drain_and_settle(&coordinator, &session).await;
                    }
                    Ok(ConnectivityEvent::Offline) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if monitor.is_connected() {
                            drain_and_settle(&coordinator, &session).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
    }

    /// Poll `probe` every `interval` and feed the readings to the monitor.
    pub fn start_probe<P: NetworkProbe + 'static>(&self, probe: P, interval: Duration) {
        let (tx, rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        self.attach_source(rx);
        let handle = spawn_probe_loop(probe, interval, tx, self.cancel.clone());
        self.tasks.spawn(async move {
            let _ = handle.await;
        });
    }

    /// Stop background tasks and wait for them, including any drain in
    /// progress. Queue state on disk is left as the last checkpoint wrote it.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    fn queue(&self, report: aq_core::PendingReport, reason: QueueReason) -> Result<Disposition> {
        match self.store.enqueue(report) {
            Ok(()) => Ok(Disposition::Queued {
                reason,
                durable: true,
            }),
            // Held in memory by the store; the next queue write persists it
            Err(e) if self.store.has_unsaved_changes() => {
                tracing::warn!("queued report kept in memory only: {}", e);
                Ok(Disposition::Queued {
                    reason,
                    durable: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn force_logout(&self) {
        if self.session.clear() {
            tracing::warn!("session expired, logging out");
        }
        self.coordinator.notify(SyncEvent::ForceLogout);
    }

    fn spawn_drain(&self) {
        let coordinator = Arc::clone(&self.coordinator);
        let session = Arc::clone(&self.session);
        self.tasks.spawn(async move {
            drain_and_settle(&coordinator, &session).await;
        });
    }
}

/// Drain and clear the session if the pass hit an expired credential.
async fn drain_and_settle<S: Submitter>(
    coordinator: &SyncCoordinator<S>,
    session: &Session,
) -> Option<DrainSummary> {
    let summary = coordinator.drain_queue().await?;
    if summary.auth_expired && session.clear() {
        tracing::warn!("session expired during sync, logging out");
    }
    Some(summary)
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
