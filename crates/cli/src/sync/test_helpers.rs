// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aq_core::{Coordinates, PendingReport, ReportDraft};

use super::store::{KeyValueStore, MemoryStore, StorageError, StorageResult};
use super::transport::{RejectReason, SubmitFuture, SubmitOutcome, Submitter};

/// Create a test report whose description is `name`.
pub fn make_report(name: &str) -> PendingReport {
    ReportDraft::new(name)
        .with_coordinates(Coordinates::new(13.05, 80.28).unwrap())
        .validate()
        .unwrap()
}

/// Descriptions of `queue`, in order.
pub fn names(queue: &[PendingReport]) -> Vec<String> {
    queue.iter().map(|r| r.description().to_string()).collect()
}

/// Memory store that counts writes and can be told to fail them.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored value, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).unwrap()
    }

    /// Persisted queue descriptions, bypassing failure injection.
    pub fn persisted(&self) -> Vec<String> {
        match self.raw(super::queue::QUEUE_KEY) {
            Some(raw) => {
                let queue: Vec<PendingReport> = serde_json::from_str(&raw).unwrap();
                names(&queue)
            }
            None => Vec::new(),
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("injected read failure")));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("no space left on device")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn update(
        &self,
        key: &str,
        edit: &mut dyn FnMut(Option<String>) -> StorageResult<String>,
    ) -> StorageResult<()> {
        let value = edit(self.get(key)?)?;
        self.set(key, &value)
    }
}

/// Submitter that answers from a per-description script.
///
/// Reports without a scripted answer are accepted. Every call is recorded,
/// and each submission yields once so concurrent callers can interleave.
#[derive(Default)]
pub struct ScriptedSubmitter {
    script: Mutex<HashMap<String, VecDeque<SubmitOutcome>>>,
    calls: Mutex<Vec<String>>,
    /// Optional hook run on every call, after recording it.
    on_submit: Mutex<Option<Box<dyn Fn(&PendingReport) + Send>>>,
}

impl ScriptedSubmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the next answer for reports described as `name`.
    pub fn respond(&self, name: &str, outcome: SubmitOutcome) {
        self.script
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn fail(&self, name: &str) {
        self.respond(name, SubmitOutcome::TransientFailure("HTTP 500".into()));
    }

    pub fn expire(&self, name: &str) {
        self.respond(name, SubmitOutcome::Rejected(RejectReason::AuthExpired));
    }

    pub fn on_submit(&self, hook: impl Fn(&PendingReport) + Send + 'static) {
        *self.on_submit.lock().unwrap() = Some(Box::new(hook));
    }

    /// Descriptions submitted so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Submitter for ScriptedSubmitter {
    fn submit<'a>(&'a self, report: &'a PendingReport) -> SubmitFuture<'a> {
        Box::pin(async move {
            tokio::task::yield_now().await;

            let name = report.description().to_string();
            self.calls.lock().unwrap().push(name.clone());
            if let Some(hook) = self.on_submit.lock().unwrap().as_ref() {
                hook(report);
            }

            self.script
                .lock()
                .unwrap()
                .get_mut(&name)
                .and_then(|answers| answers.pop_front())
                .unwrap_or(SubmitOutcome::Accepted(None))
        })
    }
}
