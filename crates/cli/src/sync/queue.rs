// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for persisting reports while disconnected.
//!
//! The whole queue is stored as one JSON array under [`QUEUE_KEY`], oldest
//! report first. Every mutation is a read-modify-write through
//! [`KeyValueStore::update`], so processes sharing a data directory never
//! drop each other's reports.
//!
//! If a write fails the queue that should have been written is kept in memory
//! and served by [`QueueStore::load`] until a later write succeeds, so a full
//! disk never resurrects sent reports or forgets new ones within the process.

use std::sync::Mutex;

use aq_core::PendingReport;

use super::store::{KeyValueStore, StorageError, StorageResult, StoreLock};

/// Storage key holding the serialized queue.
pub const QUEUE_KEY: &str = "offlineReports";

/// Store lock held by whichever process is draining the queue.
const DRAIN_LOCK_NAME: &str = "drain";

/// Ordered reports awaiting delivery, oldest first.
pub type Queue = Vec<PendingReport>;

/// Durable queue of pending reports.
pub struct QueueStore {
    store: Box<dyn KeyValueStore>,
    /// Queue of record when the last write failed.
    unsaved: Mutex<Option<Queue>>,
}

impl QueueStore {
    /// Create a queue on top of a key-value store.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        QueueStore {
            store: Box::new(store),
            unsaved: Mutex::new(None),
        }
    }

    /// Read the current queue.
    ///
    /// A missing, unreadable or unparsable blob yields an empty queue; errors
    /// are logged, never returned.
    pub fn load(&self) -> Queue {
        let unsaved = self.unsaved.lock().unwrap_or_else(|e| e.into_inner());
        match self.current(&unsaved) {
            Ok(queue) => queue,
            Err(e) => {
                tracing::warn!("failed to read offline queue: {}", e);
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted queue.
    ///
    /// On failure the queue is retained in memory and written again on the
    /// next mutation.
    pub fn save(&self, queue: Queue) -> StorageResult<()> {
        let mut unsaved = self.unsaved.lock().unwrap_or_else(|e| e.into_inner());
        self.write(&mut unsaved, queue)
    }

    /// Append a report to the end of the queue.
    pub fn enqueue(&self, report: PendingReport) -> StorageResult<()> {
        let mut unsaved = self.unsaved.lock().unwrap_or_else(|e| e.into_inner());
        self.modify(&mut unsaved, |mut queue| {
            queue.push(report);
            queue
        })
    }

    /// Replace the first `len` reports with `head`, keeping any reports that
    /// were appended after them.
    ///
    /// Used by the sync coordinator to write back what remains of the
    /// snapshot it drained without clobbering reports enqueued meanwhile.
    pub fn replace_head(&self, len: usize, head: Queue) -> StorageResult<()> {
        let mut unsaved = self.unsaved.lock().unwrap_or_else(|e| e.into_inner());
        self.modify(&mut unsaved, |mut current| {
            let tail = current.split_off(len.min(current.len()));
            let mut queue = head;
            queue.extend(tail);
            queue
        })
    }

    /// Take the cross-process drain lock, or `None` if another drain holds it.
    pub fn try_lock_drain(&self) -> StorageResult<Option<StoreLock>> {
        self.store.try_lock(DRAIN_LOCK_NAME)
    }

    /// Number of queued reports.
    pub fn len(&self) -> usize {
        self.load().len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the last write failed and the queue exists only in memory.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn current(&self, unsaved: &Option<Queue>) -> StorageResult<Queue> {
        if let Some(queue) = unsaved {
            return Ok(queue.clone());
        }
        Ok(parse(self.store.get(QUEUE_KEY)?))
    }

    /// Apply `edit` to the queue of record and persist the result, holding the
    /// store's write lock from read to write.
    fn modify(
        &self,
        unsaved: &mut Option<Queue>,
        edit: impl FnOnce(Queue) -> Queue,
    ) -> StorageResult<()> {
        let mut edit = Some(edit);
        let mut edited: Option<Queue> = None;
        let held = unsaved.clone();

        let result = self.store.update(QUEUE_KEY, &mut |raw| {
            let base = match &held {
                Some(queue) => queue.clone(),
                None => parse(raw),
            };
            let queue = match edit.take() {
                Some(edit) => edit(base),
                None => base,
            };
            let json = serde_json::to_string(&queue)?;
            edited = Some(queue);
            Ok(json)
        });

        match (result, edited) {
            (Ok(()), _) => {
                *unsaved = None;
                Ok(())
            }
            (Err(e), Some(queue)) => {
                tracing::warn!(
                    "failed to persist offline queue ({} reports held in memory): {}",
                    queue.len(),
                    e
                );
                *unsaved = Some(queue);
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }

    fn write(&self, unsaved: &mut Option<Queue>, queue: Queue) -> StorageResult<()> {
        let result = serde_json::to_string(&queue)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(QUEUE_KEY, &json));

        match result {
            Ok(()) => {
                *unsaved = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "failed to persist offline queue ({} reports held in memory): {}",
                    queue.len(),
                    e
                );
                *unsaved = Some(queue);
                Err(e)
            }
        }
    }
}

/// Decode a stored blob. Missing, blank or unparsable blobs are empty queues.
fn parse(raw: Option<String>) -> Queue {
    let Some(raw) = raw else {
        return Vec::new();
    };
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(&raw) {
        Ok(queue) => queue,
        Err(e) => {
            tracing::warn!("discarding unparsable offline queue: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
