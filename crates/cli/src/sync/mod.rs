// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first delivery of hazard reports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  Online   ┌──────────────┐ submit ┌─────────────┐
//! │ Connectivity │──────────►│    Sync      │───────►│  Submitter  │──► remote
//! │   Monitor    │           │ Coordinator  │◄───────│   (trait)   │
//! └──────────────┘           └──────────────┘ outcome└─────────────┘
//!                                   │ load / write back
//!                                   ▼
//!                            ┌──────────────┐       ┌──────────────┐
//!                            │  QueueStore  │──────►│ KeyValueStore│
//!                            └──────────────┘       └──────────────┘
//! ```
//!
//! # Features
//!
//! - Queue persisted as one JSON blob, replaced atomically
//! - Edge-triggered reconnect events (offline→online only)
//! - Strictly sequential drain with per-item checkpointing
//! - One drain at a time; concurrent requests are ignored
//! - Injectable submitter and store for testing

mod connectivity;
mod coordinator;
mod queue;
mod store;
mod transport;

pub use connectivity::{
    spawn_probe_loop, ConnectivityEvent, ConnectivityMonitor, HttpProbe, NetworkProbe,
    NetworkSnapshot,
};
pub use coordinator::{DrainSummary, SyncCoordinator, SyncEvent};
pub use queue::{Queue, QueueStore, QUEUE_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult, StoreLock};
pub use transport::{RejectReason, SubmitFuture, SubmitOutcome, Submitter};

#[cfg(test)]
pub(crate) mod test_helpers;
