// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! aqrs - Offline-first hazard report delivery.
//!
//! This crate provides the functionality behind the `aqs` CLI: reports are
//! submitted straight to the reporting service when it is reachable and
//! queued on disk otherwise, then delivered in order once connectivity
//! returns.
//!
//! # Main Components
//!
//! - [`ReportService`] - `enqueue_or_submit`, `drain_queue` and automatic
//!   reconnect draining
//! - [`sync`] - queue store, connectivity monitor, submitter seam and sync
//!   coordinator
//! - [`ApiClient`] - HTTP client for the reporting service
//! - [`Session`] - the shared credential, cleared on forced logout
//!
//! ```rust,ignore
//! use aqrs::sync::{ConnectivityMonitor, FileStore, QueueStore};
//! use aqrs::{ApiClient, Config, ReportService, Session};
//!
//! let session = Arc::new(Session::new());
//! let service = ReportService::new(
//!     Arc::new(QueueStore::new(FileStore::open(&data_dir)?)),
//!     Arc::new(ApiClient::new(&Config::default(), Arc::clone(&session))?),
//!     Arc::new(ConnectivityMonitor::new()),
//!     session,
//! );
//! service.start_probe(probe, Duration::from_secs(10));
//! let disposition = service.enqueue_or_submit(draft).await?;
//! ```

mod cli;
mod commands;
mod display;

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
pub mod sync;

pub use api::{ApiClient, ApiError};
pub use cli::{Cli, Command, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};
pub use service::{Disposition, QueueReason, ReportService};
pub use session::{Credential, Session};

use commands::Context;

/// Execute a CLI invocation. This is the main entry point for the binary and
/// provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.data_dir, cli.session)?;

    match cli.command {
        Command::Submit {
            description,
            lat,
            lon,
            image,
            offline,
        } => commands::submit::run(&ctx, description, lat, lon, image, offline).await,
        Command::Sync => commands::sync::run(&ctx).await,
        Command::Pending { output } => commands::pending::run(&ctx, output),
        Command::Reports { output } => commands::reports::run(&ctx, output).await,
        Command::Login { username, password } => {
            commands::auth::login(&ctx, &username, &password).await
        }
        Command::Register { username, password } => {
            commands::auth::register(&ctx, &username, &password).await
        }
        Command::Logout => commands::auth::logout(&ctx).await,
        Command::Watch => commands::watch::run(&ctx).await,
    }
}
