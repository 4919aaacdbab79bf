// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod pending;
pub mod reports;
pub mod submit;
pub mod sync;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::{resolve_data_dir, Config};
use crate::error::{Error, Result};
use crate::service::ReportService;
use crate::session::{Credential, Session};
use crate::sync::{
    ConnectivityMonitor, FileStore, HttpProbe, NetworkProbe, QueueStore, SyncEvent,
};

/// Everything a command needs, resolved once from global flags.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub session: Arc<Session>,
}

impl Context {
    /// Resolve the data directory, load its config and seed the session.
    pub fn load(data_dir: Option<PathBuf>, credential: Option<String>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config = Config::load(&data_dir)?;
        let session = match credential.filter(|c| !c.trim().is_empty()) {
            Some(value) => Session::with_credential(Credential::new(value)),
            None => Session::new(),
        };
        Ok(Context {
            data_dir,
            config,
            session: Arc::new(session),
        })
    }

    pub fn api(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.config, Arc::clone(&self.session))?)
    }

    pub fn queue(&self) -> Result<QueueStore> {
        Ok(QueueStore::new(FileStore::open(&self.data_dir)?))
    }

    pub fn probe(&self) -> Result<HttpProbe> {
        HttpProbe::new(&self.config.api_url, self.config.connect_timeout()).map_err(Error::Config)
    }

    /// Build the report service over the on-disk queue.
    pub fn service(&self) -> Result<ReportService<ApiClient>> {
        Ok(ReportService::new(
            Arc::new(self.queue()?),
            Arc::new(self.api()?),
            Arc::new(ConnectivityMonitor::new()),
            Arc::clone(&self.session),
        ))
    }

    pub fn require_login(&self) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotLoggedIn)
        }
    }
}

/// Take one connectivity reading and feed it to the service's monitor.
pub async fn probe_once(ctx: &Context, service: &ReportService<ApiClient>) -> Result<bool> {
    let snapshot = ctx.probe()?.probe().await;
    service.monitor().observe(snapshot);
    tracing::debug!("connectivity: {:?}", snapshot);
    Ok(snapshot.is_connected())
}

/// Print a notice for events a one-shot command cares about.
pub fn report_event(event: &SyncEvent) {
    if let SyncEvent::ForceLogout = event {
        eprintln!("warning: session expired; log in again with 'aqs login'");
    }
}
