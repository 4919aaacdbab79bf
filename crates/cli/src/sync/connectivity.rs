// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity tracking.
//!
//! The monitor folds reachability snapshots into a single connected flag and
//! publishes edge-triggered events: `Online` only on offline→online, `Offline`
//! only on online→offline. It starts disconnected and stays that way until a
//! snapshot says otherwise.
//!
//! Snapshots come from any source feeding an mpsc channel. [`spawn_probe_loop`]
//! is the built-in source, polling a [`NetworkProbe`] on an interval.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One reading from the connectivity source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkSnapshot {
    /// Link-layer reachability (Wi-Fi/cellular up).
    pub reachable: bool,
    /// The upstream service answered.
    pub internet_reachable: bool,
}

impl NetworkSnapshot {
    pub fn online() -> Self {
        NetworkSnapshot {
            reachable: true,
            internet_reachable: true,
        }
    }

    pub fn offline() -> Self {
        NetworkSnapshot::default()
    }

    /// Both signals must hold; a link with no route to the service is offline.
    pub fn is_connected(&self) -> bool {
        self.reachable && self.internet_reachable
    }
}

/// Connectivity transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

const EVENT_CAPACITY: usize = 16;

/// Tracks connected state and broadcasts transitions.
pub struct ConnectivityMonitor {
    /// Lock-free reads for the submit-or-enqueue decision.
    connected: AtomicBool,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Create a monitor in the disconnected state.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        ConnectivityMonitor {
            connected: AtomicBool::new(false),
            events,
        }
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Subscribe to transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Fold a snapshot into the current state.
    ///
    /// Returns the transition it caused, if any, after publishing it.
    pub fn observe(&self, snapshot: NetworkSnapshot) -> Option<ConnectivityEvent> {
        let now = snapshot.is_connected();
        let was = self.connected.swap(now, Ordering::AcqRel);

        let event = match (was, now) {
            (false, true) => ConnectivityEvent::Online,
            (true, false) => ConnectivityEvent::Offline,
            _ => return None,
        };

        tracing::info!("connectivity changed: {:?}", event);
        let _ = self.events.send(event);
        Some(event)
    }

    /// Consume snapshots until the source closes or `cancel` fires.
    pub async fn run(
        &self,
        mut source: mpsc::Receiver<NetworkSnapshot>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                snapshot = source.recv() => match snapshot {
                    Some(snapshot) => {
                        self.observe(snapshot);
                    }
                    None => return,
                },
            }
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces reachability snapshots on demand.
pub trait NetworkProbe: Send + Sync {
    /// Take one reading.
    fn probe(&self) -> Pin<Box<dyn Future<Output = NetworkSnapshot> + Send + '_>>;
}

/// Probe that checks the API host directly.
///
/// `reachable` is a TCP connect to the host; `internet_reachable` is any HTTP
/// response (even an error status) from the session-check endpoint.
pub struct HttpProbe {
    client: reqwest::Client,
    host: String,
    port: u16,
    check_url: String,
    timeout: Duration,
}

impl HttpProbe {
    /// Build a probe for the service at `api_url`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, String> {
        let url = reqwest::Url::parse(api_url).map_err(|e| format!("invalid api_url: {}", e))?;
        let host = url
            .host_str()
            .ok_or_else(|| format!("api_url has no host: {}", api_url))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| format!("api_url has no port: {}", api_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(HttpProbe {
            client,
            host,
            port,
            check_url: format!("{}/api/check_session", api_url.trim_end_matches('/')),
            timeout,
        })
    }
}

impl NetworkProbe for HttpProbe {
    fn probe(&self) -> Pin<Box<dyn Future<Output = NetworkSnapshot> + Send + '_>> {
        Box::pin(async move {
            let connect = TcpStream::connect((self.host.as_str(), self.port));
            let reachable = matches!(tokio::time::timeout(self.timeout, connect).await, Ok(Ok(_)));
            if !reachable {
                return NetworkSnapshot::offline();
            }

            let internet_reachable = self.client.get(&self.check_url).send().await.is_ok();
            NetworkSnapshot {
                reachable,
                internet_reachable,
            }
        })
    }
}

/// Poll `probe` every `interval`, sending each reading to `tx`.
///
/// Stops when `cancel` fires or the receiver is dropped. The first reading is
/// taken immediately.
pub fn spawn_probe_loop<P: NetworkProbe + 'static>(
    probe: P,
    interval: Duration,
    tx: mpsc::Sender<NetworkSnapshot>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return,
                snapshot = probe.probe() => snapshot,
            };

            if tx.send(snapshot).await.is_err() {
                return;
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    })
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
