// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tokio::sync::broadcast::error::RecvError;

use super::Context;
use crate::display::format_summary;
use crate::error::Result;
use crate::sync::SyncEvent;

/// Probe connectivity until interrupted, syncing on every reconnect.
///
/// Exits on Ctrl-C or when the session expires, since nothing more can be
/// delivered until the user logs in again.
pub async fn run(ctx: &Context) -> Result<()> {
    let service = ctx.service()?;
    let mut events = service.subscribe();
    service.start_probe(ctx.probe()?, ctx.config.probe_interval());

    eprintln!(
        "Watching {} ({} report(s) queued); press Ctrl-C to stop",
        ctx.config.api_url,
        service.pending_count()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(SyncEvent::DrainFinished(summary)) => println!("{}", format_summary(&summary)),
                Ok(SyncEvent::ForceLogout) => {
                    eprintln!("warning: session expired; log in again with 'aqs login'");
                    break;
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!("missed {} sync event(s)", missed);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.shutdown().await;
    Ok(())
}
