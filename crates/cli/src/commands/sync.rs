// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{probe_once, report_event, Context};
use crate::display::format_summary;
use crate::error::Result;

pub async fn run(ctx: &Context) -> Result<()> {
    let service = ctx.service()?;
    let pending = service.pending_count();
    if pending == 0 {
        println!("Nothing to sync");
        return Ok(());
    }

    if !probe_once(ctx, &service).await? {
        println!("Service unreachable; {} report(s) still queued", pending);
        return Ok(());
    }

    let mut events = service.subscribe();
    // A fresh service holds no other drain, so a pass always runs
    let summary = service.drain_queue().await.unwrap_or_default();
    while let Ok(event) = events.try_recv() {
        report_event(&event);
    }
    println!("{}", format_summary(&summary));
    Ok(())
}
