// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use aq_core::{Coordinates, ReportDraft};

use super::{probe_once, report_event, Context};
use crate::display::format_disposition;
use crate::error::Result;

pub async fn run(
    ctx: &Context,
    description: String,
    lat: f64,
    lon: f64,
    image: Option<String>,
    offline: bool,
) -> Result<()> {
    let mut draft = ReportDraft::new(description).with_coordinates(Coordinates::new(lat, lon)?);
    if let Some(image) = image {
        draft = draft.with_attachment(attachment_uri(&image));
    }

    let service = ctx.service()?;
    let mut events = service.subscribe();
    if !offline {
        // Without a reading the monitor stays offline and the report is queued
        if let Err(e) = probe_once(ctx, &service).await {
            tracing::warn!("connectivity check failed: {}", e);
        }
    }

    let disposition = service.enqueue_or_submit(draft).await?;
    // Let the follow-up drain finish before the process exits
    service.shutdown().await;

    while let Ok(event) = events.try_recv() {
        report_event(&event);
    }
    println!("{}", format_disposition(&disposition));
    Ok(())
}

/// Turn a local path into a `file://` URI; URIs pass through.
///
/// Relative paths are resolved against the working directory so the queued
/// record still points at the file when synced from elsewhere.
pub fn attachment_uri(image: &str) -> String {
    if image.contains("://") {
        return image.to_string();
    }
    let path = std::path::Path::new(image);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    format!("file://{}", absolute.display())
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
