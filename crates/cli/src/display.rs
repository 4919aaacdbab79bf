// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use aq_core::{PendingReport, SubmittedReport};
use serde::Serialize;

use crate::service::{Disposition, QueueReason};
use crate::sync::DrainSummary;

/// Maximum description width in list output before truncation.
const DESCRIPTION_WIDTH: usize = 60;

/// Shorten `text` to `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// One line per queued report, oldest first.
///
/// ```text
///   1. Flooded underpass (13.0500, 80.2800) [photo.jpg]
/// ```
pub fn format_pending_line(position: usize, report: &PendingReport) -> String {
    let mut line = format!(
        "{:>3}. {} ({})",
        position,
        truncate(report.description(), DESCRIPTION_WIDTH),
        report.coordinates()
    );
    if let Some(name) = report.attachment_file_name() {
        line.push_str(&format!(" [{}]", name));
    }
    line
}

/// One line per submitted report, plus an indented notes line if present.
///
/// ```text
/// #12 2025-09-14 08:30  verified      Flooded underpass
///     note: Crew dispatched
/// ```
pub fn format_report(report: &SubmittedReport) -> Vec<String> {
    let mut lines = vec![format!(
        "#{} {}  {:<12}  {}",
        report.id,
        report.timestamp.format("%Y-%m-%d %H:%M"),
        report.status.label(),
        truncate(&report.description, DESCRIPTION_WIDTH)
    )];
    if let Some(notes) = report.notes.as_deref().map(str::trim) {
        if !notes.is_empty() {
            lines.push(format!("    note: {}", notes));
        }
    }
    lines
}

/// Human summary of a drain pass.
pub fn format_summary(summary: &DrainSummary) -> String {
    if summary.is_noop() {
        return "Nothing to sync".to_string();
    }
    let mut text = format!(
        "Synced {} of {} queued report(s)",
        summary.succeeded, summary.attempted
    );
    if summary.failed > 0 {
        text.push_str(&format!(", {} still pending", summary.failed));
    }
    if summary.auth_expired {
        text.push_str("; session expired, log in again to finish");
    }
    text
}

/// Human description of what happened to a submitted draft.
pub fn format_disposition(disposition: &Disposition) -> String {
    match disposition {
        Disposition::Submitted(Some(report)) => format!("Submitted report #{}", report.id),
        Disposition::Submitted(None) => "Submitted report".to_string(),
        Disposition::Queued { reason, durable } => {
            let why = match reason {
                QueueReason::Offline => "offline",
                QueueReason::AuthExpired => "session expired",
                QueueReason::SubmitFailed => "upload failed",
            };
            let mut text = format!("Queued report ({}); it will be sent on the next sync", why);
            if !durable {
                text.push_str("\nwarning: the queue could not be saved to disk");
            }
            text
        }
    }
}

/// Queue entry as shown in JSON output.
#[derive(Serialize)]
struct PendingJson<'a> {
    position: usize,
    #[serde(flatten)]
    report: &'a PendingReport,
}

/// Queued reports as a JSON array, oldest first, numbered from 1.
pub fn pending_json(queue: &[PendingReport]) -> serde_json::Result<String> {
    let entries: Vec<PendingJson<'_>> = queue
        .iter()
        .enumerate()
        .map(|(i, report)| PendingJson {
            position: i + 1,
            report,
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
