// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Submission abstraction for uploading a single report.
//!
//! Provides a trait-based seam that enables:
//! - The HTTP client for production ([`crate::api::ApiClient`])
//! - Scripted submitters for unit testing the coordinator

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use aq_core::{PendingReport, SubmittedReport};

/// Why the remote service refused a report outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The session credential is no longer accepted (HTTP 401).
    AuthExpired,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AuthExpired => write!(f, "session expired"),
        }
    }
}

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The service stored the report. Carries the stored record when the
    /// response body could be parsed.
    Accepted(Option<SubmittedReport>),
    /// The service refused the request; the report must stay queued.
    Rejected(RejectReason),
    /// Network error, timeout or non-401 error status. Always retryable.
    TransientFailure(String),
}

/// Boxed future returned by [`Submitter::submit`].
pub type SubmitFuture<'a> = Pin<Box<dyn Future<Output = SubmitOutcome> + Send + 'a>>;

/// Performs a single upload attempt.
///
/// Implementations never touch the offline queue; deciding what stays queued
/// is the coordinator's job.
pub trait Submitter: Send + Sync {
    /// Attempt to deliver `report` once.
    fn submit<'a>(&'a self, report: &'a PendingReport) -> SubmitFuture<'a>;
}

impl<T: Submitter + ?Sized> Submitter for std::sync::Arc<T> {
    fn submit<'a>(&'a self, report: &'a PendingReport) -> SubmitFuture<'a> {
        (**self).submit(report)
    }
}
