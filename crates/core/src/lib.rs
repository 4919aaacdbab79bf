// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! aq-core: Shared types for the AquaSentry hazard reporting client
//!
//! This crate provides the report data model and its validation rules, used
//! by the offline queue, the submitter and the CLI.

pub mod error;
pub mod report;

pub use error::{Error, Result};
pub use report::{
    attachment_content_type, parse_timestamp, Coordinates, PendingReport, ReportDraft,
    ReportStatus, SubmittedReport, UserInfo, FALLBACK_CONTENT_TYPE,
};
