// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Hazard report types.
//!
//! A [`ReportDraft`] is what the composer collects from the user. Validating it
//! yields an immutable [`PendingReport`], the unit stored in the offline queue
//! and uploaded by the submitter. Once the remote service accepts a report it
//! comes back as a [`SubmittedReport`] with a server id and a review status.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Content type used for attachments whose extension is not a known image type.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(Error::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// User input collected by the composer, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub description: String,
    pub coordinates: Option<Coordinates>,
    pub attachment: Option<String>,
}

impl ReportDraft {
    pub fn new(description: impl Into<String>) -> Self {
        ReportDraft {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    /// Validates the draft into a queueable report.
    ///
    /// A blank description or missing location is rejected here, before any
    /// storage or network I/O, so an invalid report is never queued.
    pub fn validate(self) -> Result<PendingReport> {
        if self.description.trim().is_empty() {
            return Err(Error::EmptyDescription);
        }
        let coordinates = self.coordinates.ok_or(Error::MissingCoordinates)?;
        let coordinates = Coordinates::new(coordinates.latitude, coordinates.longitude)?;
        let attachment = self.attachment.filter(|a| !a.trim().is_empty());

        Ok(PendingReport {
            description: self.description,
            coordinates,
            attachment,
        })
    }
}

/// A validated hazard report awaiting delivery.
///
/// Fields are private: a queued report is never edited, and retries re-send
/// exactly the payload that was enqueued. The serialized shape matches the
/// records the mobile client kept under its offline queue key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReport {
    description: String,
    #[serde(flatten)]
    coordinates: Coordinates,
    #[serde(rename = "imageUri", default)]
    attachment: Option<String>,
}

impl PendingReport {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// The local image reference as recorded (may be a `file://` URI).
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    /// Filesystem path of the attachment, with any `file://` scheme removed.
    pub fn attachment_path(&self) -> Option<PathBuf> {
        self.attachment.as_deref().map(|uri| {
            PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
        })
    }

    /// Final path segment of the attachment reference.
    pub fn attachment_file_name(&self) -> Option<&str> {
        self.attachment
            .as_deref()
            .and_then(|uri| uri.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// Infers an upload content type from a file name's extension.
///
/// Known image extensions map to their `image/*` type; anything else,
/// including names without an extension, falls back to a generic binary type.
pub fn attachment_content_type(file_name: &str) -> &'static str {
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return FALLBACK_CONTENT_TYPE,
    };
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Review status assigned by analysts on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Received, not yet reviewed.
    New,
    /// Confirmed by an analyst.
    Verified,
    /// Authorities have acted on the report.
    ActionTaken,
    /// Reviewed and dismissed.
    FalseAlarm,
}

impl ReportStatus {
    /// Returns the string representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::New => "new",
            ReportStatus::Verified => "verified",
            ReportStatus::ActionTaken => "action_taken",
            ReportStatus::FalseAlarm => "false_alarm",
        }
    }

    /// Human-readable label for list output.
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::New => "new",
            ReportStatus::Verified => "verified",
            ReportStatus::ActionTaken => "action taken",
            ReportStatus::FalseAlarm => "false alarm",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "new" => Ok(ReportStatus::New),
            "verified" => Ok(ReportStatus::Verified),
            "action_taken" => Ok(ReportStatus::ActionTaken),
            "false_alarm" => Ok(ReportStatus::FalseAlarm),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A report as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedReport {
    pub id: i64,
    pub description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Account details returned on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// Parses a server timestamp.
///
/// Accepts RFC 3339 as well as the offset-less ISO form the service emits for
/// rows read back from its database; offset-less values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidTimestamp(s.to_string()))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
