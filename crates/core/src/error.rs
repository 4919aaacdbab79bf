// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for aq-core operations.

use thiserror::Error;

/// Validation errors raised before any report touches storage or the network.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("description is required\n  hint: describe the hazard (e.g. high waves, flooding)")]
    EmptyDescription,

    #[error("location is required\n  hint: acquire a GPS fix before submitting")]
    MissingCoordinates,

    #[error("invalid coordinates ({latitude}, {longitude})\n  hint: latitude must be within -90..=90 and longitude within -180..=180")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("invalid report status: '{0}'\n  hint: valid statuses are: new, verified, action_taken, false_alarm")]
    InvalidStatus(String),

    #[error("{0} cannot be empty")]
    FieldRequired(&'static str),

    #[error("invalid timestamp: '{0}'")]
    InvalidTimestamp(String),
}

/// Result type alias using the aq-core error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
