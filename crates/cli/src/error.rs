// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::api::ApiError;
use crate::sync::StorageError;

/// All possible errors that can occur in the aqrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] aq_core::Error),

    #[error("local storage error: {0}\n  hint: the report was not saved; check free space and permissions")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("not logged in\n  hint: run 'aqs login' and export the printed AQS_SESSION value")]
    NotLoggedIn,

    #[error("cannot determine data directory\n  hint: pass --data-dir or set AQS_DATA_DIR")]
    NoDataDir,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using the aqrs error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
