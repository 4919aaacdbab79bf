// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "aqs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first hazard reporting client")]
#[command(
    long_about = "Offline-first hazard reporting client.\n\n\
    Reports submitted without connectivity are queued on disk and delivered\n\
    in order once the reporting service is reachable again."
)]
pub struct Cli {
    /// Directory holding the offline queue and config.toml
    #[arg(long, global = true, env = "AQS_DATA_DIR", value_name = "path")]
    pub data_dir: Option<PathBuf>,

    /// Session cookie from 'aqs login'
    #[arg(long, global = true, env = "AQS_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Log sync activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a hazard report, queueing it if the service is unreachable
    #[command(after_help = "\
Examples:
  aqs submit -d \"Flooded underpass\" --lat 13.05 --lon 80.28
  aqs submit -d \"Oil sheen\" --lat 13.1 --lon 80.3 --image photo.jpg
  aqs submit -d \"Debris\" --lat 13.1 --lon 80.3 --offline")]
    Submit {
        /// What was observed
        #[arg(short, long, value_parser = non_empty_string)]
        description: String,

        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Photo to attach (path or file:// URI)
        #[arg(long, value_name = "path")]
        image: Option<String>,

        /// Queue the report without trying the network
        #[arg(long)]
        offline: bool,
    },

    /// Deliver queued reports now
    Sync,

    /// List reports waiting in the offline queue
    Pending {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List reports already submitted by the logged-in user
    Reports {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Log in and print the session cookie to export as AQS_SESSION
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "AQS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a citizen account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "AQS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Stay running and deliver the queue whenever the service comes back
    Watch,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
