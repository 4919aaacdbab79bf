// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::Context;
use crate::cli::OutputFormat;
use crate::display::{format_pending_line, pending_json};
use crate::error::Result;

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let queue = ctx.queue()?.load();

    match output {
        OutputFormat::Json => println!("{}", pending_json(&queue)?),
        OutputFormat::Text if queue.is_empty() => println!("No pending reports"),
        OutputFormat::Text => {
            for (i, report) in queue.iter().enumerate() {
                println!("{}", format_pending_line(i + 1, report));
            }
        }
    }
    Ok(())
}
