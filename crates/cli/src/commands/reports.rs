// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::Context;
use crate::cli::OutputFormat;
use crate::display::format_report;
use crate::error::Result;

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    ctx.require_login()?;
    let reports = ctx.api()?.my_reports().await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text if reports.is_empty() => println!("No reports submitted yet"),
        OutputFormat::Text => {
            for report in &reports {
                for line in format_report(report) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}
