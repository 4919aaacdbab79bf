// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::Context;
use crate::error::Result;

pub async fn login(ctx: &Context, username: &str, password: &str) -> Result<()> {
    let (user, credential) = ctx.api()?.login(username, password).await?;
    eprintln!("Logged in as {} ({})", user.username, user.role);
    println!("export AQS_SESSION='{}'", credential.as_str());
    Ok(())
}

pub async fn register(ctx: &Context, username: &str, password: &str) -> Result<()> {
    ctx.api()?.register(username, password).await?;
    println!("Registered {}; log in with 'aqs login'", username.trim());
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.require_login()?;
    ctx.api()?.logout().await?;
    println!("Logged out; unset AQS_SESSION");
    Ok(())
}
