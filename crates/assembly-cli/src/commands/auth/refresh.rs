//! Refresh command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, ctx: &Context) -> Result<()> {
    ctx.manager
        .tokens()
        .refresh_token()
        .context("Failed to load session")?
        .context("No active session. Run 'assembly auth login' first.")?;

    eprintln!("{}", "Refreshing session...".dimmed());

    ctx.manager
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");

    Ok(())
}
