//! Logout command implementation.

use anyhow::{Context as _, Result};
use clap::Args;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, ctx: &Context) -> Result<()> {
    ctx.manager.logout().await.context("Failed to logout")?;

    output::success("Logged out");

    Ok(())
}
