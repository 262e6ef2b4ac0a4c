//! Whoami command implementation.

use anyhow::{Context as _, Result};
use chrono::Local;
use clap::Args;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub fn run(_args: WhoamiArgs, ctx: &Context) -> Result<()> {
    let user = ctx
        .manager
        .current_user()
        .context("Failed to load session")?
        .context("No active session. Run 'assembly auth login' first.")?;

    output::field("API", ctx.manager.client().config().api_url.as_str());
    if let Some(updated_at) = ctx.store.updated_at().context("Failed to load session")? {
        let local = updated_at.with_timezone(&Local);
        output::field("Updated", &local.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    output::json_pretty(&user)?;

    Ok(())
}
