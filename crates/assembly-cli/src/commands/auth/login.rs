//! Login command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use assembly_core::Credentials;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username or email
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(args: LoginArgs, ctx: &Context) -> Result<()> {
    let credentials = Credentials::new(&args.username, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let session = ctx
        .manager
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("API", ctx.manager.client().config().api_url.as_str());
    output::field("Session", &ctx.store.path().display().to_string());
    if let Some(role) = session.user.get("role").and_then(|r| r.as_str()) {
        output::field("Role", role);
    }

    Ok(())
}
