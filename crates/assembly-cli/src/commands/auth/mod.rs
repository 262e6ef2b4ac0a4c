//! Auth subcommand implementations.

mod login;
mod logout;
mod refresh;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::Context;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Log in and store the session
    Login(login::LoginArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Refresh the access token
    Refresh(refresh::RefreshArgs),

    /// Log out and forget the session
    Logout(logout::LogoutArgs),
}

pub async fn handle(cmd: AuthCommand, ctx: &Context) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(args, ctx).await,
        AuthSubcommand::Whoami(args) => whoami::run(args, ctx),
        AuthSubcommand::Refresh(args) => refresh::run(args, ctx).await,
        AuthSubcommand::Logout(args) => logout::run(args, ctx).await,
    }
}
