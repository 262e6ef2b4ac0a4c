//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::api::ApiCommand;
use crate::commands::auth::AuthCommand;

/// Command-line client for the assembly platform API.
#[derive(Parser, Debug)]
#[command(name = "assembly")]
#[command(author, version = env!("ASSEMBLY_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL [default: $ASSEMBLY_API_URL or http://localhost:8000/api/v1]
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session file [default: session.json in the user data directory]
    #[arg(long, global = true, env = "ASSEMBLY_SESSION_FILE")]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, inspect and end the stored session
    Auth(AuthCommand),

    /// Send raw requests to the API
    Api(ApiCommand),
}
