//! assembly - command-line client for the assembly platform API.
//!
//! A thin wrapper over `assembly-http`: log in once, then send requests
//! through the same authenticated client the dashboards use, with the
//! session kept in a local file.

mod cli;
mod commands;
mod context;
mod output;
mod ui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{api, auth};
use context::Context;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.json_logs);

    let ctx = Context::new(&cli.global)?;

    match cli.command {
        Commands::Auth(cmd) => auth::handle(cmd, &ctx).await,
        Commands::Api(cmd) => api::handle(cmd, &ctx).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
