//! Raw API requests.

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use serde_json::Value;

use assembly_http::ApiRequest;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct ApiCommand {
    #[command(subcommand)]
    pub command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ApiSubcommand {
    /// GET a path
    Get(ReadArgs),

    /// DELETE a path
    Delete(ReadArgs),

    /// POST a JSON body
    Post(WriteArgs),

    /// PUT a JSON body
    Put(WriteArgs),

    /// PATCH a JSON body
    Patch(WriteArgs),
}

/// Where and how a request is sent.
#[derive(Args, Debug)]
pub struct Target {
    /// Path relative to the API base URL, e.g. /units
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Send through the public client (no token, no refresh)
    #[arg(long, conflicts_with = "skip_auth")]
    pub public: bool,

    /// Send through the authenticated client without a bearer token
    #[arg(long)]
    pub skip_auth: bool,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub target: Target,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub target: Target,

    /// JSON request body
    #[arg(long, short = 'd', value_parser = parse_json)]
    pub data: Option<Value>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_json(s: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

pub async fn handle(cmd: ApiCommand, ctx: &Context) -> Result<()> {
    let (request, target) = match cmd.command {
        ApiSubcommand::Get(args) => (ApiRequest::get(&args.target.path), args.target),
        ApiSubcommand::Delete(args) => (ApiRequest::delete(&args.target.path), args.target),
        ApiSubcommand::Post(args) => with_body(ApiRequest::post(&args.target.path), args)?,
        ApiSubcommand::Put(args) => with_body(ApiRequest::put(&args.target.path), args)?,
        ApiSubcommand::Patch(args) => with_body(ApiRequest::patch(&args.target.path), args)?,
    };

    send(request, target, ctx).await
}

fn with_body(request: ApiRequest, args: WriteArgs) -> Result<(ApiRequest, Target)> {
    let request = match &args.data {
        Some(data) => request.json(data).context("Invalid request body")?,
        None => request,
    };
    Ok((request, args.target))
}

async fn send(mut request: ApiRequest, target: Target, ctx: &Context) -> Result<()> {
    if !target.path.starts_with('/') {
        bail!("Path must start with '/': {}", target.path);
    }

    for (key, value) in target.query {
        request = request.query(key, value);
    }

    let description = format!("{} {}", request.method, request.path);
    let result = if target.public {
        ctx.manager.public().send::<Value>(request).await
    } else if target.skip_auth {
        ctx.manager.client().send(request.skip_auth()).await
    } else {
        ctx.manager.client().send(request).await
    };
    let response = result.with_context(|| format!("{description} failed"))?;

    if !response.is_null() {
        output::json_pretty(&response)?;
    }

    Ok(())
}
