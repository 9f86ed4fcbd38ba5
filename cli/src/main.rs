use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use wsresource::config::connect_timeout_from_env;
use wsresource::{
    ConnectError, ConnectOptions, IncomingRequest, ResourceConfig, ResourceError, Response, SendRequest,
    WebSocketResource, connect,
};

/// How long `request` waits for the close handshake after printing.
const CLOSE_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing server url; pass --url or set WSR_URL")]
    MissingUrl,
    #[error("failed to read certificate authority: {0}")]
    CaFile(#[from] std::io::Error),
    #[error("connect failed: {0}")]
    Connect(#[from] ConnectError),
    #[error("request failed: {0}")]
    Request(#[from] ResourceError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "wsr", about = "Request/response client over a single WebSocket")]
struct Cli {
    /// Server URL (`ws`, `wss`, `http`, or `https`).
    #[arg(long, env = "WSR_URL", global = true)]
    url: Option<String>,

    /// PEM file with trust anchors replacing the default roots.
    #[arg(long, env = "WSR_CA_FILE", global = true)]
    ca_file: Option<PathBuf>,

    /// Version reported in the User-Agent header.
    #[arg(long, env = "WSR_CLIENT_VERSION", global = true, default_value = env!("CARGO_PKG_VERSION"))]
    client_version: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one request and print the response as JSON.
    Request(RequestArgs),
    /// Stay connected and answer every incoming request with 200 OK.
    Listen(ListenArgs),
}

#[derive(Args, Debug)]
struct RequestArgs {
    #[arg(long, default_value = "GET")]
    verb: String,

    #[arg(long)]
    path: String,

    /// `name:value` header line; repeatable.
    #[arg(long = "header")]
    headers: Vec<String>,

    #[arg(long)]
    body: Option<String>,

    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct ListenArgs {
    /// Override the keepalive probe path.
    #[arg(long)]
    keepalive_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let options = connect_options(&cli)?;

    match cli.command {
        Command::Request(args) => run_request(options, args).await,
        Command::Listen(args) => run_listen(options, args).await,
    }
}

fn connect_options(cli: &Cli) -> Result<ConnectOptions, CliError> {
    let url = cli.url.clone().ok_or(CliError::MissingUrl)?;
    let mut options = ConnectOptions::new("wsr", url, cli.client_version.clone()).with_timeout(connect_timeout_from_env());
    if let Some(path) = &cli.ca_file {
        options = options.with_certificate_authority(std::fs::read_to_string(path)?);
    }
    Ok(options)
}

async fn run_request(options: ConnectOptions, args: RequestArgs) -> Result<(), CliError> {
    let config = ResourceConfig { keepalive: None, ..ResourceConfig::from_env() };
    let resource = connect(options, move |stream| WebSocketResource::new(stream, config)).await?;

    let result = resource.send_request(build_request(args)).await;

    resource.shutdown();
    if tokio::time::timeout(CLOSE_WAIT, resource.closed()).await.is_err() {
        warn!("wsr: close not confirmed");
    }

    print_json(&response_json(&result?)?)
}

async fn run_listen(options: ConnectOptions, args: ListenArgs) -> Result<(), CliError> {
    let mut config = ResourceConfig::from_env();
    if let (Some(keepalive), Some(path)) = (config.keepalive.as_mut(), args.keepalive_path) {
        keepalive.path = path;
    }
    let resource = connect(options, move |stream| WebSocketResource::new(stream, config)).await?;
    info!(conn_id = %resource.conn_id(), "wsr: listening");

    resource.set_request_handler(|incoming: IncomingRequest| {
        info!(id = incoming.id(), verb = %incoming.verb(), path = %incoming.path(), "wsr: request");
        incoming.respond(200, "OK");
    });

    tokio::select! {
        event = resource.closed() => {
            info!(code = event.code, reason = %event.reason, "wsr: connection closed");
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("wsr: shutting down");
            resource.shutdown();
        }
    }

    let event = resource.closed().await;
    info!(code = event.code, reason = %event.reason, "wsr: connection closed");
    Ok(())
}

fn build_request(args: RequestArgs) -> SendRequest {
    let mut request = SendRequest::new(args.verb, args.path);
    request.headers = args.headers;
    request.body = args.body.map(String::into_bytes);
    request.timeout = args.timeout_ms.map(Duration::from_millis);
    request
}

/// Response as JSON, with the body rendered as text.
fn response_json(response: &Response) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(response)?;
    if let (Some(map), Some(body)) = (value.as_object_mut(), response.body.as_deref()) {
        map.insert("body".to_owned(), Value::String(String::from_utf8_lossy(body).into_owned()));
    }
    Ok(value)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
