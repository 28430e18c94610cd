use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;

use apex_devserver::config::schema::DEFAULT_PROBE_PATH;
use apex_devserver::observability::logging;
use apex_devserver::probe::{view, ConnectionStatus, HttpFetcher, ProbeSettings, StatusProbe};

#[derive(Parser)]
#[command(name = "apex-probe")]
#[command(about = "Check that the web service answers through the dev server", long_about = None)]
struct Cli {
    /// Origin to probe, usually the dev server.
    #[arg(short, long, default_value = "http://localhost:5173")]
    url: String,

    /// Path requested on the origin.
    #[arg(short, long, default_value = DEFAULT_PROBE_PATH)]
    path: String,

    /// Give up after this many seconds instead of waiting for the socket.
    #[arg(short, long)]
    timeout_secs: Option<u64>,

    /// Print the settled status as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; the rendered status goes to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| logging::default_directives("warn").into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let fetcher = HttpFetcher::new(&cli.url)?;
    let settings = ProbeSettings {
        path: cli.path,
        timeout: cli.timeout_secs.map(Duration::from_secs),
    };

    let mut probe = StatusProbe::mount(Arc::new(fetcher), settings.clone());
    if !cli.json {
        println!("{}", view::render_text(&probe.status()));
    }

    let status = probe.settled().await;
    if cli.json {
        let report = json!({
            "probe_id": probe.id(),
            "origin": cli.url,
            "path": settings.path,
            "state": status.label(),
            "code": status.code().map(|code| code.as_u16()),
            "message": status.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Status: {status}");
    }

    Ok(match status {
        ConnectionStatus::Connected(_) => ExitCode::SUCCESS,
        ConnectionStatus::ConnectedWithUnexpectedStatus(_) => ExitCode::from(1),
        ConnectionStatus::Unreachable | ConnectionStatus::Checking => ExitCode::from(2),
    })
}
