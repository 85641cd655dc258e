//! resilient-fetch
//!
//! Command-line front end for the resilient fetch layer. Talks to the admin
//! backend the same way the dashboard does: token from the session source
//! through the coordinator, authenticated request, safe response.
//!
//! ```text
//!   session source ──▶ TokenCoordinator ──▶ ApiClient ──▶ backend
//!                            ▲                  │
//!                            │ reset            │ 401/403
//!                            └──── teardown ◀── AuthFailureSignal
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use resilient_fetch::config::{load_config, ClientConfig};
use resilient_fetch::observability::{logging, metrics};
use resilient_fetch::session::ConfiguredSession;
use resilient_fetch::ApiClient;

#[derive(Parser)]
#[command(name = "resilient-fetch")]
#[command(about = "Authenticated, self-healing calls against the admin backend API", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override api.base_url.
    #[arg(short, long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a JSON resource
    Get { path: String },
    /// Fetch one page of a list endpoint
    List {
        path: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Fetch a resource repeatedly until Ctrl-C
    Poll {
        path: String,
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
    /// Check whether a usable token is available
    Token,
}

#[derive(Serialize)]
struct TokenReport {
    available: bool,
    #[serde(flatten)]
    state: resilient_fetch::token::TokenStateSnapshot,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
        resilient_fetch::config::validate_config(&config)
            .map_err(resilient_fetch::config::ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "resilient-fetch starting");

    let session = ConfiguredSession::from_config(
        &config.session,
        Duration::from_secs(config.api.request_timeout_secs),
    )?;
    tracing::info!(
        base_url = %config.api.base_url,
        session = session.kind(),
        max_retries = config.coordinator.max_retries,
        cooldown_ms = config.coordinator.cooldown_ms,
        "Configuration loaded"
    );

    let client = Arc::new(ApiClient::from_config(&config, session)?);

    // Session teardown: a rejected token invalidates all bookkeeping.
    let coordinator = Arc::clone(client.coordinator());
    let teardown = client.signal().subscribe(move |event| {
        tracing::warn!(
            reason = %event.reason,
            status = event.status,
            source = event.source.as_deref().unwrap_or("-"),
            "Session rejected by backend, clearing token state"
        );
        coordinator.reset();
    });

    match cli.command {
        Commands::Get { path } => {
            let response = client.get_or_default(&path, Value::Null).await;
            print_json(&response)?;
        }
        Commands::List { path, page, limit } => {
            let response = client.list::<Value>(&path, page, limit).await;
            print_json(&response)?;
        }
        Commands::Poll { path, interval_secs } => {
            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }
            poll(&client, &path, Duration::from_secs(interval_secs.max(1))).await;
        }
        Commands::Token => {
            let available = client.coordinator().get_token_with_retry().await.is_some();
            let report = TokenReport {
                available,
                state: client.coordinator().snapshot(),
            };
            print_json(&report)?;
        }
    }

    teardown.unsubscribe();
    tracing::info!("Done");
    Ok(())
}

async fn poll(client: &ApiClient<ConfiguredSession>, path: &str, interval: Duration) {
    tracing::info!(path, interval_secs = interval.as_secs(), "Polling");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let response = client.get_or_default(path, Value::Null).await;
                match &response.error {
                    None => tracing::info!(path, "Poll succeeded"),
                    Some(error) => tracing::warn!(
                        path,
                        kind = %error.kind,
                        retryable = error.retryable,
                        message = %error.message,
                        "Poll degraded"
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, stopping poll loop");
                break;
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
