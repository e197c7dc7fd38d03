//! ServerGem Backend - Entry Point
//!
//! Chat-driven deployment service: accepts a GitHub repository URL over
//! HTTP or WebSocket and deploys it to a cloud container service.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use servergem::app::options::{AppOptions, LifecycleOptions, ServerOptions};
use servergem::app::run::run;
use servergem::logs::{init_logging, LogOptions};
use servergem::utils::version_info;

use secrecy::SecretString;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli_args = parse_cli_args();

    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{} ({})", version.version, version.git_hash),
        }
        return Ok(());
    }

    let mut log_options = LogOptions::default();
    if let Some(level) = cli_args.get("log-level") {
        match level.parse() {
            Ok(parsed) => log_options.log_level = parsed,
            Err(e) => println!("{e}, using default log level"),
        }
    }
    log_options.json_format = cli_args.contains_key("json-logs");
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    let options = build_options(&cli_args);

    info!("Running ServerGem backend v{}", version.version);
    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("Backend exited with error: {e}");
        return Err(e.into());
    }
    Ok(())
}

/// Parse `--key=value` pairs and standalone `--flag`s into a map
fn parse_cli_args() -> HashMap<String, String> {
    env::args()
        .skip(1)
        .filter_map(|arg| {
            let key = arg.trim_start_matches('-');
            match key.split_once('=') {
                Some((k, v)) => Some((k.to_string(), v.to_string())),
                None if arg.starts_with("--") => Some((key.to_string(), "true".to_string())),
                None => None,
            }
        })
        .collect()
}

fn build_options(cli_args: &HashMap<String, String>) -> AppOptions {
    let defaults = ServerOptions::default();

    let mut options = AppOptions {
        lifecycle: LifecycleOptions {
            is_persistent: !cli_args.contains_key("transient"),
            ..Default::default()
        },
        server: ServerOptions {
            host: cli_args.get("host").cloned().unwrap_or(defaults.host),
            port: cli_args
                .get("port")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        },
        github_token: cli_args
            .get("github-token")
            .cloned()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .map(SecretString::from),
        ..Default::default()
    };

    if let Some(region) = cli_args.get("region") {
        options.deploy.cloud.region = region.clone();
    }
    if let Some(registry) = cli_args.get("registry") {
        options.deploy.cloud.registry = registry.clone();
    }
    if let Some(dir) = cli_args.get("workspace-dir") {
        options.deploy.workspace_dir = PathBuf::from(dir);
    }

    options
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("SIGTERM received, shutting down..."),
                    _ = tokio::signal::ctrl_c() => info!("Interrupt received, shutting down..."),
                }
            }
            Err(e) => {
                error!("Could not install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, shutting down..."),
            Err(e) => error!("Ctrl+C handler failed: {e}"),
        }
    }
}
