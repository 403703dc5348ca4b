pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod state;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus metrics recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("serve" | "-d" | "--daemon") => run_daemon(config, prometheus_handle).await,
        Some("init" | "--init") => {
            if Config::create_default_if_missing()? {
                println!("✓ Default config written to config.toml");
                println!("  Edit it and start the server with: renty serve");
            } else {
                println!("config.toml already exists, leaving it untouched");
            }
            Ok(())
        }
        Some("help" | "--help" | "-h") | None => {
            print_help();
            Ok(())
        }
        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url)
            .context("Invalid Loki URL in configuration")?;

        let (loki_layer, task) = tracing_loki::builder()
            .label("app", "renty")?
            .extra_field("pid", std::process::id().to_string())?
            .build_url(url)?;

        tokio::spawn(task);
        registry.with(loki_layer).init();
        info!("Loki log shipping enabled: {}", config.observability.loki_url);
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Renty v{} starting", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state_from_config(config.clone(), prometheus_handle).await?;

    let server_handle = if config.server.enabled {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let app = api::router(state).await;
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("HTTP API listening on {addr}");

        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {e}");
            }
        }))
    } else {
        info!("Web server disabled in configuration");
        None
    };

    info!("Service running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }

    if let Some(handle) = server_handle {
        handle.abort();
    }

    info!("Service stopped");
    Ok(())
}

fn print_help() {
    println!("Renty - marketplace API for renting and selling musical instruments");
    println!();
    println!("USAGE:");
    println!("  renty <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  serve    Start the HTTP API server");
    println!("  init     Write a default config.toml in the working directory");
    println!("  help     Show this message");
    println!();
    println!("Config is read from ./config.toml, ~/.config/renty/config.toml");
    println!("or ~/.renty/config.toml, whichever exists first.");
}
