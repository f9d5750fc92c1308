//! herakles-nsd-exporter - version 0.1.0
//!
//! Prometheus exporter for NSD statistics collected through nsd-control.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod health_stats;
mod metrics;
mod poller;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{error, info};
use tracing::level_filters::LevelFilter;

use cli::{Args, Commands};
use commands::{command_check, command_config, command_test};
use config::{
    describe_collector, resolve_config, show_config, validate_effective_config, Config,
    DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, root_handler};
use health_stats::CollectStats;
use metrics::NsdMetrics;
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level_name = config.log_level.as_deref().unwrap_or("info");
    let log_level = match level_name {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Logging initialized with level: {}", level_name);
    Ok(())
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = resolve_config(&args)?;
        setup_logging(&config)?;

        let result = match command {
            Commands::Check => command_check(&config).await,
            Commands::Test {
                iterations,
                verbose,
                format,
            } => command_test(*iterations, *verbose, format.clone(), &config).await,
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
        return result.map_err(|e| e.into());
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config)?;

    info!("Starting herakles-nsd-exporter");
    info!("NSD collector: {}", describe_collector(&config.nsd));

    if let Err(e) = startup_checks::validate_requirements(&config.nsd) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The exporter will start but may not function correctly!");
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let registry = Registry::new();
    let metrics = NsdMetrics::new(&registry, config.enable_telemetry.unwrap_or(true))?;
    let collect_stats = Arc::new(CollectStats::new());

    let creator = herakles_nsd_exporter::creator();
    let update_every = Duration::from_secs(config.nsd.update_every);
    let mut collector = creator.create(config.nsd.clone());

    if let Err(e) = collector.init().await {
        error!("❌ {} collector init failed: {}", creator.name, e);
        std::process::exit(1);
    }
    if let Err(e) = collector.check().await {
        error!("❌ {} collector check failed: {}", creator.name, e);
        collector.cleanup().await;
        std::process::exit(1);
    }
    info!("✅ {} collector ready", creator.name);

    let state = Arc::new(AppState::new(
        registry,
        metrics,
        config.clone(),
        collect_stats,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(poller::run_poller(
        state.clone(),
        collector,
        update_every,
        shutdown_rx,
    ));

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!(
        "herakles-nsd-exporter listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let served = server.await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = poller.await {
        error!("Poller task failed: {}", e);
    }

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("herakles-nsd-exporter stopped gracefully");
    Ok(())
}
