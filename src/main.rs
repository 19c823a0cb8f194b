//! SMS alerter - sends error-level log events as SMS via MessageBird.

use anyhow::Result;
use clap::Parser;
use sms_alerter::{cli::Cli, config::Config, server::AlertServer, services::setup_alert_pipeline};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be populated.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| fail_startup(&err));

    // Build the pipeline before any runtime exists; the transport is blocking.
    let (alert_layer, worker) =
        setup_alert_pipeline(&config).unwrap_or_else(|err| fail_startup(&err));

    // The console filter applies to the console only; the alert layer sees every event.
    let console_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(console_filter))
        .with(alert_layer)
        .try_init()?;

    info!("SMS alerter starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Alert Threshold: {}", config.threshold);
    info!("Originator: {}", config.originator.as_deref().unwrap_or_default());
    info!("Recipients: {}", config.recipients.as_deref().unwrap_or_default());
    info!("Provider Endpoint: {}", config.endpoint);
    info!("Provider Timeout: {}s", config.timeout_seconds);
    info!("Alert Queue Capacity: {}", config.queue_capacity);
    info!("Listen Address: {}", config.listen_addr);
    info!("-------------------------------------------------------");

    if config.startup_self_test {
        debug!("This is a test at debug level.");
        info!("This is a test at info level.");
        warn!("This is a test at warning level.");
        error!("This is a test at error level.");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let served = runtime.block_on(serve(config.listen_addr));
    drop(runtime);

    info!("Flushing pending alerts...");
    if worker.shutdown().is_err() {
        error!("Dispatch worker panicked during shutdown.");
    }
    info!("All tasks shut down. Exiting.");
    served
}

async fn serve(listen_addr: SocketAddr) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener = TcpListener::bind(listen_addr).await?;
    let server_task = tokio::spawn(AlertServer::new(listener, shutdown_rx).run());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");
    // The server may already be gone, in which case there is nobody to tell.
    let _ = shutdown_tx.send(true);

    if let Err(e) = server_task.await {
        error!("HTTP server task panicked: {:?}", e);
    }
    Ok(())
}

/// Reports a fatal startup error and exits before anything is served.
fn fail_startup(err: &dyn std::fmt::Display) -> ! {
    // Manually initialize a console logger for this specific error.
    let _ = tracing_subscriber::fmt().try_init();
    error!("Failed to start: {:#}", err);
    std::process::exit(1);
}
