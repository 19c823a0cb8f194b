//! Encapsulation for setting up the alert pipeline.

use crate::{
    config::Config,
    core::Diagnostics,
    diagnostics::StderrDiagnostics,
    notification::{layer::AlertLayer, messagebird::MessageBirdTransport, worker::DispatchWorker},
    sink::AlertSink,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Validates the alert settings, builds the MessageBird transport and starts
/// the dispatch worker.
///
/// Must be called outside of an async runtime, since the transport owns a
/// blocking HTTP client. Any configuration problem is returned as an error
/// and must abort startup.
pub fn setup_alert_pipeline(config: &Config) -> Result<(AlertLayer, DispatchWorker)> {
    let alert_config = config.alert_config()?;
    let api_key = config.api_key()?;

    let transport = MessageBirdTransport::new(
        &config.endpoint,
        api_key,
        Duration::from_secs(config.timeout_seconds),
    )
    .context("failed to build the MessageBird client")?;

    let diagnostics: Arc<dyn Diagnostics> = Arc::new(StderrDiagnostics);
    let threshold = alert_config.threshold();
    let sink = AlertSink::new(alert_config, Arc::new(transport), diagnostics.clone());

    DispatchWorker::spawn(
        Arc::new(sink),
        threshold,
        config.queue_capacity,
        diagnostics,
    )
    .context("failed to start the dispatch worker")
}
