//! The background worker that performs blocking SMS dispatch.
//!
//! Provider calls can take up to the transport timeout, so they run on a
//! dedicated thread fed by a bounded queue instead of on the thread that
//! emitted the log event.

use crate::core::{Diagnostics, LogEvent, LogSink, Severity};
use crate::notification::layer::AlertLayer;
use async_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

const WORKER_THREAD_NAME: &str = "sms-dispatch";

/// A handle to the running dispatch thread.
pub struct DispatchWorker {
    queue: Sender<LogEvent>,
    handle: Option<JoinHandle<()>>,
}

impl DispatchWorker {
    /// Starts the worker and returns the layer that feeds it.
    ///
    /// # Arguments
    /// * `sink` - Receives every queued event, one at a time.
    /// * `threshold` - Events below this are never queued.
    /// * `capacity` - Maximum number of events waiting for dispatch.
    /// * `diagnostics` - Told about events that could not be queued.
    pub fn spawn(
        sink: Arc<dyn LogSink>,
        threshold: Severity,
        capacity: usize,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> std::io::Result<(AlertLayer, DispatchWorker)> {
        let (tx, rx) = async_channel::bounded(capacity.max(1));
        let worker_diagnostics = diagnostics.clone();
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || Self::run(rx, sink, worker_diagnostics))?;

        let layer = AlertLayer::new(tx.clone(), threshold, diagnostics);
        Ok((
            layer,
            DispatchWorker {
                queue: tx,
                handle: Some(handle),
            },
        ))
    }

    fn run(rx: Receiver<LogEvent>, sink: Arc<dyn LogSink>, diagnostics: Arc<dyn Diagnostics>) {
        debug!("Dispatch worker started.");
        while let Ok(event) = rx.recv_blocking() {
            if panic::catch_unwind(AssertUnwindSafe(|| sink.handle(&event))).is_err() {
                diagnostics.alert_dropped(&event, "alert dispatch panicked");
            }
        }
        debug!("Alert queue closed. Dispatch worker exiting.");
    }

    /// Stops accepting events, dispatches what is already queued and waits
    /// for the thread to finish.
    pub fn shutdown(mut self) -> std::thread::Result<()> {
        self.queue.close();
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertConfig;
    use crate::core::RecipientId;
    use crate::sink::test_support::{RecordingDiagnostics, RecordingTransport};
    use crate::sink::AlertSink;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    struct PanickingSink;

    impl LogSink for PanickingSink {
        fn handle(&self, _event: &LogEvent) {
            panic!("sink exploded");
        }
    }

    #[test]
    fn test_worker_dispatches_and_drains_on_shutdown() {
        let transport = Arc::new(RecordingTransport::default());
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let config = AlertConfig::new("Ops", vec![RecipientId::new(31600000000)], Severity::Error).unwrap();
        let sink = Arc::new(AlertSink::new(config, transport.clone(), diagnostics.clone()));

        let (layer, worker) =
            DispatchWorker::spawn(sink, Severity::Error, 16, diagnostics.clone()).unwrap();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "starting");
            for i in 0..5 {
                tracing::error!(target: "app", "failure {}", i);
            }
        });

        worker.shutdown().unwrap();

        let mut texts: Vec<String> = transport.sent().into_iter().map(|m| m.text).collect();
        texts.sort();
        assert_eq!(
            texts,
            (0..5).map(|i| format!("failure {}", i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_panicking_sink_does_not_stop_worker() {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let (layer, worker) = DispatchWorker::spawn(
            Arc::new(PanickingSink),
            Severity::Error,
            4,
            diagnostics.clone(),
        )
        .unwrap();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "app", "one");
            tracing::error!(target: "app", "two");
        });

        worker.shutdown().unwrap();
        assert_eq!(diagnostics.dropped.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_events_after_shutdown_are_reported() {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let transport = Arc::new(RecordingTransport::default());
        let config = AlertConfig::new("Ops", vec![RecipientId::new(1)], Severity::Error).unwrap();
        let sink = Arc::new(AlertSink::new(config, transport.clone(), diagnostics.clone()));
        let (layer, worker) =
            DispatchWorker::spawn(sink, Severity::Error, 4, diagnostics.clone()).unwrap();
        worker.shutdown().unwrap();

        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "app", "too late");
        });

        assert!(transport.sent().is_empty());
        assert_eq!(*diagnostics.dropped.lock().unwrap(), vec!["too late".to_string()]);
    }
}
