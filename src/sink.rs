//! The alert sink decides, per log event, whether an SMS goes out.

use crate::config::AlertConfig;
use crate::core::{Diagnostics, LogEvent, LogSink, MessagingTransport};
use crate::formatting::shape_message;
use std::sync::Arc;

/// Filters events by severity and dispatches qualifying ones as SMS alerts.
///
/// The sink holds no mutable state, so `handle` can be called from any
/// number of threads at once. Dispatch failures never escape `handle`; they
/// are reported to the [`Diagnostics`] channel and the event is dropped.
#[derive(Clone)]
pub struct AlertSink {
    config: AlertConfig,
    transport: Arc<dyn MessagingTransport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for AlertSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertSink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AlertSink {
    pub fn new(
        config: AlertConfig,
        transport: Arc<dyn MessagingTransport>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            config,
            transport,
            diagnostics,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}

impl LogSink for AlertSink {
    fn handle(&self, event: &LogEvent) {
        if event.severity < self.config.threshold() {
            return;
        }

        let text = shape_message(&event.message);
        match self
            .transport
            .send(self.config.originator(), &text, self.config.recipients())
        {
            Ok(()) => self
                .diagnostics
                .dispatched(event, self.config.recipients().len()),
            Err(e) => self.diagnostics.dispatch_failed(event, &e),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{RecordingDiagnostics, RecordingTransport};
    use super::*;
    use crate::core::{DispatchError, RecipientId, Severity};

    fn alert_config(threshold: Severity) -> AlertConfig {
        AlertConfig::new(
            "OpsTeam",
            vec![RecipientId::new(31600000000), RecipientId::new(31611111111)],
            threshold,
        )
        .unwrap()
    }

    fn sink_with(
        transport: RecordingTransport,
        threshold: Severity,
    ) -> (AlertSink, Arc<RecordingTransport>, Arc<RecordingDiagnostics>) {
        let transport = Arc::new(transport);
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let sink = AlertSink::new(alert_config(threshold), transport.clone(), diagnostics.clone());
        (sink, transport, diagnostics)
    }

    #[test]
    fn test_events_below_threshold_are_ignored() {
        let (sink, transport, diagnostics) = sink_with(RecordingTransport::default(), Severity::Error);

        for severity in [Severity::Debug, Severity::Info, Severity::Warn] {
            sink.handle(&LogEvent::new(severity, "not important"));
        }

        assert!(transport.sent().is_empty());
        assert!(diagnostics.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_qualifying_event_is_sent_once_to_configured_recipients() {
        let (sink, transport, diagnostics) = sink_with(RecordingTransport::default(), Severity::Error);

        sink.handle(&LogEvent::new(Severity::Error, "database unreachable"));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sender, "OpsTeam");
        assert_eq!(sent[0].text, "database unreachable");
        assert_eq!(
            sent[0].recipients,
            vec![RecipientId::new(31600000000), RecipientId::new(31611111111)]
        );
        assert_eq!(diagnostics.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_fatal_events_qualify() {
        let (sink, transport, _) = sink_with(RecordingTransport::default(), Severity::Error);
        sink.handle(&LogEvent::new(Severity::Fatal, "out of memory"));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_lower_threshold_lets_warnings_through() {
        let (sink, transport, _) = sink_with(RecordingTransport::default(), Severity::Warn);
        sink.handle(&LogEvent::new(Severity::Info, "noise"));
        sink.handle(&LogEvent::new(Severity::Warn, "disk at 90%"));
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "disk at 90%");
    }

    #[test]
    fn test_long_message_gets_marker_without_truncation() {
        let (sink, transport, _) = sink_with(RecordingTransport::default(), Severity::Error);
        sink.handle(&LogEvent::new(Severity::Error, "A".repeat(200)));
        assert_eq!(transport.sent()[0].text, format!("{}...", "A".repeat(200)));
    }

    #[test]
    fn test_authentication_failure_is_contained() {
        let (sink, transport, diagnostics) = sink_with(
            RecordingTransport::failing(DispatchError::Authentication("bad key".into())),
            Severity::Error,
        );

        sink.handle(&LogEvent::new(Severity::Error, "boom"));

        assert_eq!(transport.sent().len(), 1, "no retry is attempted");
        assert_eq!(
            *diagnostics.failures.lock().unwrap(),
            vec![DispatchError::Authentication("bad key".into())]
        );
    }

    #[test]
    fn test_transport_failure_is_contained() {
        let (sink, transport, diagnostics) = sink_with(
            RecordingTransport::failing(DispatchError::Transport("timed out".into())),
            Severity::Error,
        );

        sink.handle(&LogEvent::new(Severity::Error, "boom"));

        assert_eq!(transport.sent().len(), 1);
        assert_eq!(diagnostics.failures.lock().unwrap().len(), 1);
        assert!(diagnostics.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handle_is_safe_across_threads() {
        let (sink, transport, _) = sink_with(RecordingTransport::default(), Severity::Error);
        let sink = Arc::new(sink);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = sink.clone();
                std::thread::spawn(move || sink.handle(&LogEvent::new(Severity::Error, format!("event {}", i))))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(transport.sent().len(), 8);
    }
}
