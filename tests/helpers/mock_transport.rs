//! Fakes for the transport, sink and diagnostics seams.

use sms_alerter::core::{
    Diagnostics, DispatchError, DispatchResult, LogEvent, LogSink, MessagingTransport, RecipientId,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub sender: String,
    pub text: String,
    pub recipients: Vec<RecipientId>,
}

/// Records every send and answers with a fixed result.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub sent: Arc<Mutex<Vec<SentMessage>>>,
    pub failure: Option<DispatchError>,
}

impl MockTransport {
    pub fn failing(error: DispatchError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    pub fn get_sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessagingTransport for MockTransport {
    fn send(&self, sender: &str, text: &str, recipients: &[RecipientId]) -> DispatchResult {
        self.sent.lock().unwrap().push(SentMessage {
            sender: sender.to_string(),
            text: text.to_string(),
            recipients: recipients.to_vec(),
        });
        self.failure.clone().map_or(Ok(()), Err)
    }
}

/// A sink that only remembers what it was handed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<LogEvent>>>,
}

impl RecordingSink {
    pub fn get_events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn handle(&self, event: &LogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Clone, Default)]
pub struct MockDiagnostics {
    pub delivered: Arc<Mutex<usize>>,
    pub failures: Arc<Mutex<Vec<DispatchError>>>,
    pub dropped: Arc<Mutex<Vec<String>>>,
}

impl Diagnostics for MockDiagnostics {
    fn dispatched(&self, _event: &LogEvent, _recipients: usize) {
        *self.delivered.lock().unwrap() += 1;
    }

    fn dispatch_failed(&self, _event: &LogEvent, error: &DispatchError) {
        self.failures.lock().unwrap().push(error.clone());
    }

    fn alert_dropped(&self, _event: &LogEvent, reason: &str) {
        self.dropped.lock().unwrap().push(reason.to_string());
    }
}
