//! Bridges `tracing` events into the alert pipeline.
//!
//! `AlertLayer` is registered alongside the console layer. For every event at
//! or above the threshold it builds a [`LogEvent`] and hands it to the
//! dispatch worker without blocking the call site.

use crate::core::{Diagnostics, LogEvent, Severity};
use async_channel::{Sender, TrySendError};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Targets whose events are never turned into alerts: the dispatch path
/// itself and the HTTP stack underneath the provider client.
const DISPATCH_TARGETS: &[&str] = &[
    concat!(env!("CARGO_CRATE_NAME"), "::notification"),
    "reqwest",
    "hyper",
    "hyper_util",
];

fn is_dispatch_path(target: &str) -> bool {
    DISPATCH_TARGETS.iter().any(|prefix| {
        target
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// A `tracing_subscriber` layer that queues qualifying events for SMS dispatch.
pub struct AlertLayer {
    queue: Sender<LogEvent>,
    threshold: Severity,
    diagnostics: Arc<dyn Diagnostics>,
}

impl AlertLayer {
    pub(crate) fn new(
        queue: Sender<LogEvent>,
        threshold: Severity,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            queue,
            threshold,
            diagnostics,
        }
    }
}

impl<S: Subscriber> Layer<S> for AlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = Severity::from(metadata.level());
        if severity < self.threshold {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Events bridged from the `log` crate carry their real target as a field.
        let target = visitor
            .log_target
            .take()
            .unwrap_or_else(|| metadata.target().to_string());
        if is_dispatch_path(&target) {
            return;
        }

        let log_event = LogEvent {
            severity,
            message: visitor.finish(),
            target,
            timestamp: Utc::now(),
        };

        if let Err(e) = self.queue.try_send(log_event) {
            let reason = match &e {
                TrySendError::Full(_) => "alert queue is full",
                TrySendError::Closed(_) => "alert dispatcher has shut down",
            };
            self.diagnostics.alert_dropped(&e.into_inner(), reason);
        }
    }
}

/// Collects the `message` field plus any structured fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
    log_target: Option<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut parts = Vec::with_capacity(self.fields.len() + 1);
        if let Some(message) = self.message {
            parts.push(message);
        }
        parts.extend(self.fields);
        parts.join(" ")
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "log.target" => self.log_target = Some(value.to_string()),
            name if name.starts_with("log.") => {}
            name => self.fields.push(format!("{}={}", name, value)),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            name if name.starts_with("log.") => {}
            name => self.fields.push(format!("{}={:?}", name, value)),
        }
    }
}
