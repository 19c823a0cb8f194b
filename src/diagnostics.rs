//! The out-of-band reporting channel for the alert pipeline.
//!
//! Dispatch failures are written straight to stderr instead of through
//! `tracing`, so a provider outage cannot feed back into the alert layer.

use crate::core::{Diagnostics, DispatchError, LogEvent};
use std::io::Write;

/// Writes dispatch outcomes to stderr and updates the alert counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

impl StderrDiagnostics {
    fn write_line(line: std::fmt::Arguments<'_>) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // Nothing sensible to do if stderr itself is gone.
        let _ = writeln!(handle, "{}", line);
    }
}

impl Diagnostics for StderrDiagnostics {
    fn dispatched(&self, _event: &LogEvent, _recipients: usize) {
        metrics::counter!("sms_alerts_sent_total").increment(1);
    }

    fn dispatch_failed(&self, event: &LogEvent, error: &DispatchError) {
        metrics::counter!("sms_alerts_failed_total", "kind" => error.kind()).increment(1);
        Self::write_line(format_args!(
            "{} [sms-alerter] failed to deliver {} alert from '{}': {}",
            chrono::Utc::now().to_rfc3339(),
            event.severity,
            event.target,
            error
        ));
    }

    fn alert_dropped(&self, event: &LogEvent, reason: &str) {
        metrics::counter!("sms_alerts_dropped_total").increment(1);
        Self::write_line(format_args!(
            "{} [sms-alerter] dropped {} alert from '{}': {}",
            chrono::Utc::now().to_rfc3339(),
            event.severity,
            event.target,
            reason
        ));
    }
}
