//! Core domain types and service traits for the SMS alerter
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern how log events flow from the logging framework, through the
//! alert sink, and out to the messaging provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The severity of a log event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    #[default]
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known severity.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown severity '{0}' (expected one of debug, info, warn, error, fatal)")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = UnknownSeverity;

    fn try_from(value: String) -> Result<Self, UnknownSeverity> {
        value.parse()
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_ascii_lowercase()
    }
}

impl From<&tracing::Level> for Severity {
    /// `tracing` has no fatal level; TRACE folds into `Debug`.
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

/// A single log event as seen by the alert sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
    /// The module path or logger name that produced the event.
    pub target: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Creates an event stamped with the current time and an empty target.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            target: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

/// A numeric, phone-number-like SMS destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecipientId(u64);

impl RecipientId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned when a recipient identifier is not a plain run of digits.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid recipient identifier '{0}'")]
pub struct InvalidRecipient(pub String);

impl FromStr for RecipientId {
    type Err = InvalidRecipient;

    /// Parses strictly: an optional leading `+`, then digits only. No
    /// surrounding whitespace, no `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('+').unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidRecipient(s.to_string()));
        }
        digits
            .parse::<u64>()
            .map(RecipientId)
            .map_err(|_| InvalidRecipient(s.to_string()))
    }
}

/// Why a dispatch attempt failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The provider rejected the credential.
    #[error("authentication failure: {0}")]
    Authentication(String),
    /// Network, provider or timeout failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DispatchError {
    /// A short label suitable for a metrics tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Authentication(_) => "authentication",
            DispatchError::Transport(_) => "transport",
        }
    }
}

/// The outcome of a single dispatch attempt.
pub type DispatchResult = Result<(), DispatchError>;

/// A trait for clients that can deliver a text message to a set of recipients.
///
/// Implementations must map every provider-level fault into a
/// [`DispatchError`]; they must not panic into the caller.
pub trait MessagingTransport: Send + Sync {
    fn send(&self, sender: &str, text: &str, recipients: &[RecipientId]) -> DispatchResult;
}

/// A consumer of log events.
pub trait LogSink: Send + Sync {
    fn handle(&self, event: &LogEvent);
}

/// Out-of-band reporting for the alert pipeline.
///
/// Implementations must not route through `tracing`, otherwise a failing
/// provider would produce further alerts.
pub trait Diagnostics: Send + Sync {
    fn dispatched(&self, event: &LogEvent, recipients: usize);
    fn dispatch_failed(&self, event: &LogEvent, error: &DispatchError);
    fn alert_dropped(&self, event: &LogEvent, reason: &str);
}
