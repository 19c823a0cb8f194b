//! Configuration management for the SMS alerter
//!
//! This module defines the raw `Config` struct loaded with `figment` and the
//! validated `AlertConfig` handed to the alert sink. Sources are layered as
//! defaults, an optional TOML file, plain environment variables (`ORIGINATOR`,
//! `API_KEY`, `RECIPIENTS`, ...) and finally command-line flags.

use crate::cli::Cli;
use crate::core::{RecipientId, Severity};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// Environment variables read as typed values by [`Config::load`].
pub const ENV_KEYS: &[&str] = &[
    "THRESHOLD",
    "ENDPOINT",
    "TIMEOUT_SECONDS",
    "QUEUE_CAPACITY",
    "LISTEN_ADDR",
    "LOG_LEVEL",
    "STARTUP_SELF_TEST",
];

/// Environment variables taken byte-for-byte, paired with their config key.
///
/// Figment's env parser would turn `0612345678` into a number and drop the
/// leading zero or `+`, so these bypass it.
pub const VERBATIM_ENV_KEYS: &[(&str, &str)] = &[
    ("ORIGINATOR", "originator"),
    ("API_KEY", "api_key"),
    ("RECIPIENTS", "recipients"),
];

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),
    #[error("missing required configuration key {0}")]
    Missing(&'static str),
    #[error("invalid recipient identifier '{value}' in RECIPIENTS")]
    InvalidRecipient { value: String },
    #[error("RECIPIENTS must contain at least one identifier")]
    NoRecipients,
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Sender identity shown on the SMS.
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub originator: Option<String>,
    /// Provider access key.
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Comma-separated recipient identifiers.
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
    /// Minimum severity that triggers an alert.
    pub threshold: Severity,
    /// Base URL of the messaging provider's REST API.
    pub endpoint: String,
    /// Upper bound on a single provider call.
    pub timeout_seconds: u64,
    /// How many qualifying events may wait for dispatch.
    pub queue_capacity: usize,
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// `tracing_subscriber::EnvFilter` directive for console logging.
    pub log_level: String,
    /// Emit one event per level right after startup.
    pub startup_self_test: bool,
}

impl Config {
    /// Loads the application configuration from all layered sources.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::figment(cli)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Builds the layered figment without extracting it.
    pub fn figment(cli: &Cli) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::raw().only(ENV_KEYS));
        for (var, key) in VERBATIM_ENV_KEYS {
            if let Ok(value) = std::env::var(*var) {
                figment = figment.merge(Serialized::default(*key, value));
            }
        }
        figment.merge(cli.clone())
    }

    /// Returns the provider credential, which must be present and non-blank.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        required(&self.api_key, "API_KEY")
    }

    /// Validates the alert-related settings.
    pub fn alert_config(&self) -> Result<AlertConfig, ConfigError> {
        let originator = required(&self.originator, "ORIGINATOR")?;
        let recipients = parse_recipients(required(&self.recipients, "RECIPIENTS")?)?;
        AlertConfig::new(originator, recipients, self.threshold)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            originator: None,
            api_key: None,
            recipients: None,
            threshold: Severity::Error,
            endpoint: "https://rest.messagebird.com".to_string(),
            timeout_seconds: 10,
            queue_capacity: 64,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4567)),
            log_level: "info".to_string(),
            startup_self_test: false,
        }
    }
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// TOML values written as bare numbers reach us as numbers, not strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
    }))
}

/// Splits a comma-separated list into recipient identifiers, keeping order.
///
/// Items are not trimmed: `"316, 317"` is rejected.
pub fn parse_recipients(raw: &str) -> Result<Vec<RecipientId>, ConfigError> {
    raw.split(',')
        .map(|item| {
            item.parse::<RecipientId>()
                .map_err(|_| ConfigError::InvalidRecipient {
                    value: item.to_string(),
                })
        })
        .collect()
}

/// The immutable settings the alert sink runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    originator: String,
    recipients: Vec<RecipientId>,
    threshold: Severity,
}

impl AlertConfig {
    pub fn new(
        originator: impl Into<String>,
        recipients: Vec<RecipientId>,
        threshold: Severity,
    ) -> Result<Self, ConfigError> {
        let originator = originator.into();
        if originator.trim().is_empty() {
            return Err(ConfigError::Missing("ORIGINATOR"));
        }
        if recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        Ok(Self {
            originator,
            recipients,
            threshold,
        })
    }

    pub fn originator(&self) -> &str {
        &self.originator
    }

    pub fn recipients(&self) -> &[RecipientId] {
        &self.recipients
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }
}
