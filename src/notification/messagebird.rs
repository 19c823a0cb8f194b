//! A client for sending SMS alerts through the MessageBird REST API.

use crate::core::{DispatchError, DispatchResult, MessagingTransport, RecipientId};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// The request body for `POST /messages`.
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    originator: &'a str,
    body: &'a str,
    recipients: &'a [RecipientId],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    description: String,
}

/// A blocking MessageBird client.
///
/// Every call is bounded by the configured timeout. Must not be called from
/// inside an async context; the dispatch worker runs it on its own thread.
pub struct MessageBirdTransport {
    client: reqwest::blocking::Client,
    messages_url: String,
    access_key: String,
}

impl std::fmt::Debug for MessageBirdTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBirdTransport")
            .field("messages_url", &self.messages_url)
            .finish_non_exhaustive()
    }
}

impl MessageBirdTransport {
    /// Creates a new `MessageBirdTransport`.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the API, e.g. `https://rest.messagebird.com`.
    /// * `access_key` - The account's access key.
    /// * `timeout` - Upper bound for one request, connect included.
    pub fn new(endpoint: &str, access_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            messages_url: format!("{}/messages", endpoint.trim_end_matches('/')),
            access_key: access_key.to_string(),
        })
    }

    /// Turns a non-success response into the matching failure.
    fn classify(status: StatusCode, body: &str) -> DispatchError {
        let cause = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed
                .errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{} (code {})", e.description, code),
                    None => e.description.clone(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            _ if body.is_empty() => "no response body".to_string(),
            _ => body.to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DispatchError::Authentication(format!("status {}: {}", status, cause))
            }
            _ => DispatchError::Transport(format!("status {}: {}", status, cause)),
        }
    }
}

impl MessagingTransport for MessageBirdTransport {
    #[instrument(skip(self, text, recipients), fields(recipient_count = recipients.len()))]
    fn send(&self, sender: &str, text: &str, recipients: &[RecipientId]) -> DispatchResult {
        let payload = MessageRequest {
            originator: sender,
            body: text,
            recipients,
        };

        let response = self
            .client
            .post(&self.messages_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("AccessKey {}", self.access_key),
            )
            .json(&payload)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Transport(format!("request timed out: {}", e))
                } else {
                    DispatchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Message accepted by provider.");
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(Self::classify(status, &body))
    }
}
