//! Failure notifications
//!
//! The executor hands every failed job to a [`Notifier`]. Delivery is fire
//! and forget: errors are logged by the executor and never change the job's
//! recorded result.
//!
//! Implementations:
//! - `LogNotifier` - emits the alert through `tracing`
//! - `WebhookNotifier` - POSTs a JSON payload to an HTTP endpoint
//! - `NoopNotifier` - discards alerts

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use crate::engine::result::JobResult;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Delivers a human-readable alert through some external channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Subject line for a failed job
pub fn failure_subject(result: &JobResult) -> String {
    format!("Job Failure Notification: {}", result.job_name)
}

/// Alert body listing the job name, command and captured output
pub fn failure_body(result: &JobResult) -> String {
    let mut body = format!("The job '{}' has failed.\n\n", result.job_name);
    body.push_str(&format!("Command: {}\n", result.command));
    if let Some(failure) = &result.failure {
        body.push_str(&format!("Reason: {}\n", failure));
    }
    body.push_str(&format!("\nStandard Output:\n{}\n", result.stdout.trim_end()));
    body.push_str(&format!("\nStandard Error:\n{}\n", result.stderr.trim_end()));
    body
}

/// Writes alerts to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        error!(subject = %subject, "{}", body);
        Ok(())
    }
}

/// Drops alerts
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, subject: &str, _body: &str) -> Result<(), NotifyError> {
        debug!(subject = %subject, "Notification discarded");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
}

/// POSTs `{"subject": ..., "body": ...}` to a URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    headers: HashMap<String, String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_timeout(url, Duration::from_secs(10))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            headers: HashMap::new(),
        })
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { subject, body });
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(url = %self.url, "Notification delivered");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
