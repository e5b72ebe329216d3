//! Runner configuration
//!
//! Settings for a suite run, loaded from `runner.yaml`. Every field is
//! optional:
//!
//! ```yaml
//! job_timeout: 60000      # milliseconds
//! max_parallel: 4
//! ordering: chained       # independent | chained
//!
//! notification:
//!   type: webhook         # log | webhook | none
//!   url: https://hooks.example.com/ci
//!   headers:
//!     X-Token: secret
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::compiler::CaseOrdering;
use super::loader::LoadError;
use crate::engine::{
    ExecutorOptions, LogNotifier, NoopNotifier, Notifier, NotifyError, WebhookNotifier,
};

/// Where failure notifications go
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationConfig {
    #[default]
    Log,
    Webhook {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
        /// Request timeout in milliseconds
        #[serde(default = "default_webhook_timeout")]
        timeout: u64,
    },
    None,
}

fn default_webhook_timeout() -> u64 {
    10_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Default job timeout in milliseconds
    #[serde(default)]
    pub job_timeout: Option<u64>,

    /// Bound on concurrently running jobs in parallel stages
    #[serde(default)]
    pub max_parallel: Option<usize>,

    #[serde(default)]
    pub ordering: CaseOrdering,

    #[serde(default)]
    pub notification: NotificationConfig,
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: RunnerConfig =
            serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
                file: path.display().to_string(),
                error: e,
            })?;
        Ok(config)
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            default_timeout: self.job_timeout.map(Duration::from_millis),
            max_parallel: self.max_parallel,
        }
    }

    /// Build the configured notification channel
    pub fn notifier(&self) -> Result<Arc<dyn Notifier>, NotifyError> {
        Ok(match &self.notification {
            NotificationConfig::Log => Arc::new(LogNotifier),
            NotificationConfig::None => Arc::new(NoopNotifier),
            NotificationConfig::Webhook {
                url,
                headers,
                timeout,
            } => {
                let mut notifier =
                    WebhookNotifier::with_timeout(url.as_str(), Duration::from_millis(*timeout))?;
                for (key, value) in headers {
                    notifier = notifier.header(key.as_str(), value.as_str());
                }
                Arc::new(notifier)
            }
        })
    }
}
