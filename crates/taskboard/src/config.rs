//! Client configuration.
//!
//! Defaults match a local development backend. Override in code with the
//! `with_*` methods, or from the environment with
//! [`ClientConfig::from_env`]:
//!
//! | Variable               | Meaning                        | Default                     |
//! |------------------------|--------------------------------|-----------------------------|
//! | `TASKBOARD_API_URL`    | API base URL                   | `http://localhost:5000/api` |
//! | `TASKBOARD_TIMEOUT_MS` | Default request timeout (ms)   | `10000`                     |
//! | `TASKBOARD_TOKEN_FILE` | Where to persist the token     | memory only                 |

use std::path::PathBuf;
use std::time::Duration;

use taskboard_dispatch::{DispatchConfig, RetryPolicy};
use taskboard_refresh::RefreshConfig;

use crate::TaskboardError;

pub const ENV_API_URL: &str = "TASKBOARD_API_URL";
pub const ENV_TIMEOUT_MS: &str = "TASKBOARD_TIMEOUT_MS";
pub const ENV_TOKEN_FILE: &str = "TASKBOARD_TOKEN_FILE";

/// Everything the client needs to know before it sends a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub refresh: RefreshConfig,
    /// Persist the token here. `None` keeps it in memory only.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DispatchConfig::DEFAULT_BASE_URL.to_string(),
            timeout: DispatchConfig::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            refresh: RefreshConfig::default(),
            token_file: None,
        }
    }
}

impl ClientConfig {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    /// `TaskboardError::Config` when `TASKBOARD_TIMEOUT_MS` is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, TaskboardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TaskboardError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                TaskboardError::Config(format!("{ENV_TIMEOUT_MS}={raw:?} is not a number"))
            })?;
            if ms == 0 {
                return Err(TaskboardError::Config(format!(
                    "{ENV_TIMEOUT_MS} must be greater than zero"
                )));
            }
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE).filter(|v| !v.trim().is_empty()) {
            config.token_file = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshConfig) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Checks the settings that would otherwise only fail on first use.
    pub fn validate(&self) -> Result<(), TaskboardError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(TaskboardError::Config(format!(
                "base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(TaskboardError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }

    pub(crate) fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            base_url: self.base_url.clone(),
            default_timeout: self.timeout,
            retry: self.retry,
        }
    }
}
