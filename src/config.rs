//! Datagrid launcher configuration.
//!
//! Backend location, readiness-poll timing and the node types the query tool
//! refuses. Values come from `Default`, can be overridden from the
//! environment with [`DataGridConfig::from_env`], or deserialized from any
//! serde source the embedding application already uses.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::node::DEFAULT_UNSUPPORTED_QUERY_TYPES;

/// Configuration for the datagrid launcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataGridConfig {
    /// Root URL of the backend; datagrid endpoints live under `datagrid/`.
    pub base_url: String,

    /// Interval between frame-readiness checks (milliseconds).
    pub poll_interval_ms: u64,

    /// Give up waiting for a panel's frame after this long (milliseconds).
    pub frame_ready_timeout_ms: u64,

    /// Per-request timeout for backend calls (milliseconds).
    pub request_timeout_ms: u64,

    /// Delay before the filter editor takes focus (milliseconds).
    pub filter_focus_delay_ms: u64,

    /// Prefix for generated panel titles ("Data Grid 1", "Data Grid 2", ...).
    pub panel_title_prefix: String,

    /// Node types on which the query tool is never offered.
    pub unsupported_query_types: Vec<String>,
}

impl Default for DataGridConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5050".to_string(),
            poll_interval_ms: 100,
            frame_ready_timeout_ms: 30_000,
            request_timeout_ms: 30_000,
            filter_focus_delay_ms: 500,
            panel_title_prefix: "Data Grid".to_string(),
            unsupported_query_types: DEFAULT_UNSUPPORTED_QUERY_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl DataGridConfig {
    /// Defaults overridden by `DATAGRID_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DATAGRID_BASE_URL") {
            config.base_url = url;
        }
        config.poll_interval_ms = env_millis("DATAGRID_POLL_INTERVAL_MS", config.poll_interval_ms);
        config.frame_ready_timeout_ms = env_millis(
            "DATAGRID_FRAME_READY_TIMEOUT_MS",
            config.frame_ready_timeout_ms,
        );
        config.request_timeout_ms =
            env_millis("DATAGRID_REQUEST_TIMEOUT_MS", config.request_timeout_ms);
        config
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn frame_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_ready_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn filter_focus_delay(&self) -> Duration {
        Duration::from_millis(self.filter_focus_delay_ms)
    }

    /// Set the backend root URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the readiness poll interval and timeout.
    pub fn polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self.frame_ready_timeout_ms = timeout.as_millis() as u64;
        self
    }
}

fn env_millis(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring non-numeric duration override");
            default
        }),
        Err(_) => default,
    }
}
