//! Application configuration loaded from environment variables.

use orchestrator::{OrchestratorConfig, ReconcilerConfig};

/// Server and orchestration configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `POLL_INTERVAL_MS` — delay before the first settlement poll (default: `2000`)
/// - `MAX_POLLS` — settlement polls per attempt (default: `30`)
/// - `PAYMENT_TIMEOUT_SECS` — wall-clock poll budget and the reconciler's
///   stuck-booking threshold (default: `120`)
/// - `RECONCILE_INTERVAL_SECS` — reconciliation pass interval (default: `30`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    pub payment_timeout_secs: u64,
    pub reconcile_interval_secs: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", 2000),
            max_polls: env_parse("MAX_POLLS", 30),
            payment_timeout_secs: env_parse("PAYMENT_TIMEOUT_SECS", 120),
            reconcile_interval_secs: env_parse("RECONCILE_INTERVAL_SECS", 30),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the orchestrator tunables derived from this config.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            poll_interval: std::time::Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
            poll_budget: std::time::Duration::from_secs(self.payment_timeout_secs),
            ..OrchestratorConfig::default()
        }
    }

    /// Returns the reconciler tunables derived from this config.
    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            interval: std::time::Duration::from_secs(self.reconcile_interval_secs),
            payment_timeout: chrono::Duration::seconds(self.payment_timeout_secs as i64),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            poll_interval_ms: 2000,
            max_polls: 30,
            payment_timeout_secs: 120,
            reconcile_interval_secs: 30,
        }
    }
}
