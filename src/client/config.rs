//! Client configuration: API base URL and request timeout. Values are public;
//! tokens live in [`super::TokenStore`], never here.

use std::{env::var, time::Duration};

/// Default request timeout applied by [`super::ApiClient`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_BASE_URL: &str = "NAGLASUPAN_API_BASE_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "NAGLASUPAN_API_TIMEOUT_SECS";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the base URL and timeout from the environment. A missing base URL
    /// stays empty and is rejected by [`super::ApiClient::new`]; a missing or
    /// invalid timeout falls back to [`DEFAULT_TIMEOUT`].
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = var(ENV_API_BASE_URL)
            .ok()
            .and_then(|value| normalize_value(&value))
            .unwrap_or_default();
        let timeout = var(ENV_API_TIMEOUT_SECS)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Self { base_url, timeout }
    }

    /// Joins the base URL and a request path with exactly one slash between them.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        let path = path.trim();

        if base.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_with_single_slash() {
        let config = ClientConfig::new("https://api.naglasupan.is/");
        assert_eq!(
            config.url_for("/api/auth/me"),
            "https://api.naglasupan.is/api/auth/me"
        );
        assert_eq!(
            config.url_for("api/auth/me"),
            "https://api.naglasupan.is/api/auth/me"
        );
    }

    #[test]
    fn url_for_without_base_returns_path() {
        let config = ClientConfig::new("  ");
        assert_eq!(config.url_for("/api/auth/me"), "/api/auth/me");
    }

    #[test]
    fn from_env_reads_values() {
        temp_env::with_vars(
            [
                (ENV_API_BASE_URL, Some("  https://api.naglasupan.is ")),
                (ENV_API_TIMEOUT_SECS, Some("3")),
            ],
            || {
                let config = ClientConfig::from_env();
                assert_eq!(config.base_url, "https://api.naglasupan.is");
                assert_eq!(config.timeout, Duration::from_secs(3));
            },
        );
    }

    #[test]
    fn from_env_ignores_invalid_timeout() {
        temp_env::with_vars(
            [
                (ENV_API_BASE_URL, None::<&str>),
                (ENV_API_TIMEOUT_SECS, Some("soon")),
            ],
            || {
                let config = ClientConfig::from_env();
                assert_eq!(config.base_url, "");
                assert_eq!(config.timeout, DEFAULT_TIMEOUT);
            },
        );
    }
}
