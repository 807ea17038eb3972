//! Connection, retry and timeout settings for a panel client.
//!
//! A [`PanelConfig`] is created once, validated, and then shared read-only
//! (behind an `Arc`) by every call the client makes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the panel base URL.
pub const ENV_BASE_URL: &str = "PANEL_BASE_URL";
/// Environment variable holding the panel API key.
pub const ENV_API_KEY: &str = "PANEL_API_KEY";
/// Environment variable holding the connect timeout in milliseconds.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "PANEL_CONNECT_TIMEOUT_MS";
/// Environment variable holding the read timeout in milliseconds.
pub const ENV_READ_TIMEOUT_MS: &str = "PANEL_READ_TIMEOUT_MS";
/// Environment variable holding the retry count.
pub const ENV_RETRY_COUNT: &str = "PANEL_RETRY_COUNT";
/// Environment variable holding the retry interval in milliseconds.
pub const ENV_RETRY_INTERVAL_MS: &str = "PANEL_RETRY_INTERVAL_MS";
/// Environment variable holding a comma separated list of retryable statuses.
pub const ENV_RETRYABLE_STATUSES: &str = "PANEL_RETRYABLE_STATUSES";
/// Environment variable toggling TLS certificate verification.
pub const ENV_VERIFY_TLS: &str = "PANEL_VERIFY_TLS";

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_interval_ms() -> u64 {
    1_000
}

fn default_retryable_statuses() -> BTreeSet<u16> {
    BTreeSet::from([408, 429, 500, 502, 503, 504])
}

fn default_verify_tls() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("panel/{}", env!("CARGO_PKG_VERSION"))
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

/// Configuration for a panel client.
///
/// Timeouts and retry values are unsigned, so a constructed config can never
/// hold a negative value; the text loaders ([`PanelConfig::from_env`],
/// [`PanelConfig::from_json`]) reject negative input instead.
#[derive(Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Base URL of the panel, e.g. `https://panel.example.com:8888`.
    pub base_url: String,

    /// Shared secret used to sign every request.
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// TCP/TLS connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Read timeout in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Retries after the first attempt; a call makes at most `retry_count + 1` attempts.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed pause between attempts in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// HTTP status codes eligible for automatic retry.
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: BTreeSet<u16>,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Whether to verify the panel's TLS certificate.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// How long `close()` waits for in-flight calls before cancelling them.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            retry_count: default_retry_count(),
            retry_interval_ms: default_retry_interval_ms(),
            retryable_statuses: default_retryable_statuses(),
            headers: BTreeMap::new(),
            verify_tls: default_verify_tls(),
            user_agent: default_user_agent(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("retry_count", &self.retry_count)
            .field("retry_interval_ms", &self.retry_interval_ms)
            .field("retryable_statuses", &self.retryable_statuses)
            .field("headers", &self.headers)
            .field("verify_tls", &self.verify_tls)
            .field("user_agent", &self.user_agent)
            .field("shutdown_grace_ms", &self.shutdown_grace_ms)
            .finish()
    }
}

impl PanelConfig {
    /// Creates a new builder for `PanelConfig`.
    #[must_use]
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Loads and validates a config from a JSON document.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Document`] for malformed JSON or negative
    /// numbers, and any [`validate`](Self::validate) failure.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config from `PANEL_*` environment variables.
    ///
    /// ## Errors
    ///
    /// Returns an error when a variable is malformed or negative, or when the
    /// resulting config does not [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads and validates a config from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = read(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(key) = read(ENV_API_KEY) {
            config.api_key = key;
        }
        if let Some(raw) = read(ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout_ms = parse_non_negative("connect_timeout_ms", &raw)?;
        }
        if let Some(raw) = read(ENV_READ_TIMEOUT_MS) {
            config.read_timeout_ms = parse_non_negative("read_timeout_ms", &raw)?;
        }
        if let Some(raw) = read(ENV_RETRY_COUNT) {
            let count = parse_non_negative("retry_count", &raw)?;
            config.retry_count = u32::try_from(count)
                .map_err(|_| ConfigError::invalid_value("retry_count", raw.clone()))?;
        }
        if let Some(raw) = read(ENV_RETRY_INTERVAL_MS) {
            config.retry_interval_ms = parse_non_negative("retry_interval_ms", &raw)?;
        }
        if let Some(raw) = read(ENV_RETRYABLE_STATUSES) {
            config.retryable_statuses = parse_status_list(&raw)?;
        }
        if let Some(raw) = read(ENV_VERIFY_TLS) {
            config.verify_tls = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::invalid_value("verify_tls", raw)),
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the config without side effects.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::MissingField`] for a blank base URL or credential
    /// - [`ConfigError::InvalidUrl`] when the base URL does not parse
    /// - [`ConfigError::MalformedUrl`] for non-HTTP schemes or a missing host
    /// - [`ConfigError::InvalidHeader`] for an illegal extra header
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::missing_field("api_key"));
        }

        for (name, value) in &self.headers {
            let legal = HeaderName::from_bytes(name.as_bytes()).is_ok()
                && HeaderValue::from_str(value).is_ok();
            if !legal {
                return Err(ConfigError::InvalidHeader { name: name.clone() });
            }
        }

        Ok(())
    }

    /// Returns `true` when [`validate`](Self::validate) passes.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Parses and checks the base URL.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::missing_field("base_url"));
        }

        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::MalformedUrl {
                url: raw.to_string(),
                reason: "scheme must be http or https",
            });
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::MalformedUrl {
                url: raw.to_string(),
                reason: "missing host",
            });
        }

        Ok(url)
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the read timeout as a Duration.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Returns the retry interval as a Duration.
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Returns the shutdown grace period as a Duration.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Total attempts a single call may make.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Returns whether an HTTP status is configured as retryable.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

fn parse_non_negative(field: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| ConfigError::invalid_value(field, raw))?;
    u64::try_from(value).map_err(|_| ConfigError::Negative { field, value })
}

fn parse_status_list(raw: &str) -> Result<BTreeSet<u16>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .ok()
                .filter(|code| (100..=599).contains(code))
                .ok_or_else(|| ConfigError::invalid_value("retryable_statuses", s))
        })
        .collect()
}

/// Builder for `PanelConfig`.
#[derive(Debug, Default)]
pub struct PanelConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    retry_count: Option<u32>,
    retry_interval: Option<Duration>,
    retryable_statuses: Option<BTreeSet<u16>>,
    headers: BTreeMap<String, String>,
    verify_tls: Option<bool>,
    user_agent: Option<String>,
    shutdown_grace: Option<Duration>,
}

impl PanelConfigBuilder {
    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key used for signing.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    /// Replaces the retryable status set.
    #[must_use]
    pub fn retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = Some(statuses.into_iter().collect());
        self
    }

    /// Adds an extra header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Sets how long `close()` waits for in-flight calls.
    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = Some(grace);
        self
    }

    /// Builds the configuration.
    ///
    /// The result is not validated here; clients validate on construction
    /// and [`PanelConfig::validate`] can be called directly.
    #[must_use]
    pub fn build(self) -> PanelConfig {
        let defaults = PanelConfig::default();
        PanelConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            api_key: self.api_key.unwrap_or(defaults.api_key),
            connect_timeout_ms: self
                .connect_timeout
                .map_or(defaults.connect_timeout_ms, duration_ms),
            read_timeout_ms: self
                .read_timeout
                .map_or(defaults.read_timeout_ms, duration_ms),
            retry_count: self.retry_count.unwrap_or(defaults.retry_count),
            retry_interval_ms: self
                .retry_interval
                .map_or(defaults.retry_interval_ms, duration_ms),
            retryable_statuses: self
                .retryable_statuses
                .unwrap_or(defaults.retryable_statuses),
            headers: self.headers,
            verify_tls: self.verify_tls.unwrap_or(defaults.verify_tls),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            shutdown_grace_ms: self
                .shutdown_grace
                .map_or(defaults.shutdown_grace_ms, duration_ms),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> PanelConfig {
        PanelConfig::builder()
            .base_url("https://panel.example.com:8888")
            .api_key("secret")
            .build()
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().is_valid());
    }

    #[test]
    fn test_defaults() {
        let config = valid();
        assert_eq!(config.retry_count, 2);
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.retry_interval(), Duration::from_secs(1));
        assert!(config.is_retryable_status(503));
        assert!(!config.is_retryable_status(404));
        assert!(config.verify_tls);
    }

    #[test]
    fn test_empty_base_url_is_invalid() {
        let config = PanelConfig::builder().api_key("secret").build();
        assert!(!config.is_valid());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field: "base_url" })
        ));
    }

    #[test]
    fn test_unparsable_base_url_is_invalid() {
        let config = PanelConfig::builder()
            .base_url("not a url")
            .api_key("secret")
            .build();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_base_url_is_invalid() {
        let config = PanelConfig::builder()
            .base_url("ftp://panel.example.com")
            .api_key("secret")
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_empty_credential_is_invalid() {
        let config = PanelConfig::builder()
            .base_url("https://panel.example.com")
            .api_key("   ")
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field: "api_key" })
        ));
    }

    #[test]
    fn test_illegal_header_is_invalid() {
        let config = PanelConfig::builder()
            .base_url("https://panel.example.com")
            .api_key("secret")
            .header("bad header", "value")
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_builder_durations() {
        let config = PanelConfig::builder()
            .base_url("http://127.0.0.1:8888")
            .api_key("k")
            .connect_timeout(Duration::from_millis(250))
            .read_timeout(Duration::from_secs(2))
            .retry_interval(Duration::from_millis(50))
            .retry_count(5)
            .retryable_statuses([500])
            .build();
        assert_eq!(config.connect_timeout_ms, 250);
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
        assert_eq!(config.retry_interval_ms, 50);
        assert_eq!(config.max_attempts(), 6);
        assert_eq!(config.retryable_statuses, BTreeSet::from([500]));
    }

    #[test]
    fn test_from_lookup() {
        let config = PanelConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://panel.example.com"),
            (ENV_API_KEY, "secret"),
            (ENV_RETRY_COUNT, "4"),
            (ENV_RETRYABLE_STATUSES, "500, 503"),
            (ENV_VERIFY_TLS, "false"),
        ]))
        .unwrap();
        assert_eq!(config.retry_count, 4);
        assert_eq!(config.retryable_statuses, BTreeSet::from([500, 503]));
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_from_lookup_rejects_negative_timeout() {
        let result = PanelConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://panel.example.com"),
            (ENV_API_KEY, "secret"),
            (ENV_READ_TIMEOUT_MS, "-5"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Negative {
                field: "read_timeout_ms",
                value: -5
            })
        ));
    }

    #[test]
    fn test_from_lookup_rejects_negative_retry_count() {
        let result = PanelConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://panel.example.com"),
            (ENV_API_KEY, "secret"),
            (ENV_RETRY_COUNT, "-1"),
        ]));
        assert!(matches!(result, Err(ConfigError::Negative { .. })));
    }

    #[test]
    fn test_from_lookup_missing_credential() {
        let result = PanelConfig::from_lookup(lookup(&[(ENV_BASE_URL, "https://panel.example.com")]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingField { field: "api_key" })
        ));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = PanelConfig::from_json(
            r#"{"base_url": "https://panel.example.com", "api_key": "secret", "retry_count": 1}"#,
        )
        .unwrap();
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.read_timeout_ms, 30_000);
    }

    #[test]
    fn test_from_json_rejects_negative() {
        let result = PanelConfig::from_json(
            r#"{"base_url": "https://panel.example.com", "api_key": "secret", "connect_timeout_ms": -1}"#,
        );
        assert!(matches!(result, Err(ConfigError::Document(_))));
    }

    #[test]
    fn test_api_key_is_never_serialized_or_printed() {
        let config = valid();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(!format!("{config:?}").contains("secret"));
    }
}
