//! Environment-variable configuration tests.
//!
//! These mutate process-wide environment state, so every test is serial.

use std::time::Duration;

use panel::config::{
    ENV_API_KEY, ENV_BASE_URL, ENV_CONNECT_TIMEOUT_MS, ENV_READ_TIMEOUT_MS, ENV_RETRYABLE_STATUSES,
    ENV_RETRY_COUNT, ENV_RETRY_INTERVAL_MS, ENV_VERIFY_TLS,
};
use panel::{ConfigError, PanelConfig};
use serial_test::serial;

const ALL_VARS: &[&str] = &[
    ENV_BASE_URL,
    ENV_API_KEY,
    ENV_CONNECT_TIMEOUT_MS,
    ENV_READ_TIMEOUT_MS,
    ENV_RETRY_COUNT,
    ENV_RETRY_INTERVAL_MS,
    ENV_RETRYABLE_STATUSES,
    ENV_VERIFY_TLS,
];

fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
    result
}

#[test]
#[serial]
fn test_loads_complete_config_from_env() {
    let config = with_env(
        &[
            (ENV_BASE_URL, "https://panel.example.com:8888"),
            (ENV_API_KEY, "secret"),
            (ENV_CONNECT_TIMEOUT_MS, "2500"),
            (ENV_RETRY_COUNT, "0"),
            (ENV_RETRY_INTERVAL_MS, "10"),
            (ENV_RETRYABLE_STATUSES, "429, 503"),
            (ENV_VERIFY_TLS, "off"),
        ],
        PanelConfig::from_env,
    )
    .unwrap();

    assert_eq!(config.connect_timeout(), Duration::from_millis(2500));
    assert_eq!(config.max_attempts(), 1);
    assert_eq!(config.retry_interval(), Duration::from_millis(10));
    assert!(!config.verify_tls);
    assert!(config.is_retryable_status(429));
    assert!(!config.is_retryable_status(500));
    assert!(config.is_valid());
}

#[test]
#[serial]
fn test_missing_base_url_is_rejected() {
    let result = with_env(&[(ENV_API_KEY, "secret")], PanelConfig::from_env);
    assert!(matches!(
        result,
        Err(ConfigError::MissingField { field: "base_url" })
    ));
}

#[test]
#[serial]
fn test_negative_retry_interval_is_rejected() {
    let result = with_env(
        &[
            (ENV_BASE_URL, "https://panel.example.com"),
            (ENV_API_KEY, "secret"),
            (ENV_RETRY_INTERVAL_MS, "-100"),
        ],
        PanelConfig::from_env,
    );
    assert!(matches!(
        result,
        Err(ConfigError::Negative {
            field: "retry_interval_ms",
            value: -100
        })
    ));
}

#[test]
#[serial]
fn test_garbage_number_is_rejected() {
    let result = with_env(
        &[
            (ENV_BASE_URL, "https://panel.example.com"),
            (ENV_API_KEY, "secret"),
            (ENV_CONNECT_TIMEOUT_MS, "ten seconds"),
        ],
        PanelConfig::from_env,
    );
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
