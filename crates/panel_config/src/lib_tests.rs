//! Tests for configuration loading.

use super::*;
use secrecy::ExposeSecret;
use serial_test::serial;
use std::collections::HashMap;

fn snapshot_from(vars: &[(&str, &str)]) -> Result<ConfigurationSnapshot, ConfigurationError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigurationSnapshot::from_lookup(|name| vars.get(name).cloned())
}

fn minimal() -> Vec<(&'static str, &'static str)> {
    vec![
        (PANEL_URL_VAR, "https://panel.example.com"),
        (CLIENT_API_KEY_VAR, "ptlc_abcdef"),
    ]
}

#[test]
fn test_minimal_configuration_uses_defaults() {
    let config = snapshot_from(&minimal()).unwrap();

    assert_eq!(config.panel_url().as_str(), "https://panel.example.com/");
    assert_eq!(config.client_api_key().expose_secret(), "ptlc_abcdef");
    assert!(config.application_api_key().is_none());
    assert!(!config.safe_mode());
    assert!(!config.skip_destructive());
    assert_eq!(config.request_timeout(), Duration::from_millis(30_000));
    assert_eq!(config.retry_attempts(), 2);
    assert!(!config.verbose());
    assert_eq!(config.test_mode(), TestMode::Full);
}

#[test]
fn test_missing_both_required_variables_names_both() {
    let err = snapshot_from(&[]).unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::MissingVariables {
            names: vec![PANEL_URL_VAR.to_string(), CLIENT_API_KEY_VAR.to_string()],
        }
    );
}

#[test]
fn test_blank_value_counts_as_missing() {
    let err = snapshot_from(&[
        (PANEL_URL_VAR, "https://panel.example.com"),
        (CLIENT_API_KEY_VAR, "   "),
    ])
    .unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::MissingVariables {
            names: vec![CLIENT_API_KEY_VAR.to_string()],
        }
    );
}

#[test]
fn test_non_http_scheme_is_rejected() {
    let err = snapshot_from(&[
        (PANEL_URL_VAR, "ftp://panel.example.com"),
        (CLIENT_API_KEY_VAR, "ptlc_abcdef"),
    ])
    .unwrap_err();

    assert!(matches!(
        err,
        ConfigurationError::UnsupportedScheme { ref scheme, .. } if scheme == "ftp"
    ));
}

#[test]
fn test_relative_url_is_rejected() {
    let err = snapshot_from(&[
        (PANEL_URL_VAR, "panel.example.com"),
        (CLIENT_API_KEY_VAR, "ptlc_abcdef"),
    ])
    .unwrap_err();

    assert!(matches!(err, ConfigurationError::InvalidPanelUrl { .. }));
}

#[test]
fn test_client_key_prefix_is_enforced() {
    let err = snapshot_from(&[
        (PANEL_URL_VAR, "http://localhost:8080"),
        (CLIENT_API_KEY_VAR, "ptla_wrongscope"),
    ])
    .unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::InvalidCredentialPrefix {
            variable: CLIENT_API_KEY_VAR.to_string(),
            prefix: CLIENT_KEY_PREFIX.to_string(),
        }
    );
}

#[test]
fn test_application_key_prefix_is_enforced_when_present() {
    let mut vars = minimal();
    vars.push((APPLICATION_API_KEY_VAR, "ptlc_notadmin"));

    let err = snapshot_from(&vars).unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::InvalidCredentialPrefix {
            variable: APPLICATION_API_KEY_VAR.to_string(),
            prefix: APPLICATION_KEY_PREFIX.to_string(),
        }
    );
}

#[test]
fn test_application_key_is_loaded() {
    let mut vars = minimal();
    vars.push((APPLICATION_API_KEY_VAR, "ptla_admin"));

    let config = snapshot_from(&vars).unwrap();

    assert_eq!(
        config.application_api_key().map(|k| k.expose_secret().to_string()),
        Some("ptla_admin".to_string())
    );
    assert!(!config.should_skip(TestCategory::Application));
}

#[test]
fn test_demo_mode_implies_safe_and_skip_destructive() {
    let mut vars = minimal();
    vars.push((DEMO_MODE_VAR, "true"));

    let config = snapshot_from(&vars).unwrap();

    assert!(config.safe_mode());
    assert!(config.skip_destructive());
    assert_eq!(config.test_mode(), TestMode::Safe);
}

#[test]
fn test_skip_destructive_gives_partial_mode() {
    let mut vars = minimal();
    vars.push((SKIP_DESTRUCTIVE_VAR, "TRUE"));

    let config = snapshot_from(&vars).unwrap();

    assert_eq!(config.test_mode(), TestMode::Partial);
    assert!(config.should_skip(TestCategory::Destructive));
    assert!(!config.should_skip(TestCategory::WebSocket));
}

#[test]
fn test_flag_values_other_than_truthy_are_false() {
    let mut vars = minimal();
    vars.push((SAFE_MODE_VAR, "no"));
    vars.push((VERBOSE_VAR, "0"));

    let config = snapshot_from(&vars).unwrap();

    assert!(!config.safe_mode());
    assert!(!config.verbose());
}

#[test]
fn test_should_skip_in_safe_mode() {
    let mut vars = minimal();
    vars.push((SAFE_MODE_VAR, "true"));

    let config = snapshot_from(&vars).unwrap();

    assert!(config.should_skip(TestCategory::Destructive));
    assert!(config.should_skip(TestCategory::WebSocket));
    assert!(config.should_skip(TestCategory::Application));
}

#[test]
fn test_numeric_settings_are_parsed() {
    let mut vars = minimal();
    vars.push((TEST_TIMEOUT_VAR, "5000"));
    vars.push((RETRY_ATTEMPTS_VAR, "4"));

    let config = snapshot_from(&vars).unwrap();

    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.retry_attempts(), 4);
}

#[test]
fn test_invalid_timeout_is_rejected() {
    let mut vars = minimal();
    vars.push((TEST_TIMEOUT_VAR, "thirty"));

    let err = snapshot_from(&vars).unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::InvalidNumber {
            variable: TEST_TIMEOUT_VAR.to_string(),
            value: "thirty".to_string(),
        }
    );
}

#[test]
fn test_fixture_identifiers_are_optional() {
    let mut vars = minimal();
    vars.push((TEST_SERVER_ID_VAR, "1a7ce997"));
    vars.push((TEST_USER_EMAIL_VAR, "admin@example.com"));

    let config = snapshot_from(&vars).unwrap();

    assert_eq!(config.test_server_id(), Some("1a7ce997"));
    assert_eq!(config.test_user_id(), None);
    assert_eq!(config.test_user_email(), Some("admin@example.com"));
}

#[test]
fn test_debug_output_hides_credentials() {
    let mut vars = minimal();
    vars.push((APPLICATION_API_KEY_VAR, "ptla_supersecret"));

    let config = snapshot_from(&vars).unwrap();
    let debug = format!("{config:?}");

    assert!(!debug.contains("ptlc_abcdef"));
    assert!(!debug.contains("ptla_supersecret"));
}

#[test]
fn test_mode_display() {
    assert_eq!(TestMode::Safe.to_string(), "SAFE");
    assert_eq!(TestMode::Partial.to_string(), "PARTIAL");
    assert_eq!(TestMode::Full.to_string(), "FULL");
}

#[test]
#[serial]
fn test_load_reads_process_environment() {
    unsafe {
        std::env::set_var(PANEL_URL_VAR, "https://env.example.com");
        std::env::set_var(CLIENT_API_KEY_VAR, "ptlc_fromenv");
        std::env::set_var(SAFE_MODE_VAR, "true");
    }

    let result = ConfigurationSnapshot::load();

    unsafe {
        std::env::remove_var(PANEL_URL_VAR);
        std::env::remove_var(CLIENT_API_KEY_VAR);
        std::env::remove_var(SAFE_MODE_VAR);
    }

    let config = result.unwrap();
    assert_eq!(config.panel_url().host_str(), Some("env.example.com"));
    assert!(config.safe_mode());
}
