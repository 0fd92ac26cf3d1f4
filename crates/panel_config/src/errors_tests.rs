use super::*;
use std::error::Error as StdError;

#[test]
fn test_missing_variables_lists_every_name() {
    let error = ConfigurationError::MissingVariables {
        names: vec!["PTERODACTYL_URL".to_string(), "CLIENT_API_KEY".to_string()],
    };

    assert_eq!(
        error.to_string(),
        "Missing required environment variables: PTERODACTYL_URL, CLIENT_API_KEY. Please check your .env.test file."
    );
    assert!(error.source().is_none());
}

#[test]
fn test_credential_prefix_message() {
    let error = ConfigurationError::InvalidCredentialPrefix {
        variable: "CLIENT_API_KEY".to_string(),
        prefix: "ptlc_".to_string(),
    };

    assert_eq!(error.to_string(), "CLIENT_API_KEY must start with ptlc_");
}

#[test]
fn test_unsupported_scheme_message() {
    let error = ConfigurationError::UnsupportedScheme {
        variable: "PTERODACTYL_URL".to_string(),
        scheme: "ftp".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "PTERODACTYL_URL must start with http:// or https:// (found scheme 'ftp')"
    );
}

#[test]
fn test_env_file_message_includes_path() {
    let error = ConfigurationError::EnvFile {
        path: PathBuf::from("/tmp/.env.test"),
        reason: "line 3: unexpected character".to_string(),
    };

    assert!(error.to_string().contains("/tmp/.env.test"));
    assert!(error.to_string().contains("line 3"));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ConfigurationError>();
}
