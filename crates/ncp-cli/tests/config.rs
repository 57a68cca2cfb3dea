use jiff::{SignedDuration, Timestamp};
use serde_json::json;
use tempfile::TempDir;

use ncp_cli::config::{load_config, migrate, redact_token, save_config, CognitoSettings, NcpConfig, StoredSession};
use ncp_core::models::care_plan::FormatType;

fn session(expires_at: Timestamp) -> StoredSession {
    StoredSession {
        email: "nurse@example.com".to_string(),
        id_token: "eyJhbGciOi.payload.signature".to_string(),
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at,
    }
}

#[test]
fn missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();

    let config = load_config(dir.path()).unwrap();

    assert_eq!(config, NcpConfig::default());
    assert_eq!(config.api_url, "http://localhost:8000");
    assert_eq!(config.format(), FormatType::Seven);
}

#[test]
fn save_then_load_keeps_settings() {
    let dir = TempDir::new().unwrap();
    let config = NcpConfig {
        api_url: "https://ncp.example.com".to_string(),
        default_format: 5,
        cognito: Some(CognitoSettings {
            region: "eu-west-1".to_string(),
            user_pool_id: "eu-west-1_abc".to_string(),
            client_id: "client".to_string(),
        }),
        session: Some(session(Timestamp::from_second(1_900_000_000).unwrap())),
        ..NcpConfig::default()
    };

    save_config(dir.path(), &config).unwrap();
    let loaded = load_config(dir.path()).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.format(), FormatType::Five);
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[cfg(unix)]
#[test]
fn saved_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    save_config(dir.path(), &NcpConfig::default()).unwrap();

    let mode = std::fs::metadata(dir.path().join("config.json")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn unversioned_config_is_migrated() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"server": "http://10.0.0.5:8000"}"#,
    )
    .unwrap();

    let config = load_config(dir.path()).unwrap();

    assert_eq!(config.api_url, "http://10.0.0.5:8000");
    assert_eq!(config.default_format, 7);
    assert!(config.session.is_none());
}

#[test]
fn v1_session_without_expiry_is_dropped() {
    let migrated = migrate(
        json!({
            "config_version": 1,
            "api_url": "http://localhost:8000",
            "session": { "email": "a@b.c", "id_token": "t", "access_token": "a", "refresh_token": "r" }
        }),
        1,
    )
    .unwrap();

    assert_eq!(migrated["config_version"], 2);
    assert_eq!(migrated["default_format"], 7);
    assert!(migrated.get("session").is_none());
}

#[test]
fn newer_config_is_rejected() {
    let err = migrate(json!({ "config_version": 99 }), 99).unwrap_err();
    assert!(err.to_string().contains("newer than this build supports"));
}

#[test]
fn env_url_overrides_stored_url() {
    let config = NcpConfig {
        api_url: "http://stored:8000".to_string(),
        ..NcpConfig::default()
    };

    assert_eq!(config.resolve_api_url(Some("https://env.example".to_string())), "https://env.example");
    assert_eq!(config.resolve_api_url(Some("  ".to_string())), "http://stored:8000");
    assert_eq!(config.resolve_api_url(None), "http://stored:8000");
}

#[test]
fn session_expires_a_minute_early() {
    let expires_at = Timestamp::from_second(1_800_000_000).unwrap();
    let stored = session(expires_at);

    let well_before = expires_at.checked_sub(SignedDuration::from_secs(600)).unwrap();
    let just_before = expires_at.checked_sub(SignedDuration::from_secs(30)).unwrap();
    assert!(!stored.is_expired(well_before));
    assert!(stored.is_expired(just_before));
    assert!(stored.is_expired(expires_at));
}

#[test]
fn tokens_are_redacted() {
    assert_eq!(redact_token("eyJhbGciOi.payload.signature"), "eyJh...ture");
    assert_eq!(redact_token("short"), "****");
}
