use std::path::{Path, PathBuf};

use jiff::Timestamp;
use ncp_core::models::care_plan::FormatType;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 2;

pub const CONFIG_DIR_ENV: &str = "NCP_CONFIG_DIR";
pub const API_URL_ENV: &str = ncp_client::client::BASE_URL_ENV;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NcpConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub api_url: String,
    /// Column count used when `generate` is run without `--format`.
    #[serde(default = "default_format")]
    pub default_format: u8,
    #[serde(default)]
    pub cognito: Option<CognitoSettings>,
    #[serde(default)]
    pub session: Option<StoredSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitoSettings {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
}

/// Tokens from the last sign-in. The ID token is what the API verifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub email: String,
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}

impl StoredSession {
    /// Treat tokens as stale a minute early so a request does not race
    /// the expiry.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        let margin = jiff::SignedDuration::from_secs(60);
        now.checked_add(margin).map_or(true, |t| t >= self.expires_at)
    }
}

fn default_format() -> u8 {
    FormatType::default().as_u8()
}

impl Default for NcpConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            api_url: ncp_client::client::DEFAULT_BASE_URL.to_string(),
            default_format: default_format(),
            cognito: None,
            session: None,
        }
    }
}

impl NcpConfig {
    /// `NCP_API_URL` wins over the stored URL.
    pub fn resolve_api_url(&self, env_override: Option<String>) -> String {
        env_override
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.api_url.clone())
    }

    pub fn format(&self) -> FormatType {
        FormatType::try_from(self.default_format).unwrap_or_default()
    }
}

/// `$NCP_CONFIG_DIR`, else `<config dir>/ncp`.
pub fn config_dir() -> eyre::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("ncp"))
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

/// Load the config from `dir`, or the defaults when none has been saved.
pub fn load_config(dir: &Path) -> eyre::Result<NcpConfig> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(NcpConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: NcpConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update ncp."
        ));
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;

    // v0 → v1: `server` renamed to `api_url`
    if from_version < 1 {
        let url = obj
            .remove("server")
            .unwrap_or_else(|| serde_json::Value::String(ncp_client::client::DEFAULT_BASE_URL.to_string()));
        obj.entry("api_url").or_insert(url);
        obj.insert("config_version".to_string(), 1.into());
        tracing::info!("migrated config v0 → v1 (renamed server to api_url)");
    }

    // v1 → v2: add default_format; sessions from v1 lack expires_at and are dropped
    if from_version < 2 {
        obj.entry("default_format").or_insert(default_format().into());
        if obj
            .get("session")
            .is_some_and(|s| s.get("expires_at").is_none())
        {
            obj.remove("session");
        }
        obj.insert("config_version".to_string(), 2.into());
        tracing::info!("migrated config v1 → v2 (added default_format)");
    }

    Ok(json)
}

pub fn save_config(dir: &Path, config: &NcpConfig) -> eyre::Result<()> {
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = config_path(dir);
    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // Tokens live in this file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;

    tracing::debug!(path = %path.display(), "config saved");
    Ok(())
}

/// Shortened token for display, e.g. `eyJh...x9Qw`.
pub fn redact_token(token: &str) -> String {
    if token.len() <= 8 {
        return "****".to_string();
    }
    let prefix = &token[..4];
    let suffix = &token[token.len() - 4..];
    format!("{prefix}...{suffix}")
}
