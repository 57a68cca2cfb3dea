//! Runtime configuration, read from the environment.

use std::env;
use std::path::PathBuf;

use ncp_audit::tracker::DEFAULT_REQUESTS_DIR;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// S3 bucket for plans and settings. `None` keeps everything in memory.
    pub bucket: Option<String>,
    pub region: String,
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
    /// Shared HS256 secret; replaces Cognito key verification when set.
    pub jwt_secret: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Claude on Bedrock is enabled unless `NCP_DISABLE_CLAUDE` is set.
    pub claude_enabled: bool,
    pub requests_dir: PathBuf,
    pub allowed_origin: Option<String>,
    pub environment: String,
    /// Serve over plain HTTP on this port instead of the Lambda runtime.
    pub port: Option<u16>,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(var)
    }

    /// Build from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let on_lambda = lookup("AWS_LAMBDA_FUNCTION_NAME").is_some();
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .or((!on_lambda).then_some(DEFAULT_PORT));

        Self {
            bucket: lookup("NCP_BUCKET"),
            region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            user_pool_id: lookup("COGNITO_USER_POOL_ID"),
            client_id: lookup("COGNITO_CLIENT_ID"),
            jwt_secret: lookup("NCP_JWT_SECRET"),
            gemini_api_key: lookup("GEMINI_API_KEY"),
            claude_enabled: lookup("NCP_DISABLE_CLAUDE").is_none(),
            requests_dir: lookup("NCP_REQUESTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUESTS_DIR)),
            allowed_origin: lookup("NCP_ALLOWED_ORIGIN"),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "production".to_string()),
            port,
        }
    }
}
