use ncp_core::models::transaction::ProviderKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("response did not conform to expected schema: {0}")]
    SchemaViolation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidProvider(String),

    #[error("{} API is not configured", provider_label(.0))]
    ProviderUnavailable(ProviderKind),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn provider_label(kind: &ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Claude => "Claude",
        ProviderKind::Gemini => "Gemini",
    }
}
