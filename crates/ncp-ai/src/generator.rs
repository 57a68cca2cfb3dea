use std::future::Future;
use std::pin::Pin;

use ncp_core::models::transaction::ProviderKind;
use ncp_core::models::usage::TokenCount;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const DEFAULT_MAX_TOKENS: u32 = 20_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Per-provider invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Text returned by a model, with the tokens it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens: TokenCount,
}

/// One AI backend. Implementations hold their own client and config.
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn config(&self) -> &GenerationConfig;

    /// Send a single-turn prompt with a system prompt.
    fn complete<'a>(&'a self, system: &'a str, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AiError>>;
}
