//! Claude through the Bedrock Converse API.

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use ncp_core::models::transaction::ProviderKind;
use tracing::debug;

use crate::error::AiError;
use crate::generator::{BoxFuture, Completion, GenerationConfig, TextGenerator};
use crate::tokens;

pub const DEFAULT_MODEL: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";

pub struct ClaudeBedrock {
    client: Client,
    config: GenerationConfig,
}

impl ClaudeBedrock {
    pub fn new(client: Client, config: GenerationConfig) -> Self {
        Self { client, config }
    }

    pub fn with_default_model(client: Client) -> Self {
        Self::new(client, GenerationConfig::new(DEFAULT_MODEL))
    }

    async fn converse(&self, system: &str, prompt: &str) -> Result<Completion, AiError> {
        let mut request = self
            .client
            .converse()
            .model_id(&self.config.model)
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(self.config.max_tokens as i32)
                    .temperature(self.config.temperature)
                    .build(),
            )
            .messages(
                Message::builder()
                    .role(ConversationRole::User)
                    .content(ContentBlock::Text(prompt.to_string()))
                    .build()
                    .map_err(|e| AiError::Invocation(e.to_string()))?,
            );

        if !system.is_empty() {
            request = request.system(SystemContentBlock::Text(system.to_string()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AiError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| AiError::ResponseParse("no message in response".to_string()))?;

        let text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AiError::ResponseParse("Claude API returned empty response".to_string()));
        }

        let tokens = response.usage().map(tokens::extract_token_usage).unwrap_or_default();
        debug!(model = %self.config.model, input = tokens.input, output = tokens.output, "converse complete");

        Ok(Completion { text, tokens })
    }
}

impl TextGenerator for ClaudeBedrock {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn complete<'a>(&'a self, system: &'a str, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AiError>> {
        Box::pin(self.converse(system, prompt))
    }
}
