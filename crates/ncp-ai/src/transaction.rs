use ncp_core::models::transaction::{AiCall, PipelineStep, ProviderKind, TransactionStatus};
use ncp_core::models::usage::{TokenCount, TokenUsage};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AiError;
use crate::generator::{Completion, TextGenerator};
use crate::tokens;

/// The result of an AI transaction, before it is persisted.
#[derive(Debug, Clone)]
pub struct TransactionResult<T> {
    pub id: Uuid,
    pub step: PipelineStep,
    pub provider: ProviderKind,
    pub model_id: String,
    pub usage: TokenUsage,
    pub status: TransactionStatus,
    pub output: T,
}

/// Every AI call made by one pipeline step, in order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    pub calls: Vec<AiCall>,
}

impl CallLog {
    pub fn tokens(&self) -> TokenCount {
        self.calls
            .iter()
            .fold(TokenCount::default(), |acc, c| acc + c.usage.tokens)
    }

    pub fn extend(&mut self, other: CallLog) {
        self.calls.extend(other.calls);
    }
}

/// Call the generator once and record the call in `log`, success or not.
pub async fn invoke(
    generator: &dyn TextGenerator,
    step: PipelineStep,
    operation: &str,
    system: &str,
    prompt: &str,
    context: serde_json::Value,
    log: &mut CallLog,
) -> Result<TransactionResult<String>, AiError> {
    let id = Uuid::new_v4();
    let provider = generator.provider();
    let model_id = generator.config().model.clone();
    info!(transaction_id = %id, %step, provider = %provider, model = %model_id, "invoking model");

    let result = generator.complete(system, prompt).await;

    let (usage, error) = match &result {
        Ok(Completion { tokens, .. }) => (tokens::calculate_cost(&model_id, *tokens), None),
        Err(e) => {
            warn!(transaction_id = %id, %step, error = %e, "model invocation failed");
            (TokenUsage::default(), Some(e.to_string()))
        }
    };

    log.calls.push(AiCall {
        timestamp: jiff::Timestamp::now(),
        step,
        operation: operation.to_string(),
        provider,
        model_id: model_id.clone(),
        usage,
        context,
        success: error.is_none(),
        error,
    });

    let completion = result?;
    Ok(TransactionResult {
        id,
        step,
        provider,
        model_id,
        usage,
        status: TransactionStatus::Complete,
        output: completion.text,
    })
}
