//! ncp-ai
//!
//! AI providers (Claude on Bedrock, Gemini over HTTPS), the provider
//! registry, prompts, JSON extraction from model output and the diagnosis
//! and care plan generation steps.

pub mod claude;
pub mod client;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod generator;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod tokens;
pub mod transaction;
