//! The set of configured providers and which one is active.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use ncp_core::models::transaction::ProviderKind;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AiError;
use crate::generator::{GenerationConfig, TextGenerator};

/// What `GET /api/admin/ai-provider` reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub config: Option<GenerationConfig>,
    pub available_providers: Vec<ProviderKind>,
}

pub struct ProviderRegistry {
    generators: HashMap<ProviderKind, Arc<dyn TextGenerator>>,
    current: RwLock<ProviderKind>,
}

impl ProviderRegistry {
    /// Register the configured generators. Claude is the initial provider.
    pub fn new(generators: impl IntoIterator<Item = Arc<dyn TextGenerator>>) -> Self {
        let generators = generators
            .into_iter()
            .map(|g| (g.provider(), g))
            .collect();
        Self {
            generators,
            current: RwLock::new(ProviderKind::Claude),
        }
    }

    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.generators.contains_key(&kind)
    }

    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|k| self.is_available(*k))
            .collect()
    }

    pub async fn current(&self) -> ProviderKind {
        *self.current.read().await
    }

    /// Restore a saved selection. A saved provider that is no longer
    /// configured (or none saved) falls back to Claude.
    pub async fn restore(&self, saved: Option<ProviderKind>) -> ProviderKind {
        let provider = match saved {
            Some(kind) if self.is_available(kind) => kind,
            Some(kind) => {
                warn!(saved = %kind, "saved provider not available, defaulting to claude");
                ProviderKind::Claude
            }
            None => ProviderKind::Claude,
        };
        *self.current.write().await = provider;
        info!(provider = %provider, "AI provider initialized");
        provider
    }

    /// Switch the active provider. Rejects providers that are not configured.
    pub async fn set(&self, kind: ProviderKind) -> Result<ProviderKind, AiError> {
        if !self.is_available(kind) {
            return Err(AiError::ProviderUnavailable(kind));
        }
        let mut current = self.current.write().await;
        let old = *current;
        *current = kind;
        info!(from = %old, to = %kind, "AI provider switched");
        Ok(old)
    }

    /// Switch to `kind`, then run `persist`. When `persist` fails the
    /// previous provider is restored. Returns the previous provider.
    pub async fn set_persisted<E, F, Fut>(&self, kind: ProviderKind, persist: F) -> Result<ProviderKind, E>
    where
        E: From<AiError>,
        F: FnOnce(ProviderKind) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let previous = self.set(kind).await?;
        if let Err(e) = persist(kind).await {
            warn!(provider = %kind, restored = %previous, "could not persist provider choice, reverting");
            *self.current.write().await = previous;
            return Err(e);
        }
        Ok(previous)
    }

    /// Parse a provider name and switch to it.
    pub async fn set_by_name(&self, name: &str) -> Result<ProviderKind, AiError> {
        let kind: ProviderKind = name.parse().map_err(AiError::InvalidProvider)?;
        self.set(kind).await?;
        Ok(kind)
    }

    /// The active generator.
    pub async fn active(&self) -> Result<Arc<dyn TextGenerator>, AiError> {
        let kind = self.current().await;
        self.get(kind).ok_or(AiError::ProviderUnavailable(kind))
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn TextGenerator>> {
        self.generators.get(&kind).cloned()
    }

    pub async fn status(&self) -> ProviderStatus {
        let provider = self.current().await;
        ProviderStatus {
            provider,
            config: self.get(provider).map(|g| g.config().clone()),
            available_providers: self.available(),
        }
    }
}
