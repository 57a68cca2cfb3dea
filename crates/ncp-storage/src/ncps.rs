//! Care plan, explanation and settings documents.

use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::diagnosis::NnnEntry;
use ncp_core::models::explanation::Explanation;
use ncp_core::models::transaction::ProviderKind;
use ncp_core::storage_keys;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::state::{load_state, load_state_opt, save_state};
use crate::store::Store;

pub async fn save_ncp(store: &Store, plan: &CarePlan) -> Result<(), StorageError> {
    save_state(store, &storage_keys::ncp(plan.id), plan).await
}

pub async fn load_ncp(store: &Store, id: Uuid) -> Result<CarePlan, StorageError> {
    load_state(store, &storage_keys::ncp(id)).await
}

/// Delete a plan and its explanation, if any.
pub async fn delete_ncp(store: &Store, id: Uuid) -> Result<(), StorageError> {
    store.delete(&storage_keys::explanation(id)).await?;
    store.delete(&storage_keys::ncp(id)).await
}

/// All saved plans, newest first. Pass `owner` to restrict to one user.
/// Unreadable documents are logged and skipped.
pub async fn list_ncps(store: &Store, owner: Option<&str>) -> Result<Vec<CarePlan>, StorageError> {
    let keys = store.list(storage_keys::NCPS_PREFIX).await?;

    let mut plans = Vec::with_capacity(keys.len());
    for key in keys {
        if storage_keys::ncp_id_from_key(&key).is_none() {
            continue;
        }
        match load_state::<CarePlan>(store, &key).await {
            Ok(plan) => {
                if owner.is_none_or(|o| plan.user_id.as_deref() == Some(o)) {
                    plans.push(plan);
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "skipping unreadable care plan"),
        }
    }

    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(plans)
}

pub async fn save_explanation(store: &Store, explanation: &Explanation) -> Result<(), StorageError> {
    save_state(store, &storage_keys::explanation(explanation.ncp_id), explanation).await
}

pub async fn load_explanation(store: &Store, ncp_id: Uuid) -> Result<Option<Explanation>, StorageError> {
    load_state_opt(store, &storage_keys::explanation(ncp_id)).await
}

/// The persisted AI provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSetting {
    pub provider: ProviderKind,
}

pub async fn load_provider_setting(store: &Store) -> Result<Option<ProviderKind>, StorageError> {
    let setting: Option<ProviderSetting> = load_state_opt(store, storage_keys::AI_PROVIDER_SETTING).await?;
    Ok(setting.map(|s| s.provider))
}

pub async fn save_provider_setting(store: &Store, provider: ProviderKind) -> Result<(), StorageError> {
    save_state(store, storage_keys::AI_PROVIDER_SETTING, &ProviderSetting { provider }).await
}

/// The NNN lookup table. A missing table reads as empty.
pub async fn load_lookup_table(store: &Store) -> Result<Vec<NnnEntry>, StorageError> {
    Ok(load_state_opt(store, storage_keys::LOOKUP_TABLE)
        .await?
        .unwrap_or_default())
}

pub async fn save_lookup_table(store: &Store, entries: &[NnnEntry]) -> Result<(), StorageError> {
    save_state(store, storage_keys::LOOKUP_TABLE, &entries).await
}
