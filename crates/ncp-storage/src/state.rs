use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;
use crate::store::Store;

/// Load a JSON document.
pub async fn load_state<T: DeserializeOwned>(store: &Store, key: &str) -> Result<T, StorageError> {
    let body = store.get(key).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Load a JSON document, mapping a missing key to `None`.
pub async fn load_state_opt<T: DeserializeOwned>(store: &Store, key: &str) -> Result<Option<T>, StorageError> {
    match load_state(store, key).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Save a JSON document.
pub async fn save_state<T: Serialize>(store: &Store, key: &str, value: &T) -> Result<(), StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(key, body, Some("application/json")).await
}
