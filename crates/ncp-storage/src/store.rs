use std::collections::BTreeMap;
use std::sync::Arc;

use aws_sdk_s3::Client;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::objects;

/// Where objects live. Cheap to clone; clones share the same backing store.
#[derive(Clone)]
pub enum Store {
    S3 { client: Client, bucket: String },
    Memory(Arc<RwLock<BTreeMap<String, Vec<u8>>>>),
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Store::S3 { bucket, .. } => f.debug_struct("S3").field("bucket", bucket).finish(),
            Store::Memory(_) => f.write_str("Memory"),
        }
    }
}

impl Store {
    pub fn s3(client: Client, bucket: impl Into<String>) -> Self {
        Store::S3 {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn in_memory() -> Self {
        Store::Memory(Arc::default())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::S3 { .. } => "s3",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            Store::S3 { client, bucket } => objects::get_object(client, bucket, key).await,
            Store::Memory(map) => map.read().await.get(key).cloned().ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    pub async fn put(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<(), StorageError> {
        tracing::debug!(key, bytes = body.len(), "put object");
        match self {
            Store::S3 { client, bucket } => objects::put_object(client, bucket, key, body, content_type).await,
            Store::Memory(map) => {
                map.write().await.insert(key.to_string(), body);
                Ok(())
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        tracing::debug!(key, "delete object");
        match self {
            Store::S3 { client, bucket } => objects::delete_object(client, bucket, key).await,
            Store::Memory(map) => {
                map.write().await.remove(key);
                Ok(())
            }
        }
    }

    /// Keys under `prefix`, in lexical order.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        match self {
            Store::S3 { client, bucket } => {
                let mut keys = objects::list_objects(client, bucket, prefix).await?;
                keys.sort();
                Ok(keys)
            }
            Store::Memory(map) => Ok(map
                .read()
                .await
                .range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect()),
        }
    }

    /// Whether the backing store answers. Used by health checks.
    pub async fn ping(&self) -> Result<(), StorageError> {
        match self {
            Store::S3 { client, bucket } => objects::head_bucket(client, bucket).await,
            Store::Memory(_) => Ok(()),
        }
    }
}
