use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{validate_key, ObjectStore, ObjectStoreError, ObjectStoreResult};

/// In-process object store, used by tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Bytes) -> ObjectStoreResult<()> {
        validate_key(key)?;
        self.objects.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> ObjectStoreResult<Bytes> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> ObjectStoreResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> ObjectStoreResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes() {
        let store = MemoryObjectStore::new();
        store.put("a/b.png", Bytes::from_static(b"1")).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("a/b.png").await.unwrap(), Bytes::from_static(b"1"));
        store.delete("a/b.png").await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(store.get("a/b.png").await, Err(ObjectStoreError::NotFound(_))));
    }
}
