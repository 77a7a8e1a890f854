//! Blob storage for rendered QR images.

pub mod filesystem;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{ObjectStoreBackend, ObjectStoreConfig};

pub use filesystem::FilesystemObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ObjectStoreResult<T> = std::result::Result<T, ObjectStoreError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> ObjectStoreResult<()>;

    async fn get(&self, key: &str) -> ObjectStoreResult<Bytes>;

    async fn exists(&self, key: &str) -> ObjectStoreResult<bool>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> ObjectStoreResult<()>;
}

pub async fn open(config: &ObjectStoreConfig) -> ObjectStoreResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        ObjectStoreBackend::Filesystem => {
            info!("Storing QR images under {}", config.path);
            Arc::new(FilesystemObjectStore::new(&config.path).await?)
        }
        ObjectStoreBackend::Memory => {
            info!("Storing QR images in memory");
            Arc::new(MemoryObjectStore::new())
        }
    };
    Ok(store)
}

/// Storage key for a QR code's rendered image.
pub fn qr_image_key(owner_id: &str, unique_id: &str) -> String {
    format!("qrcodes/{}/{}.png", key_segment(owner_id), key_segment(unique_id))
}

/// Percent-escape everything outside `[A-Za-z0-9_-]` so caller-supplied ids
/// stay a single, non-dot path segment.
fn key_segment(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Reject keys that could escape the store root.
pub(crate) fn validate_key(key: &str) -> ObjectStoreResult<()> {
    if key.is_empty() {
        return Err(ObjectStoreError::InvalidKey("empty key".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
        return Err(ObjectStoreError::InvalidKey(format!(
            "path traversal not allowed: {key}"
        )));
    }
    if key
        .split(['/', '\\'])
        .any(|segment| matches!(segment, "" | "." | ".."))
    {
        return Err(ObjectStoreError::InvalidKey(format!(
            "contains unsafe path component: {key}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_key_layout() {
        assert_eq!(qr_image_key("u1", "abc"), "qrcodes/u1/abc.png");
    }

    #[test]
    fn hostile_owner_ids_stay_one_segment() {
        let key = qr_image_key("..", "abc");
        assert_eq!(key, "qrcodes/%2E%2E/abc.png");
        assert!(validate_key(&key).is_ok());

        let key = qr_image_key("auth0|user/../x", "abc");
        assert_eq!(key, "qrcodes/auth0%7Cuser%2F%2E%2E%2Fx/abc.png");
        assert!(validate_key(&key).is_ok());

        assert!(validate_key(&qr_image_key("", "abc")).is_ok());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("qrcodes/u1/a.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("a/./b").is_err());
        assert!(validate_key("").is_err());
    }
}
