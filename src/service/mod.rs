//! Owner-scoped operations behind the management API and the admin CLI.
//!
//! Every call takes the acting [`Session`] explicitly. Records owned by
//! someone else are reported as missing.

mod categories;
mod error;
pub mod ids;
mod qrcodes;
mod short_codes;

use std::sync::Arc;

use crate::auth::Session;
use crate::cursor::CursorSigner;
use crate::models::{Category, QrCodeRecord};
use crate::objects::ObjectStore;
use crate::storage::Storage;

pub use error::{ServiceError, ServiceResult};
pub use qrcodes::{palette_for_logo, render_export};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct QrService {
    storage: Arc<dyn Storage>,
    objects: Arc<dyn ObjectStore>,
    public_base_url: String,
    cursor: CursorSigner,
}

impl QrService {
    pub fn new(
        storage: Arc<dyn Storage>,
        objects: Arc<dyn ObjectStore>,
        public_base_url: impl Into<String>,
        cursor: CursorSigner,
    ) -> Self {
        Self {
            storage,
            objects,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            cursor,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// What a saved QR code encodes.
    pub fn redirect_url(&self, unique_id: &str) -> String {
        format!("{}/qr/{}", self.public_base_url, unique_id)
    }

    pub fn short_link(&self, short_code: &str) -> String {
        format!("{}/r/{}", self.public_base_url, short_code)
    }

    async fn owned_qrcode(&self, session: &Session, unique_id: &str) -> ServiceResult<QrCodeRecord> {
        match self.storage.get_qrcode(unique_id).await? {
            Some(record) if record.owner_id == session.owner_id => Ok(record),
            _ => Err(ServiceError::NotFound("QR code not found".to_string())),
        }
    }

    async fn owned_category(&self, session: &Session, id: i64) -> ServiceResult<Category> {
        match self.storage.get_category(id).await? {
            Some(category) if category.owner_id == session.owner_id => Ok(category),
            _ => Err(ServiceError::NotFound("Category not found".to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::objects::MemoryObjectStore;
    use crate::storage::SqliteStorage;

    pub async fn service_with(objects: Arc<dyn ObjectStore>) -> QrService {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        QrService::new(
            Arc::new(storage),
            objects,
            "https://qr.test/",
            CursorSigner::new(Some("secret")),
        )
    }

    pub async fn service() -> QrService {
        service_with(Arc::new(MemoryObjectStore::new())).await
    }
}
