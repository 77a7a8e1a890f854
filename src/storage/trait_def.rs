use crate::models::{
    Category, NewQrCode, NewScan, NewShortUrl, QrCodeRecord, QrStatus, ScanEvent, ScanTarget,
    ShortUrlRecord,
};
use crate::style::QrStyleConfig;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Position in a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPosition {
    pub created_at: i64,
    pub id: i64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a QR code; `Conflict` if the unique id is taken.
    async fn create_qrcode(&self, new: &NewQrCode) -> StorageResult<QrCodeRecord>;

    async fn get_qrcode(&self, unique_id: &str) -> Result<Option<QrCodeRecord>>;

    /// Newest first, strictly after `after` when given.
    async fn list_qrcodes(
        &self,
        owner_id: &str,
        category_id: Option<i64>,
        after: Option<ListPosition>,
        limit: i64,
    ) -> Result<Vec<QrCodeRecord>>;

    async fn rename_qrcode(&self, unique_id: &str, name: &str) -> Result<bool>;

    async fn set_qrcode_category(&self, unique_id: &str, category_id: Option<i64>)
        -> Result<bool>;

    /// Point the QR code at a new destination and store the matching style.
    async fn retarget_qrcode(
        &self,
        unique_id: &str,
        target_url: &str,
        style: &QrStyleConfig,
    ) -> Result<bool>;

    async fn set_qrcode_status(&self, unique_id: &str, status: QrStatus) -> Result<bool>;

    /// Removes the document only; scans stay.
    async fn delete_qrcode(&self, unique_id: &str) -> Result<bool>;

    /// Insert a short URL; `Conflict` if the code is taken.
    async fn create_short_url(&self, new: &NewShortUrl) -> StorageResult<ShortUrlRecord>;

    async fn get_short_url(&self, short_code: &str) -> Result<Option<ShortUrlRecord>>;

    /// Copy a QR code's new target onto its linked short URLs. Returns rows touched.
    async fn sync_short_url_target(&self, qrcode_id: &str, current_url: &str) -> Result<u64>;

    async fn set_short_url_status(&self, short_code: &str, status: QrStatus) -> Result<bool>;

    async fn create_category(&self, owner_id: &str, name: &str, color: &str) -> Result<Category>;

    async fn get_category(&self, id: i64) -> Result<Option<Category>>;

    async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>>;

    /// QR codes in the category become uncategorized.
    async fn delete_category(&self, id: i64) -> Result<bool>;

    async fn increment_category_views(&self, id: i64) -> Result<bool>;

    /// Atomic counter bump for whatever the scan hit.
    async fn increment_scan_count(&self, target: &ScanTarget) -> Result<()>;

    async fn insert_scan(&self, scan: &NewScan) -> Result<()>;

    /// Scans for a QR code, including those that came in through its short code.
    async fn list_scans(&self, qrcode_id: &str) -> Result<Vec<ScanEvent>>;

    /// Counter bump followed by the detail insert. The two writes are
    /// separate, so a failure between them leaves a counted scan without
    /// a detail row.
    async fn record_scan(&self, scan: &NewScan) -> Result<()> {
        self.increment_scan_count(&scan.target).await?;
        self.insert_scan(scan).await
    }
}

pub(crate) fn now_secs() -> Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}

/// Column values for the scan target.
pub(crate) fn scan_target_columns(target: &ScanTarget) -> (Option<&str>, Option<&str>) {
    match target {
        ScanTarget::QrCode { unique_id } => (Some(unique_id.as_str()), None),
        ScanTarget::ShortCode { short_code, qrcode_id } => {
            (qrcode_id.as_deref(), Some(short_code.as_str()))
        }
    }
}
