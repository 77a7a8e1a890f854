use crate::models::{
    Category, NewQrCode, NewScan, NewShortUrl, QrCodeRecord, QrStatus, ScanEvent, ScanTarget,
    ShortUrlRecord,
};
use crate::storage::rows::{
    collect, QrCodeRow, ScanRow, ShortUrlRow, CATEGORY_COLUMNS, QRCODE_COLUMNS, SCAN_COLUMNS,
    SHORT_URL_COLUMNS,
};
use crate::storage::trait_def::{now_secs, scan_target_columns};
use crate::storage::{ListPosition, Storage, StorageError, StorageResult};
use crate::style::QrStyleConfig;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qrcodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                unique_id TEXT NOT NULL UNIQUE,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                category_id INTEGER,
                status TEXT NOT NULL DEFAULT 'active',
                redirect_url TEXT NOT NULL,
                target_url TEXT NOT NULL,
                style TEXT NOT NULL,
                scan_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_qrcodes_owner ON qrcodes(owner_id, created_at)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS short_urls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL UNIQUE,
                current_url TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                qrcode_id TEXT,
                owner_id TEXT,
                scan_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_short_urls_qrcode ON short_urls(qrcode_id)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                qrcode_id TEXT,
                short_code TEXT,
                scanned_at INTEGER NOT NULL,
                user_agent TEXT NOT NULL,
                referrer TEXT,
                device TEXT NOT NULL,
                browser TEXT NOT NULL,
                os TEXT NOT NULL,
                utm_source TEXT,
                utm_medium TEXT,
                utm_campaign TEXT,
                utm_term TEXT,
                utm_content TEXT,
                ip TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scans_qrcode ON scans(qrcode_id, scanned_at)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create_qrcode(&self, new: &NewQrCode) -> StorageResult<QrCodeRecord> {
        let now = now_secs()?;
        let style = serde_json::to_string(&new.style).map_err(|e| StorageError::Other(e.into()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO qrcodes (unique_id, owner_id, name, category_id, status, redirect_url,
                                 target_url, style, scan_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'active', ?, ?, ?, 0, ?, ?)
            ON CONFLICT(unique_id) DO NOTHING
            "#,
        )
        .bind(&new.unique_id)
        .bind(&new.owner_id)
        .bind(&new.name)
        .bind(new.category_id)
        .bind(&new.redirect_url)
        .bind(&new.target_url)
        .bind(&style)
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        self.get_qrcode(&new.unique_id)
            .await?
            .ok_or_else(|| StorageError::Other(anyhow::anyhow!("inserted qr code vanished")))
    }

    async fn get_qrcode(&self, unique_id: &str) -> Result<Option<QrCodeRecord>> {
        let sql = format!("SELECT {} FROM qrcodes WHERE unique_id = ?", QRCODE_COLUMNS);
        let row = sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(unique_id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(QrCodeRecord::try_from).transpose()
    }

    async fn list_qrcodes(
        &self,
        owner_id: &str,
        category_id: Option<i64>,
        after: Option<ListPosition>,
        limit: i64,
    ) -> Result<Vec<QrCodeRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM qrcodes
            WHERE owner_id = ?
              AND (? IS NULL OR category_id = ?)
              AND (? IS NULL OR created_at < ? OR (created_at = ? AND id < ?))
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
            QRCODE_COLUMNS
        );
        let after_created = after.map(|p| p.created_at);
        let after_id = after.map(|p| p.id);
        let rows = sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(owner_id)
            .bind(category_id)
            .bind(category_id)
            .bind(after_created)
            .bind(after_created)
            .bind(after_created)
            .bind(after_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;
        collect(rows)
    }

    async fn rename_qrcode(&self, unique_id: &str, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE qrcodes SET name = ?, updated_at = ? WHERE unique_id = ?")
            .bind(name)
            .bind(now_secs()?)
            .bind(unique_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_qrcode_category(
        &self,
        unique_id: &str,
        category_id: Option<i64>,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE qrcodes SET category_id = ?, updated_at = ? WHERE unique_id = ?")
                .bind(category_id)
                .bind(now_secs()?)
                .bind(unique_id)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn retarget_qrcode(
        &self,
        unique_id: &str,
        target_url: &str,
        style: &QrStyleConfig,
    ) -> Result<bool> {
        let style = serde_json::to_string(style)?;
        let result = sqlx::query(
            r#"
            UPDATE qrcodes
            SET target_url = ?, style = ?, updated_at = ?
            WHERE unique_id = ?
            "#,
        )
        .bind(target_url)
        .bind(style)
        .bind(now_secs()?)
        .bind(unique_id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_qrcode_status(&self, unique_id: &str, status: QrStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE qrcodes SET status = ?, updated_at = ? WHERE unique_id = ?")
            .bind(status.as_str())
            .bind(now_secs()?)
            .bind(unique_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_qrcode(&self, unique_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM qrcodes WHERE unique_id = ?")
            .bind(unique_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_short_url(&self, new: &NewShortUrl) -> StorageResult<ShortUrlRecord> {
        let now = now_secs()?;
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, current_url, status, qrcode_id, owner_id,
                                    scan_count, created_at, updated_at)
            VALUES (?, ?, 'active', ?, ?, 0, ?, ?)
            ON CONFLICT(short_code) DO NOTHING
            "#,
        )
        .bind(&new.short_code)
        .bind(&new.current_url)
        .bind(&new.qrcode_id)
        .bind(&new.owner_id)
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        self.get_short_url(&new.short_code)
            .await?
            .ok_or_else(|| StorageError::Other(anyhow::anyhow!("inserted short url vanished")))
    }

    async fn get_short_url(&self, short_code: &str) -> Result<Option<ShortUrlRecord>> {
        let sql = format!("SELECT {} FROM short_urls WHERE short_code = ?", SHORT_URL_COLUMNS);
        let row = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(ShortUrlRecord::try_from).transpose()
    }

    async fn sync_short_url_target(&self, qrcode_id: &str, current_url: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE short_urls SET current_url = ?, updated_at = ? WHERE qrcode_id = ?",
        )
        .bind(current_url)
        .bind(now_secs()?)
        .bind(qrcode_id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected())
    }

    async fn set_short_url_status(&self, short_code: &str, status: QrStatus) -> Result<bool> {
        let result =
            sqlx::query("UPDATE short_urls SET status = ?, updated_at = ? WHERE short_code = ?")
                .bind(status.as_str())
                .bind(now_secs()?)
                .bind(short_code)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_category(&self, owner_id: &str, name: &str, color: &str) -> Result<Category> {
        let sql = format!(
            r#"
            INSERT INTO categories (owner_id, name, color, view_count, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(owner_id)
            .bind(name)
            .bind(color)
            .bind(now_secs()?)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(category)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?)
    }

    async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE owner_id = ? ORDER BY name, id",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        sqlx::query("UPDATE qrcodes SET category_id = NULL WHERE category_id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_category_views(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE categories SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_scan_count(&self, target: &ScanTarget) -> Result<()> {
        match target {
            ScanTarget::QrCode { unique_id } => {
                sqlx::query("UPDATE qrcodes SET scan_count = scan_count + 1 WHERE unique_id = ?")
                    .bind(unique_id)
                    .execute(self.pool.as_ref())
                    .await?;
            }
            ScanTarget::ShortCode { short_code, qrcode_id } => {
                sqlx::query(
                    "UPDATE short_urls SET scan_count = scan_count + 1 WHERE short_code = ?",
                )
                .bind(short_code)
                .execute(self.pool.as_ref())
                .await?;
                if let Some(unique_id) = qrcode_id {
                    sqlx::query(
                        "UPDATE qrcodes SET scan_count = scan_count + 1 WHERE unique_id = ?",
                    )
                    .bind(unique_id)
                    .execute(self.pool.as_ref())
                    .await?;
                }
            }
        }
        Ok(())
    }

    async fn insert_scan(&self, scan: &NewScan) -> Result<()> {
        let (qrcode_id, short_code) = scan_target_columns(&scan.target);
        sqlx::query(
            r#"
            INSERT INTO scans (qrcode_id, short_code, scanned_at, user_agent, referrer, device,
                               browser, os, utm_source, utm_medium, utm_campaign, utm_term,
                               utm_content, ip)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(qrcode_id)
        .bind(short_code)
        .bind(scan.scanned_at)
        .bind(&scan.user_agent)
        .bind(&scan.referrer)
        .bind(scan.device.as_str())
        .bind(&scan.browser)
        .bind(&scan.os)
        .bind(&scan.utm.source)
        .bind(&scan.utm.medium)
        .bind(&scan.utm.campaign)
        .bind(&scan.utm.term)
        .bind(&scan.utm.content)
        .bind(&scan.ip)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn list_scans(&self, qrcode_id: &str) -> Result<Vec<ScanEvent>> {
        let sql = format!(
            "SELECT {} FROM scans WHERE qrcode_id = ? ORDER BY scanned_at, id",
            SCAN_COLUMNS
        );
        let rows = sqlx::query_as::<_, ScanRow>(&sql)
            .bind(qrcode_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        collect(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceClass, Utm};

    async fn storage() -> SqliteStorage {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        storage
    }

    fn new_qr(unique_id: &str, owner: &str) -> NewQrCode {
        NewQrCode {
            unique_id: unique_id.to_string(),
            owner_id: owner.to_string(),
            name: "example.com".to_string(),
            category_id: None,
            redirect_url: format!("http://localhost:3000/qr/{unique_id}"),
            target_url: "https://example.com".to_string(),
            style: QrStyleConfig::default(),
        }
    }

    fn scan(target: ScanTarget) -> NewScan {
        NewScan {
            target,
            scanned_at: 1_700_000_000,
            user_agent: "curl/8".to_string(),
            referrer: None,
            device: DeviceClass::Desktop,
            browser: "Unknown".to_string(),
            os: "Unknown".to_string(),
            utm: Utm::default(),
            ip: None,
        }
    }

    #[tokio::test]
    async fn duplicate_unique_id_conflicts() {
        let storage = storage().await;
        storage.create_qrcode(&new_qr("abc", "u1")).await.unwrap();
        let err = storage.create_qrcode(&new_qr("abc", "u2")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn style_survives_storage() {
        let storage = storage().await;
        let mut new = new_qr("abc", "u1");
        new.style.set_border_width(7);
        let saved = storage.create_qrcode(&new).await.unwrap();
        assert_eq!(saved.status, QrStatus::Active);
        assert_eq!(saved.style, new.style);
    }

    #[tokio::test]
    async fn listing_pages_newest_first() {
        let storage = storage().await;
        for id in ["a", "b", "c"] {
            storage.create_qrcode(&new_qr(id, "u1")).await.unwrap();
        }
        storage.create_qrcode(&new_qr("other", "u2")).await.unwrap();

        let first = storage.list_qrcodes("u1", None, None, 2).await.unwrap();
        assert_eq!(
            first.iter().map(|q| q.unique_id.as_str()).collect::<Vec<_>>(),
            ["c", "b"]
        );
        let last = first.last().unwrap();
        let after = ListPosition { created_at: last.created_at, id: last.id };
        let rest = storage.list_qrcodes("u1", None, Some(after), 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].unique_id, "a");
    }

    #[tokio::test]
    async fn short_code_scan_counts_both_records() {
        let storage = storage().await;
        storage.create_qrcode(&new_qr("abc", "u1")).await.unwrap();
        storage
            .create_short_url(&NewShortUrl {
                short_code: "promo1".to_string(),
                current_url: "https://example.com".to_string(),
                qrcode_id: Some("abc".to_string()),
                owner_id: Some("u1".to_string()),
            })
            .await
            .unwrap();

        storage
            .record_scan(&scan(ScanTarget::ShortCode {
                short_code: "promo1".to_string(),
                qrcode_id: Some("abc".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(storage.get_short_url("promo1").await.unwrap().unwrap().scan_count, 1);
        assert_eq!(storage.get_qrcode("abc").await.unwrap().unwrap().scan_count, 1);
        let scans = storage.list_scans("abc").await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].short_code.as_deref(), Some("promo1"));
    }

    #[tokio::test]
    async fn deleting_category_uncategorizes_codes() {
        let storage = storage().await;
        let category = storage.create_category("u1", "Flyers", "#4F46E5").await.unwrap();
        let mut new = new_qr("abc", "u1");
        new.category_id = Some(category.id);
        storage.create_qrcode(&new).await.unwrap();

        assert!(storage.delete_category(category.id).await.unwrap());
        assert_eq!(storage.get_qrcode("abc").await.unwrap().unwrap().category_id, None);
    }

    #[tokio::test]
    async fn deleting_qr_keeps_scans() {
        let storage = storage().await;
        storage.create_qrcode(&new_qr("abc", "u1")).await.unwrap();
        storage
            .record_scan(&scan(ScanTarget::QrCode { unique_id: "abc".to_string() }))
            .await
            .unwrap();
        assert!(storage.delete_qrcode("abc").await.unwrap());
        assert_eq!(storage.list_scans("abc").await.unwrap().len(), 1);
    }
}
