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
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qrcodes (
                id BIGSERIAL PRIMARY KEY,
                unique_id TEXT NOT NULL UNIQUE,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                category_id BIGINT,
                status TEXT NOT NULL DEFAULT 'active',
                redirect_url TEXT NOT NULL,
                target_url TEXT NOT NULL,
                style TEXT NOT NULL,
                scan_count BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
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
                id BIGSERIAL PRIMARY KEY,
                short_code TEXT NOT NULL UNIQUE,
                current_url TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                qrcode_id TEXT,
                owner_id TEXT,
                scan_count BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
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
                id BIGSERIAL PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                view_count BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id BIGSERIAL PRIMARY KEY,
                qrcode_id TEXT,
                short_code TEXT,
                scanned_at BIGINT NOT NULL,
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
        let sql = format!(
            r#"
            INSERT INTO qrcodes (unique_id, owner_id, name, category_id, status, redirect_url,
                                 target_url, style, scan_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'active', $5, $6, $7, 0, $8, $8)
            ON CONFLICT (unique_id) DO NOTHING
            RETURNING {}
            "#,
            QRCODE_COLUMNS
        );

        let row = sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(&new.unique_id)
            .bind(&new.owner_id)
            .bind(&new.name)
            .bind(new.category_id)
            .bind(&new.redirect_url)
            .bind(&new.target_url)
            .bind(&style)
            .bind(now)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        match row {
            Some(row) => Ok(QrCodeRecord::try_from(row)?),
            None => Err(StorageError::Conflict),
        }
    }

    async fn get_qrcode(&self, unique_id: &str) -> Result<Option<QrCodeRecord>> {
        let sql = format!("SELECT {} FROM qrcodes WHERE unique_id = $1", QRCODE_COLUMNS);
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
            WHERE owner_id = $1
              AND ($2::BIGINT IS NULL OR category_id = $2)
              AND ($3::BIGINT IS NULL OR created_at < $3 OR (created_at = $3 AND id < $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
            QRCODE_COLUMNS
        );
        let rows = sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(owner_id)
            .bind(category_id)
            .bind(after.map(|p| p.created_at))
            .bind(after.map(|p| p.id))
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;
        collect(rows)
    }

    async fn rename_qrcode(&self, unique_id: &str, name: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE qrcodes SET name = $1, updated_at = $2 WHERE unique_id = $3")
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
        let result = sqlx::query(
            "UPDATE qrcodes SET category_id = $1, updated_at = $2 WHERE unique_id = $3",
        )
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
            SET target_url = $1, style = $2, updated_at = $3
            WHERE unique_id = $4
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
        let result =
            sqlx::query("UPDATE qrcodes SET status = $1, updated_at = $2 WHERE unique_id = $3")
                .bind(status.as_str())
                .bind(now_secs()?)
                .bind(unique_id)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_qrcode(&self, unique_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM qrcodes WHERE unique_id = $1")
            .bind(unique_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_short_url(&self, new: &NewShortUrl) -> StorageResult<ShortUrlRecord> {
        let now = now_secs()?;
        let sql = format!(
            r#"
            INSERT INTO short_urls (short_code, current_url, status, qrcode_id, owner_id,
                                    scan_count, created_at, updated_at)
            VALUES ($1, $2, 'active', $3, $4, 0, $5, $5)
            ON CONFLICT (short_code) DO NOTHING
            RETURNING {}
            "#,
            SHORT_URL_COLUMNS
        );
        let row = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(&new.short_code)
            .bind(&new.current_url)
            .bind(&new.qrcode_id)
            .bind(&new.owner_id)
            .bind(now)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        match row {
            Some(row) => Ok(ShortUrlRecord::try_from(row)?),
            None => Err(StorageError::Conflict),
        }
    }

    async fn get_short_url(&self, short_code: &str) -> Result<Option<ShortUrlRecord>> {
        let sql = format!("SELECT {} FROM short_urls WHERE short_code = $1", SHORT_URL_COLUMNS);
        let row = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(ShortUrlRecord::try_from).transpose()
    }

    async fn sync_short_url_target(&self, qrcode_id: &str, current_url: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE short_urls SET current_url = $1, updated_at = $2 WHERE qrcode_id = $3",
        )
        .bind(current_url)
        .bind(now_secs()?)
        .bind(qrcode_id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected())
    }

    async fn set_short_url_status(&self, short_code: &str, status: QrStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE short_urls SET status = $1, updated_at = $2 WHERE short_code = $3",
        )
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
            VALUES ($1, $2, $3, 0, $4)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(owner_id)
            .bind(name)
            .bind(color)
            .bind(now_secs()?)
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?)
    }

    async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE owner_id = $1 ORDER BY name, id",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE qrcodes SET category_id = NULL WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_category_views(&self, id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE categories SET view_count = view_count + 1 WHERE id = $1")
                .bind(id)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_scan_count(&self, target: &ScanTarget) -> Result<()> {
        match target {
            ScanTarget::QrCode { unique_id } => {
                sqlx::query("UPDATE qrcodes SET scan_count = scan_count + 1 WHERE unique_id = $1")
                    .bind(unique_id)
                    .execute(self.pool.as_ref())
                    .await?;
            }
            ScanTarget::ShortCode { short_code, qrcode_id } => {
                sqlx::query(
                    "UPDATE short_urls SET scan_count = scan_count + 1 WHERE short_code = $1",
                )
                .bind(short_code)
                .execute(self.pool.as_ref())
                .await?;
                if let Some(unique_id) = qrcode_id {
                    sqlx::query(
                        "UPDATE qrcodes SET scan_count = scan_count + 1 WHERE unique_id = $1",
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
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
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
            "SELECT {} FROM scans WHERE qrcode_id = $1 ORDER BY scanned_at, id",
            SCAN_COLUMNS
        );
        let rows = sqlx::query_as::<_, ScanRow>(&sql)
            .bind(qrcode_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        collect(rows)
    }
}
