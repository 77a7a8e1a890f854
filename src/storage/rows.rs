//! Raw table rows shared by both SQL backends, and their conversion into
//! domain records.

use anyhow::{Context, Result};
use sqlx::FromRow;

use crate::models::{QrCodeRecord, ScanEvent, ShortUrlRecord, Utm};

#[derive(Debug, FromRow)]
pub(crate) struct QrCodeRow {
    pub id: i64,
    pub unique_id: String,
    pub owner_id: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub status: String,
    pub redirect_url: String,
    pub target_url: String,
    pub style: String,
    pub scan_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<QrCodeRow> for QrCodeRecord {
    type Error = anyhow::Error;

    fn try_from(row: QrCodeRow) -> Result<Self> {
        let style = serde_json::from_str(&row.style)
            .with_context(|| format!("corrupt style for qr code {}", row.unique_id))?;
        Ok(QrCodeRecord {
            id: row.id,
            status: row.status.parse()?,
            unique_id: row.unique_id,
            owner_id: row.owner_id,
            name: row.name,
            category_id: row.category_id,
            redirect_url: row.redirect_url,
            target_url: row.target_url,
            style,
            scan_count: row.scan_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ShortUrlRow {
    pub id: i64,
    pub short_code: String,
    pub current_url: String,
    pub status: String,
    pub qrcode_id: Option<String>,
    pub owner_id: Option<String>,
    pub scan_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<ShortUrlRow> for ShortUrlRecord {
    type Error = anyhow::Error;

    fn try_from(row: ShortUrlRow) -> Result<Self> {
        Ok(ShortUrlRecord {
            id: row.id,
            status: row.status.parse()?,
            short_code: row.short_code,
            current_url: row.current_url,
            qrcode_id: row.qrcode_id,
            owner_id: row.owner_id,
            scan_count: row.scan_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ScanRow {
    pub id: i64,
    pub qrcode_id: Option<String>,
    pub short_code: Option<String>,
    pub scanned_at: i64,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub ip: Option<String>,
}

impl TryFrom<ScanRow> for ScanEvent {
    type Error = anyhow::Error;

    fn try_from(row: ScanRow) -> Result<Self> {
        Ok(ScanEvent {
            id: row.id,
            device: row.device.parse()?,
            qrcode_id: row.qrcode_id,
            short_code: row.short_code,
            scanned_at: row.scanned_at,
            user_agent: row.user_agent,
            referrer: row.referrer,
            browser: row.browser,
            os: row.os,
            utm: Utm {
                source: row.utm_source,
                medium: row.utm_medium,
                campaign: row.utm_campaign,
                term: row.utm_term,
                content: row.utm_content,
            },
            ip: row.ip,
        })
    }
}

pub(crate) fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

pub(crate) const QRCODE_COLUMNS: &str = "id, unique_id, owner_id, name, category_id, status, \
     redirect_url, target_url, style, scan_count, created_at, updated_at";

pub(crate) const SHORT_URL_COLUMNS: &str =
    "id, short_code, current_url, status, qrcode_id, owner_id, scan_count, created_at, updated_at";

pub(crate) const SCAN_COLUMNS: &str = "id, qrcode_id, short_code, scanned_at, user_agent, \
     referrer, device, browser, os, utm_source, utm_medium, utm_campaign, utm_term, utm_content, ip";

pub(crate) const CATEGORY_COLUMNS: &str = "id, owner_id, name, color, view_count, created_at";
