use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content::QrContent;
use crate::render::ExportFormat;
use crate::style::QrStyleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrStatus {
    #[default]
    Active,
    Inactive,
}

impl QrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrStatus::Active => "active",
            QrStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        *self == QrStatus::Active
    }
}

impl fmt::Display for QrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(QrStatus::Active),
            "inactive" => Ok(QrStatus::Inactive),
            other => Err(anyhow::anyhow!("unknown status '{}'", other)),
        }
    }
}

/// A saved QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCodeRecord {
    pub id: i64,
    pub unique_id: String,
    pub owner_id: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub status: QrStatus,
    /// What the symbol encodes: `<base>/qr/<unique_id>`.
    pub redirect_url: String,
    /// Where scans are sent.
    pub target_url: String,
    pub style: QrStyleConfig,
    pub scan_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Everything the store needs to insert a QR code.
#[derive(Debug, Clone)]
pub struct NewQrCode {
    pub unique_id: String,
    pub owner_id: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub redirect_url: String,
    pub target_url: String,
    pub style: QrStyleConfig,
}

#[derive(Debug, Deserialize)]
pub struct SaveQrRequest {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub style: QrStyleConfig,
    /// Applied over `style` before saving.
    pub preset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveQrResponse {
    #[serde(flatten)]
    pub qrcode: QrCodeRecord,
    pub image_stored: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryAssignRequest {
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RetargetRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: QrStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShortCodeRequest {
    /// Generated when absent.
    pub short_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQrQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QrCodePage {
    pub qrcodes: Vec<QrCodeRecord>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub style: QrStyleConfig,
    pub preset: Option<String>,
    #[serde(default)]
    pub format: ExportFormat,
    /// Overrides the content payload, e.g. to preview a redirect URL.
    pub data: Option<String>,
}

impl RenderRequest {
    pub fn payload(&self) -> String {
        self.data
            .clone()
            .unwrap_or_else(|| self.style.content.encoded_payload())
    }
}

/// Content used when a saved code is retargeted to a new URL.
pub fn retarget_content(url: &str) -> QrContent {
    QrContent::Url(url.trim().to_string())
}
