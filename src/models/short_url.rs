use serde::{Deserialize, Serialize};

use super::QrStatus;

/// Short-code redirect record. `current_url` is kept in sync with the
/// linked QR code's target by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortUrlRecord {
    pub id: i64,
    pub short_code: String,
    pub current_url: String,
    pub status: QrStatus,
    pub qrcode_id: Option<String>,
    pub owner_id: Option<String>,
    pub scan_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewShortUrl {
    pub short_code: String,
    pub current_url: String,
    pub qrcode_id: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortCodeResponse {
    #[serde(flatten)]
    pub short_url: ShortUrlRecord,
    pub short_link: String,
}
