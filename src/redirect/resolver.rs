//! Redirect resolution
//!
//! A lookup ends in exactly one terminal state. Scan recording happens
//! after resolution and can never change the outcome.

use tracing::error;

use crate::models::ScanTarget;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    ShortCode(&'a str),
    UniqueId(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirecting { location: String, target: ScanTarget },
    NotFound,
    Inactive,
    Error,
}

pub async fn resolve(storage: &dyn Storage, lookup: Lookup<'_>) -> Resolution {
    match lookup {
        Lookup::ShortCode(code) => match storage.get_short_url(code).await {
            Ok(None) => Resolution::NotFound,
            Ok(Some(short_url)) if !short_url.status.is_active() => Resolution::Inactive,
            Ok(Some(short_url)) => Resolution::Redirecting {
                location: short_url.current_url,
                target: ScanTarget::ShortCode {
                    short_code: short_url.short_code,
                    qrcode_id: short_url.qrcode_id,
                },
            },
            Err(e) => {
                error!(short_code = %code, error = %e, "Short code lookup failed");
                Resolution::Error
            }
        },
        Lookup::UniqueId(id) => match storage.get_qrcode(id).await {
            Ok(None) => Resolution::NotFound,
            Ok(Some(record)) if !record.status.is_active() => Resolution::Inactive,
            Ok(Some(record)) => Resolution::Redirecting {
                location: record.target_url,
                target: ScanTarget::QrCode { unique_id: record.unique_id },
            },
            Err(e) => {
                error!(unique_id = %id, error = %e, "QR code lookup failed");
                Resolution::Error
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewShortUrl, QrStatus};
    use crate::storage::SqliteStorage;

    #[tokio::test]
    async fn short_code_states() {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        storage
            .create_short_url(&NewShortUrl {
                short_code: "promo1".to_string(),
                current_url: "https://x.test".to_string(),
                qrcode_id: None,
                owner_id: None,
            })
            .await
            .unwrap();

        assert_eq!(resolve(&storage, Lookup::ShortCode("nope")).await, Resolution::NotFound);
        assert_eq!(
            resolve(&storage, Lookup::ShortCode("promo1")).await,
            Resolution::Redirecting {
                location: "https://x.test".to_string(),
                target: ScanTarget::ShortCode { short_code: "promo1".to_string(), qrcode_id: None },
            }
        );

        storage.set_short_url_status("promo1", QrStatus::Inactive).await.unwrap();
        assert_eq!(resolve(&storage, Lookup::ShortCode("promo1")).await, Resolution::Inactive);
        assert_eq!(resolve(&storage, Lookup::UniqueId("promo1")).await, Resolution::NotFound);
    }
}
