use tracing::info;

use super::ids::{random_id, MAX_ID_ATTEMPTS, SHORT_CODE_LEN};
use super::{QrService, ServiceError, ServiceResult};
use crate::auth::Session;
use crate::content::validate_short_code;
use crate::models::{NewShortUrl, QrStatus, ShortCodeRequest, ShortCodeResponse, ShortUrlRecord};
use crate::storage::StorageError;

const CODE_IN_USE: &str = "Short code already in use";

impl QrService {
    /// Attach a short code to a saved QR code. A custom code is checked for
    /// existence first; the store's unique constraint catches a concurrent
    /// writer that slips in between the check and the insert.
    pub async fn create_short_code(
        &self,
        session: &Session,
        unique_id: &str,
        request: ShortCodeRequest,
    ) -> ServiceResult<ShortCodeResponse> {
        let record = self.owned_qrcode(session, unique_id).await?;
        let new = |short_code: String| NewShortUrl {
            short_code,
            current_url: record.target_url.clone(),
            qrcode_id: Some(record.unique_id.clone()),
            owner_id: Some(session.owner_id.clone()),
        };

        let short_url = match request.short_code {
            Some(code) => {
                validate_short_code(&code)?;
                if self.storage.get_short_url(&code).await?.is_some() {
                    return Err(ServiceError::Conflict(CODE_IN_USE.to_string()));
                }
                match self.storage.create_short_url(&new(code)).await {
                    Ok(short_url) => short_url,
                    Err(StorageError::Conflict) => {
                        return Err(ServiceError::Conflict(CODE_IN_USE.to_string()))
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => self.generated_short_url(new).await?,
        };

        info!(short_code = %short_url.short_code, unique_id = %unique_id, "Created short code");
        Ok(ShortCodeResponse {
            short_link: self.short_link(&short_url.short_code),
            short_url,
        })
    }

    async fn generated_short_url(
        &self,
        new: impl Fn(String) -> NewShortUrl,
    ) -> ServiceResult<ShortUrlRecord> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let code = random_id(SHORT_CODE_LEN);
            if self.storage.get_short_url(&code).await?.is_some() {
                continue;
            }
            match self.storage.create_short_url(&new(code)).await {
                Ok(short_url) => return Ok(short_url),
                Err(StorageError::Conflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Transient(anyhow::anyhow!(
            "failed to generate a unique short code after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// Administrative status change; not owner-scoped.
    pub async fn set_short_code_status(&self, short_code: &str, status: QrStatus) -> ServiceResult<()> {
        if self.storage.set_short_url_status(short_code, status).await? {
            info!(short_code = %short_code, status = %status, "Changed short code status");
            Ok(())
        } else {
            Err(ServiceError::NotFound("URL not found".to_string()))
        }
    }
}
