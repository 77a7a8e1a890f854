use bytes::Bytes;
use tracing::{info, warn};

use super::ids::{random_id, MAX_ID_ATTEMPTS, UNIQUE_ID_LEN};
use super::{QrService, ServiceError, ServiceResult, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::analytics::{summarize, ScanSummary};
use crate::auth::Session;
use crate::content::{ContentKind, ValidationError};
use crate::cursor::CursorData;
use crate::models::{
    retarget_content, ListQrQuery, NewQrCode, QrCodePage, QrCodeRecord, QrStatus, RenderRequest,
    SaveQrRequest, SaveQrResponse,
};
use crate::objects::{qr_image_key, ObjectStoreError};
use crate::palette::{logo_palette, DerivedPalette};
use crate::render::{render_bytes, Export, ExportFormat, RenderTarget, EXPORT_SCALE};
use crate::storage::{ListPosition, StorageError};
use crate::style::{QrStyleConfig, StyleEditor};

fn resolve_style(style: QrStyleConfig, preset: Option<&str>) -> QrStyleConfig {
    let mut editor = StyleEditor::new(style);
    if let Some(name) = preset {
        editor.apply_preset_by_name(name);
    }
    editor.into_config()
}

impl QrService {
    /// Persist a finished design: pick an id, render, write the document,
    /// then upload the image. The upload is best-effort; a missing image is
    /// re-rendered on demand.
    pub async fn save(&self, session: &Session, request: SaveQrRequest) -> ServiceResult<SaveQrResponse> {
        let style = resolve_style(request.style, request.preset.as_deref());
        style.validate()?;

        if let Some(category_id) = request.category_id {
            self.owned_category(session, category_id).await?;
        }

        let name = match request.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => style.content.default_name(),
        };
        let target_url = style.content.encoded_payload();

        for _ in 0..MAX_ID_ATTEMPTS {
            let unique_id = random_id(UNIQUE_ID_LEN);
            if self.storage.get_qrcode(&unique_id).await?.is_some() {
                continue;
            }

            let redirect_url = self.redirect_url(&unique_id);
            let png = render_bytes(&style, &redirect_url, ExportFormat::Png)?;
            let new = NewQrCode {
                unique_id,
                owner_id: session.owner_id.clone(),
                name: name.clone(),
                category_id: request.category_id,
                redirect_url,
                target_url: target_url.clone(),
                style: style.clone(),
            };

            let record = match self.storage.create_qrcode(&new).await {
                Ok(record) => record,
                Err(StorageError::Conflict) => continue,
                Err(e) => return Err(e.into()),
            };
            info!(unique_id = %record.unique_id, owner_id = %record.owner_id, "Saved QR code");

            let image_stored = self.store_image(&record, Bytes::from(png)).await;
            return Ok(SaveQrResponse { qrcode: record, image_stored });
        }

        Err(ServiceError::Transient(anyhow::anyhow!(
            "failed to allocate a unique id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    async fn store_image(&self, record: &QrCodeRecord, png: Bytes) -> bool {
        let key = qr_image_key(&record.owner_id, &record.unique_id);
        match self.objects.put(&key, png).await {
            Ok(()) => true,
            Err(e) => {
                warn!(unique_id = %record.unique_id, error = %e, "Failed to upload QR image");
                false
            }
        }
    }

    pub async fn get(&self, session: &Session, unique_id: &str) -> ServiceResult<QrCodeRecord> {
        self.owned_qrcode(session, unique_id).await
    }

    pub async fn list(&self, session: &Session, query: &ListQrQuery) -> ServiceResult<QrCodePage> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let after: Option<ListPosition> = match query.cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(cursor) => Some(
                self.cursor
                    .verify(cursor)
                    .map_err(|_| ValidationError::InvalidCursor)?
                    .into(),
            ),
            None => None,
        };

        let mut qrcodes = self
            .storage
            .list_qrcodes(&session.owner_id, query.category_id, after, limit + 1)
            .await?;
        let has_more = qrcodes.len() as i64 > limit;
        qrcodes.truncate(limit as usize);

        let next_cursor = match qrcodes.last() {
            Some(last) if has_more => Some(self.cursor.sign(&CursorData {
                created_at: last.created_at,
                id: last.id,
            })?),
            _ => None,
        };

        Ok(QrCodePage { qrcodes, next_cursor, has_more })
    }

    pub async fn rename(&self, session: &Session, unique_id: &str, name: &str) -> ServiceResult<QrCodeRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("Name").into());
        }
        self.owned_qrcode(session, unique_id).await?;
        self.storage.rename_qrcode(unique_id, name).await?;
        self.owned_qrcode(session, unique_id).await
    }

    pub async fn recategorize(
        &self,
        session: &Session,
        unique_id: &str,
        category_id: Option<i64>,
    ) -> ServiceResult<QrCodeRecord> {
        self.owned_qrcode(session, unique_id).await?;
        if let Some(id) = category_id {
            self.owned_category(session, id).await?;
        }
        self.storage.set_qrcode_category(unique_id, category_id).await?;
        self.owned_qrcode(session, unique_id).await
    }

    /// Point a dynamic QR code at a new URL and carry the change over to
    /// its short URLs. The two writes are not atomic; re-running the call
    /// converges both records.
    pub async fn retarget(&self, session: &Session, unique_id: &str, url: &str) -> ServiceResult<QrCodeRecord> {
        ContentKind::Url.validate(url.trim())?;
        let record = self.owned_qrcode(session, unique_id).await?;

        let mut style = record.style;
        style.content = retarget_content(url);
        let target_url = style.content.encoded_payload();

        self.storage.retarget_qrcode(unique_id, &target_url, &style).await?;
        let synced = self.storage.sync_short_url_target(unique_id, &target_url).await?;
        info!(unique_id = %unique_id, synced, "Retargeted QR code");

        self.owned_qrcode(session, unique_id).await
    }

    pub async fn set_status(&self, session: &Session, unique_id: &str, status: QrStatus) -> ServiceResult<QrCodeRecord> {
        self.owned_qrcode(session, unique_id).await?;
        self.storage.set_qrcode_status(unique_id, status).await?;
        self.owned_qrcode(session, unique_id).await
    }

    /// Scans are kept.
    pub async fn delete(&self, session: &Session, unique_id: &str) -> ServiceResult<()> {
        let record = self.owned_qrcode(session, unique_id).await?;
        self.storage.delete_qrcode(unique_id).await?;

        let key = qr_image_key(&record.owner_id, &record.unique_id);
        if let Err(e) = self.objects.delete(&key).await {
            warn!(unique_id = %unique_id, error = %e, "Failed to delete QR image");
        }
        info!(unique_id = %unique_id, "Deleted QR code");
        Ok(())
    }

    /// The cached PNG, re-rendered and re-uploaded when it is missing.
    pub async fn image(&self, session: &Session, unique_id: &str) -> ServiceResult<Bytes> {
        let record = self.owned_qrcode(session, unique_id).await?;
        let key = qr_image_key(&record.owner_id, &record.unique_id);

        match self.objects.get(&key).await {
            Ok(bytes) => Ok(bytes),
            Err(ObjectStoreError::NotFound(_)) => {
                let png = Bytes::from(render_bytes(&record.style, &record.redirect_url, ExportFormat::Png)?);
                self.store_image(&record, png.clone()).await;
                Ok(png)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn analytics(&self, session: &Session, unique_id: &str) -> ServiceResult<ScanSummary> {
        self.owned_qrcode(session, unique_id).await?;
        let scans = self.storage.list_scans(unique_id).await?;
        Ok(summarize(&scans))
    }
}

/// Render an unsaved design for download.
pub fn render_export(request: &RenderRequest, epoch_ms: i64) -> ServiceResult<Export> {
    let style = resolve_style(request.style.clone(), request.preset.as_deref());
    let editor = StyleEditor::new(style);
    let data = request
        .data
        .clone()
        .unwrap_or_else(|| editor.config().content.encoded_payload());
    if request.data.is_none() {
        editor.config().content.validate()?;
    }

    let mut target = RenderTarget::new(EXPORT_SCALE);
    target.sync(&editor, &data)?;
    let export = target.export(request.format, epoch_ms)?;
    target.dispose();
    Ok(export)
}

pub fn palette_for_logo(bytes: &[u8]) -> ServiceResult<DerivedPalette> {
    Ok(logo_palette(bytes)?)
}
