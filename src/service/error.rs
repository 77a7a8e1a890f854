use thiserror::Error;
use tracing::error;

use crate::content::ValidationError;
use crate::objects::ObjectStoreError;
use crate::palette::PaletteError;
use crate::render::RenderError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Palette(#[from] PaletteError),

    /// Storage or network failure; the caller may retry.
    #[error("{0}")]
    Transient(anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<anyhow::Error> for ServiceError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = %e, "Storage operation failed");
        ServiceError::Transient(e)
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict => ServiceError::Conflict("Record already exists".to_string()),
            StorageError::Other(e) => e.into(),
        }
    }
}

impl From<ObjectStoreError> for ServiceError {
    fn from(e: ObjectStoreError) -> Self {
        match e {
            ObjectStoreError::NotFound(key) => ServiceError::NotFound(format!("Object not found: {key}")),
            other => anyhow::Error::new(other).into(),
        }
    }
}
