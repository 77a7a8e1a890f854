use tracing::info;

use super::{QrService, ServiceResult};
use crate::auth::Session;
use crate::content::ValidationError;
use crate::models::{Category, CreateCategoryRequest, DEFAULT_CATEGORY_COLOR};
use crate::style::Rgba;

impl QrService {
    pub async fn create_category(
        &self,
        session: &Session,
        request: CreateCategoryRequest,
    ) -> ServiceResult<Category> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("Category name").into());
        }
        let color = match request.color.as_deref().map(str::trim) {
            Some(color) if !color.is_empty() => {
                Rgba::parse(color)?;
                color
            }
            _ => DEFAULT_CATEGORY_COLOR,
        };

        let category = self
            .storage
            .create_category(&session.owner_id, name, color)
            .await?;
        info!(category_id = category.id, owner_id = %session.owner_id, "Created category");
        Ok(category)
    }

    pub async fn list_categories(&self, session: &Session) -> ServiceResult<Vec<Category>> {
        Ok(self.storage.list_categories(&session.owner_id).await?)
    }

    /// QR codes in the category become uncategorized.
    pub async fn delete_category(&self, session: &Session, id: i64) -> ServiceResult<()> {
        self.owned_category(session, id).await?;
        self.storage.delete_category(id).await?;
        info!(category_id = id, "Deleted category");
        Ok(())
    }

    pub async fn record_category_view(&self, session: &Session, id: i64) -> ServiceResult<Category> {
        self.owned_category(session, id).await?;
        self.storage.increment_category_views(id).await?;
        self.owned_category(session, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::service;
    use crate::service::ServiceError;

    fn request(name: &str, color: Option<&str>) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            color: color.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_defaults_color_and_validates() {
        let service = service().await;
        let session = Session::new("alice");

        let category = service.create_category(&session, request(" Events ", None)).await.unwrap();
        assert_eq!(category.name, "Events");
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);

        assert!(matches!(
            service.create_category(&session, request("", None)).await,
            Err(ServiceError::Validation(ValidationError::Required(_)))
        ));
        assert!(matches!(
            service.create_category(&session, request("x", Some("nope"))).await,
            Err(ServiceError::Validation(ValidationError::InvalidColor(_)))
        ));
    }

    #[tokio::test]
    async fn views_and_ownership() {
        let service = service().await;
        let alice = Session::new("alice");
        let category = service.create_category(&alice, request("Menu", Some("#10B981"))).await.unwrap();

        let viewed = service.record_category_view(&alice, category.id).await.unwrap();
        assert_eq!(viewed.view_count, 1);

        let bob = Session::new("bob");
        assert!(matches!(
            service.delete_category(&bob, category.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.list_categories(&bob).await.unwrap().is_empty());

        service.delete_category(&alice, category.id).await.unwrap();
        assert!(service.list_categories(&alice).await.unwrap().is_empty());
    }
}
