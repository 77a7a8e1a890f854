use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::render::RenderError;
use crate::service::ServiceError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Internal(message) => {
                error!(error = %message, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Service(e) => match e {
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                ServiceError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
                ServiceError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
                ServiceError::Palette(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                ServiceError::Render(RenderError::Image(inner)) => {
                    error!(error = %inner, "Image encoding failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
                ServiceError::Render(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                ServiceError::Transient(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Temporarily unavailable, please retry".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ValidationError;

    #[test]
    fn maps_service_errors_to_status_codes() {
        let cases = [
            (ServiceError::Validation(ValidationError::InvalidUrl), StatusCode::BAD_REQUEST),
            (ServiceError::Conflict("taken".into()), StatusCode::CONFLICT),
            (ServiceError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ServiceError::Render(RenderError::TooSmall), StatusCode::BAD_REQUEST),
            (
                ServiceError::Transient(anyhow::anyhow!("db down")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
        assert_eq!(ApiError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Internal("join".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_is_user_facing() {
        let (_, message) = ApiError::from(ServiceError::Validation(ValidationError::InvalidEmail))
            .status_and_message();
        assert_eq!(message, "Please enter a valid email address");
    }
}
