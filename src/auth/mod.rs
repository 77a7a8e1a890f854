//! Request authentication for the management API
//!
//! Every API request resolves to a [`Session`] that is inserted as a request
//! extension; handlers take it explicitly and scope all work to its owner.

pub mod oauth;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ApiError;
use crate::config::{AuthConfig, AuthMode};
use oauth::OAuthValidator;

/// Header naming the acting owner when authentication is disabled.
pub const OWNER_HEADER: &str = "x-owner-id";
pub const LOCAL_OWNER: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub owner_id: String,
}

impl Session {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self { owner_id: owner_id.into() }
    }
}

pub enum AuthService {
    Disabled,
    OAuth(OAuthValidator),
}

impl AuthService {
    pub async fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        match config.mode {
            AuthMode::None => Ok(Self::Disabled),
            AuthMode::Oauth => {
                let oauth = config
                    .oauth
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("OAuth mode requires OAuth settings"))?;
                info!(issuer = %oauth.issuer_url, audience = %oauth.audience, "OAuth authentication enabled");
                Ok(Self::OAuth(OAuthValidator::from_config(oauth).await?))
            }
        }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Option<Session> {
        match self {
            Self::Disabled => {
                let owner = headers
                    .get(OWNER_HEADER)
                    .and_then(|h| h.to_str().ok())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(LOCAL_OWNER);
                Some(Session::new(owner))
            }
            Self::OAuth(validator) => {
                let token = bearer_token(headers)?;
                match validator.verify(token).await {
                    Ok(verified) => Some(Session::new(verified.subject)),
                    Err(e) => {
                        debug!(error = %e, "Rejected bearer token");
                        None
                    }
                }
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.authenticate(request.headers()).await {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}
