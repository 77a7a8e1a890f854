use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::OAuthConfig;

/// Identity pulled out of a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub email: Option<String>,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, Arc<DecodingKey>>,
    refreshed_at: Option<Instant>,
}

/// Verifies JWTs against the issuer's JWKS.
#[derive(Clone)]
pub struct OAuthValidator {
    issuer: String,
    audience: String,
    jwks_uri: String,
    client: Client,
    cache: Arc<RwLock<KeyCache>>,
    cache_ttl: Duration,
}

impl OAuthValidator {
    pub async fn from_config(config: &OAuthConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("qrstudio-oauth/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client for OAuth validation")?;

        let jwks_uri = resolve_jwks_uri(config, &client).await?;
        let validator = Self {
            issuer: config.issuer_url.clone(),
            audience: config.audience.clone(),
            jwks_uri,
            client,
            cache: Arc::new(RwLock::new(KeyCache::default())),
            cache_ttl: Duration::from_secs(config.jwks_cache_ttl_secs.max(60)),
        };

        validator.refresh_keys().await?;
        Ok(validator)
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedToken> {
        let header = decode_header(token).context("failed to parse token header")?;
        let kid = header
            .kid
            .ok_or_else(|| anyhow!("token header missing 'kid'"))?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;

        let claims = decode::<Value>(token, key.as_ref(), &validation)
            .context("token failed signature or structural validation")?
            .claims;
        check_claims(&claims, &self.issuer, &self.audience)
    }

    async fn decoding_key(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        let stale = {
            let cache = self.cache.read().await;
            let expired = cache
                .refreshed_at
                .is_none_or(|at| at.elapsed() > self.cache_ttl);
            if !expired {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(Arc::clone(key));
                }
            }
            expired
        };

        debug!(kid, stale, "Refreshing JWKS cache");
        self.refresh_keys().await?;
        self.cache
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| anyhow!("no JWKS entry found for key id '{kid}'"))
    }

    async fn refresh_keys(&self) -> Result<()> {
        let jwks: JwkSet = self
            .client
            .get(&self.jwks_uri)
            .send()
            .await
            .context("failed to request JWKS")?
            .error_for_status()
            .context("JWKS endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse JWKS response")?;

        let keys = jwks_to_keys(jwks)?;
        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.refreshed_at = Some(Instant::now());
        Ok(())
    }
}

fn jwks_to_keys(jwks: JwkSet) -> Result<HashMap<String, Arc<DecodingKey>>> {
    let mut keys = HashMap::new();
    for jwk in jwks.keys {
        let Some(kid) = jwk.kid else {
            warn!("Skipping JWKS entry without 'kid'");
            continue;
        };
        let key = match jwk.kty.as_str() {
            "RSA" => {
                let n = jwk.n.as_deref().ok_or_else(|| anyhow!("JWKS RSA key missing modulus"))?;
                let e = jwk.e.as_deref().ok_or_else(|| anyhow!("JWKS RSA key missing exponent"))?;
                DecodingKey::from_rsa_components(n, e)
                    .context("failed to build RSA decoding key from JWKS entry")?
            }
            "oct" => {
                let secret = jwk.k.as_deref().ok_or_else(|| anyhow!("JWKS symmetric key missing 'k'"))?;
                DecodingKey::from_base64_secret(secret)
                    .context("failed to build HMAC decoding key from JWKS entry")?
            }
            other => {
                warn!("Skipping unsupported JWKS key type: {other}");
                continue;
            }
        };
        keys.insert(kid, Arc::new(key));
    }
    if keys.is_empty() {
        bail!("JWKS response did not contain any usable keys");
    }
    Ok(keys)
}

/// Issuer and audience checks, then the subject becomes the owner id.
fn check_claims(claims: &Value, issuer: &str, audience: &str) -> Result<VerifiedToken> {
    let iss = claims
        .get("iss")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("token missing 'iss' claim"))?;
    if iss.trim_end_matches('/') != issuer.trim_end_matches('/') {
        bail!("token issuer '{}' does not match expected issuer", iss);
    }
    if !audience_matches(claims.get("aud"), audience) {
        bail!("token audience does not include expected value");
    }
    let subject = claims
        .get("sub")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("token missing 'sub' claim"))?;
    Ok(VerifiedToken {
        subject: subject.to_string(),
        email: claims.get("email").and_then(Value::as_str).map(str::to_string),
    })
}

fn audience_matches(aud_claim: Option<&Value>, expected: &str) -> bool {
    match aud_claim {
        Some(Value::String(aud)) => aud == expected,
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .any(|entry| entry == expected),
        _ => false,
    }
}

async fn resolve_jwks_uri(config: &OAuthConfig, client: &Client) -> Result<String> {
    if let Some(url) = &config.jwks_url {
        return Ok(url.clone());
    }

    let issuer = config.issuer_url.trim_end_matches('/');
    let discovery_url = format!("{issuer}/.well-known/openid-configuration");
    let metadata: OpenIdProviderMetadata = client
        .get(&discovery_url)
        .send()
        .await
        .context("failed to request OpenID provider metadata")?
        .error_for_status()
        .context("OpenID provider metadata endpoint returned an error status")?
        .json()
        .await
        .context("failed to parse OpenID provider metadata")?;

    metadata
        .jwks_uri
        .ok_or_else(|| anyhow!("OpenID provider metadata did not include 'jwks_uri'"))
}

#[derive(Debug, Deserialize)]
struct OpenIdProviderMetadata {
    jwks_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    #[serde(default)]
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    k: Option<String>,
}
