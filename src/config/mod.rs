use anyhow::Context;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub redirect_server: ServerConfig,
    /// Origin of the redirect server as seen by scanners.
    pub public_base_url: String,
    pub object_store: ObjectStoreConfig,
    pub auth: AuthConfig,
    pub analytics: AnalyticsConfig,
    pub cursor_hmac_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub backend: ObjectStoreBackend,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreBackend {
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Oauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub issuer_url: String,
    pub audience: String,
    #[serde(default)]
    pub jwks_url: Option<String>,
    #[serde(default = "OAuthConfig::default_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
}

impl OAuthConfig {
    const fn default_cache_ttl_secs() -> u64 {
        300
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Use the socket address only.
    None,
    /// Forwarded / X-Forwarded-For with trust validation.
    Standard,
    /// CF-Connecting-IP.
    Cloudflare,
}

/// Scan tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub ip_anonymization: bool,
    pub trusted_proxy_mode: TrustedProxyMode,
    pub trusted_proxies: Vec<IpNet>,
    pub num_trusted_proxies: Option<usize>,
    pub buffer_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ip_anonymization: false,
            trusted_proxy_mode: TrustedProxyMode::None,
            trusted_proxies: Vec::new(),
            num_trusted_proxies: None,
            buffer_size: 10_000,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let backend = match or("DATABASE_BACKEND", "sqlite").to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };
        let database_url = or("DATABASE_URL", "sqlite://./qrstudio.db?mode=rwc");
        let max_connections = or("DATABASE_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let api_port = or("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a valid port")?;
        let redirect_port = or("REDIRECT_PORT", "3000")
            .parse::<u16>()
            .context("REDIRECT_PORT must be a valid port")?;

        let public_base_url = or("PUBLIC_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&public_base_url).context("PUBLIC_BASE_URL must be an absolute URL")?;

        let object_backend = match or("OBJECT_STORE_BACKEND", "filesystem").to_lowercase().as_str() {
            "memory" => ObjectStoreBackend::Memory,
            "filesystem" => ObjectStoreBackend::Filesystem,
            other => {
                tracing::warn!(
                    "Unknown OBJECT_STORE_BACKEND '{other}', falling back to 'filesystem'"
                );
                ObjectStoreBackend::Filesystem
            }
        };

        let auth_mode = match or("AUTH_MODE", "none").to_lowercase().as_str() {
            "none" => AuthMode::None,
            "oauth" => AuthMode::Oauth,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'none'. Supported values: none, oauth"
                );
                AuthMode::None
            }
        };

        let oauth = if auth_mode == AuthMode::Oauth {
            let issuer_url =
                var("OAUTH_ISSUER_URL").context("OAUTH_ISSUER_URL must be set when AUTH_MODE=oauth")?;
            let audience =
                var("OAUTH_AUDIENCE").context("OAUTH_AUDIENCE must be set when AUTH_MODE=oauth")?;
            let jwks_cache_ttl_secs = var("OAUTH_JWKS_CACHE_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_else(OAuthConfig::default_cache_ttl_secs);
            Some(OAuthConfig {
                issuer_url,
                audience,
                jwks_url: var("OAUTH_JWKS_URL"),
                jwks_cache_ttl_secs,
            })
        } else {
            None
        };

        let trusted_proxy_mode = match or("TRUSTED_PROXY_MODE", "none").to_lowercase().as_str() {
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            _ => TrustedProxyMode::None,
        };
        let trusted_proxies = var("TRUSTED_PROXIES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<IpNet>()
                            .or_else(|_| s.parse::<std::net::IpAddr>().map(IpNet::from))
                            .with_context(|| format!("invalid TRUSTED_PROXIES entry '{s}'"))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();
        let num_trusted_proxies = var("NUM_TRUSTED_PROXIES")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("NUM_TRUSTED_PROXIES must be a non-negative integer")?;
        let buffer_size = or("SCAN_BUFFER_SIZE", "10000")
            .parse::<usize>()
            .context("SCAN_BUFFER_SIZE must be a positive integer")?;

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: or("API_HOST", "127.0.0.1"),
                port: api_port,
            },
            redirect_server: ServerConfig {
                host: or("REDIRECT_HOST", "127.0.0.1"),
                port: redirect_port,
            },
            public_base_url,
            object_store: ObjectStoreConfig {
                backend: object_backend,
                path: or("OBJECT_STORE_PATH", "./objects"),
            },
            auth: AuthConfig {
                mode: auth_mode,
                oauth,
            },
            analytics: AnalyticsConfig {
                enabled: var("ANALYTICS_ENABLED").map(|v| parse_bool(&v)).unwrap_or(true),
                ip_anonymization: var("IP_ANONYMIZATION")
                    .map(|v| parse_bool(&v))
                    .unwrap_or(false),
                trusted_proxy_mode,
                trusted_proxies,
                num_trusted_proxies,
                buffer_size: buffer_size.max(1),
            },
            cursor_hmac_secret: var("CURSOR_HMAC_SECRET"),
        })
    }
}
