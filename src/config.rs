/*
 * Responsibility
 * - 環境変数の読み込み (PORT, APP_ENV, token secret, impersonation cache 設定, CORS)
 * - 設定値のバリデーション (secret 不足/弱い場合は起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

use crate::services::auth::issuer::DEFAULT_TTL_SECONDS;

/// Secrets shorter than this are refused in production.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    WeakSecret(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::WeakSecret(key) => write!(
                f,
                "{} must be at least {} bytes in production",
                key, MIN_SECRET_LEN
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Downstream data store the impersonation token is presented to.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: Url,
    pub anon_key: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Verifies bearer tokens from the identity provider.
    pub idp_jwt_secret: String,
    // Signs impersonation tokens; falls back to `idp_jwt_secret`.
    pub impersonation_jwt_secret: Option<String>,
    pub impersonation_ttl_seconds: u64,
    pub impersonation_cache_max_entries: usize,
    pub access_token_leeway_seconds: u64,

    pub store: Option<StoreConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field(
                "separate_impersonation_secret",
                &self.impersonation_jwt_secret.is_some(),
            )
            .field("impersonation_ttl_seconds", &self.impersonation_ttl_seconds)
            .field(
                "impersonation_cache_max_entries",
                &self.impersonation_cache_max_entries,
            )
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("store", &self.store)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let idp_jwt_secret = get("IDP_JWT_SECRET").ok_or(ConfigError::Missing("IDP_JWT_SECRET"))?;
        check_secret_strength("IDP_JWT_SECRET", &idp_jwt_secret, app_env)?;

        let impersonation_jwt_secret = get("IMPERSONATION_JWT_SECRET");
        if let Some(secret) = &impersonation_jwt_secret {
            check_secret_strength("IMPERSONATION_JWT_SECRET", secret, app_env)?;
        }

        let impersonation_ttl_seconds = match get("IMPERSONATION_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::Invalid("IMPERSONATION_TTL_SECONDS"))?,
            None => DEFAULT_TTL_SECONDS,
        };

        let impersonation_cache_max_entries = match get("IMPERSONATION_CACHE_MAX_ENTRIES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid("IMPERSONATION_CACHE_MAX_ENTRIES"))?,
            None => 10_000,
        };

        let access_token_leeway_seconds = match get("ACCESS_TOKEN_LEEWAY_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?,
            None => 0,
        };

        let store = match (get("DATA_STORE_URL"), get("DATA_STORE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(StoreConfig {
                url: Url::parse(&url).map_err(|_| ConfigError::Invalid("DATA_STORE_URL"))?,
                anon_key,
            }),
            (Some(_), None) => return Err(ConfigError::Missing("DATA_STORE_ANON_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("DATA_STORE_URL")),
            (None, None) => None,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            idp_jwt_secret,
            impersonation_jwt_secret,
            impersonation_ttl_seconds,
            impersonation_cache_max_entries,
            access_token_leeway_seconds,
            store,
        })
    }

    pub fn impersonation_signing_secret(&self) -> &str {
        self.impersonation_jwt_secret
            .as_deref()
            .unwrap_or(&self.idp_jwt_secret)
    }
}

fn check_secret_strength(key: &'static str, secret: &str, env: AppEnv) -> Result<(), ConfigError> {
    if secret.len() >= MIN_SECRET_LEN {
        return Ok(());
    }
    if env.is_production() {
        return Err(ConfigError::WeakSecret(key));
    }
    tracing::warn!(key, "secret is shorter than {} bytes", MIN_SECRET_LEN);
    Ok(())
}
