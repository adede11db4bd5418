/// Configuration management for Vistagram Service
use actix_middleware::RateLimitConfig;
use anyhow::{anyhow, bail, Context, Result};
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

const DEV_JWT_SECRET: &str = "vistagram-development-secret-do-not-use-in-production";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(anyhow!("unknown APP_ENV '{other}'")),
        }
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown STORAGE_BACKEND '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown LOG_FORMAT '{other}'")),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub host: String,
    pub port: u16,
    /// Public address of the web client, used for share links
    pub client_url: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2)
    pub endpoint: Option<String>,
    /// Base URL objects are publicly served from
    pub public_base_url: String,
    pub key_prefix: String,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env: Environment = parse_or(&var, "APP_ENV", Environment::Development)?;
        let client_url = var("CLIENT_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let app = AppConfig {
            env,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "APP_PORT", 5000)?,
            client_url: client_url.clone(),
        };

        let allowed_origins: Vec<String> = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or(client_url)
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if env == Environment::Production && allowed_origins.iter().any(|o| o == "*") {
            bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
        }

        let database = DatabaseConfig {
            url: var("DATABASE_URL").context("DATABASE_URL environment variable not set")?,
            max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 20)?,
            min_connections: parse_or(&var, "DB_MIN_CONNECTIONS", 2)?,
        };

        let jwt_secret = match (var("JWT_SECRET"), env) {
            (Some(secret), Environment::Production) if secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                bail!("JWT_SECRET must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production")
            }
            (Some(secret), _) => secret,
            (None, Environment::Production) => bail!("JWT_SECRET must be set in production"),
            (None, Environment::Development) => {
                tracing::warn!("JWT_SECRET not set, using the development fallback secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let auth = AuthConfig {
            jwt_secret,
            token_ttl_hours: parse_or(&var, "JWT_EXPIRY_HOURS", 168)?,
        };
        if auth.token_ttl_hours <= 0 {
            bail!("JWT_EXPIRY_HOURS must be positive");
        }

        let bucket = var("S3_BUCKET").unwrap_or_else(|| "vistagram-images".to_string());
        let region = var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string());
        let endpoint = var("S3_ENDPOINT");
        let public_base_url = var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|| match &endpoint {
                Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
                None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
            })
            .trim_end_matches('/')
            .to_string();

        let storage = StorageConfig {
            backend: parse_or(&var, "STORAGE_BACKEND", StorageBackend::S3)?,
            bucket,
            region,
            endpoint,
            public_base_url,
            key_prefix: var("S3_KEY_PREFIX").unwrap_or_else(|| "vistagram".to_string()),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&var, "RATE_LIMIT_MAX_REQUESTS", defaults.max_requests)?,
            window_seconds: parse_or(&var, "RATE_LIMIT_WINDOW_SECS", defaults.window_seconds)?,
            trusted_proxies: parse_ip_list(var("TRUSTED_PROXIES").as_deref(), "TRUSTED_PROXIES")?,
        };
        if rate_limit.max_requests == 0 || rate_limit.window_seconds == 0 {
            bail!("rate limit values must be positive");
        }

        Ok(Config {
            app,
            cors: CorsConfig { allowed_origins },
            database,
            auth,
            storage,
            rate_limit,
            log_format: parse_or(&var, "LOG_FORMAT", LogFormat::Text)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == Environment::Production
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.app.host.clone(), self.app.port)
    }

    pub fn share_url(&self, post_id: Uuid) -> String {
        share_url(&self.app.client_url, post_id)
    }
}

/// Public link to a post on the web client
pub fn share_url(client_url: &str, post_id: Uuid) -> String {
    format!("{}/post/{}", client_url.trim_end_matches('/'), post_id)
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {key} ('{raw}'): {e}")),
        None => Ok(default),
    }
}

fn parse_ip_list(raw: Option<&str>, key: &str) -> Result<Vec<IpAddr>> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse()
                .map_err(|e| anyhow!("invalid value for {key} ('{entry}'): {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/vistagram")]).unwrap();

        assert_eq!(config.app.env, Environment::Development);
        assert_eq!(config.app.port, 5000);
        assert_eq!(config.app.client_url, "http://localhost:3000");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_seconds, 900);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(
            config.storage.public_base_url,
            "https://vistagram-images.s3.us-east-1.amazonaws.com"
        );
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.rate_limit.trusted_proxies.is_empty());
    }

    #[test]
    fn test_trusted_proxies_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("TRUSTED_PROXIES", "10.0.0.1, ::1"),
        ])
        .unwrap();
        let expected: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        assert_eq!(config.rate_limit.trusted_proxies, expected);

        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("TRUSTED_PROXIES", "10.0.0.0/8"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("TRUSTED_PROXIES"));
    }

    #[test]
    fn test_database_url_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("APP_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn test_client_url_trailing_slash_trimmed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("CLIENT_URL", "https://vistagram.app/"),
        ])
        .unwrap();
        assert_eq!(config.app.client_url, "https://vistagram.app");

        let id = Uuid::nil();
        assert_eq!(
            config.share_url(id),
            "https://vistagram.app/post/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_production_requires_strong_secret() {
        let base = [
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://vistagram.app"),
        ];
        assert!(config_from(&base).is_err());

        let mut weak = base.to_vec();
        weak.push(("JWT_SECRET", "short"));
        assert!(config_from(&weak).is_err());

        let mut strong = base.to_vec();
        strong.push(("JWT_SECRET", "0123456789abcdef0123456789abcdef"));
        assert!(config_from(&strong).unwrap().is_production());
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("CORS_ALLOWED_ORIGINS", "*"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("CORS"));
    }

    #[test]
    fn test_custom_endpoint_public_url() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vistagram"),
            ("S3_ENDPOINT", "http://localhost:9000/"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.public_base_url, "http://localhost:9000/vistagram-images");
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/vistagram_env_test");
        std::env::set_var("APP_PORT", "5055");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 5055);

        std::env::remove_var("APP_PORT");
        std::env::remove_var("DATABASE_URL");
    }
}
