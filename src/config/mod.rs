use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Minimum length of the HMAC signing secret in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Upper bound for token and session lifetimes (one week).
const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_web_port")]
    pub web_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            web_port: default_web_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_web_port() -> u16 {
    5001
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite:./data/catalog.db` or `sqlite::memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:./data/catalog.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Shared HMAC-SHA256 secret. A random one is generated when absent,
    /// which invalidates all tokens on restart.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            audience: default_audience(),
            secret_key: default_secret_key(),
            expiry_minutes: default_expiry_minutes(),
        }
    }
}

fn default_issuer() -> String {
    "catalog-api".to_string()
}

fn default_audience() -> String {
    "catalog-clients".to_string()
}

fn default_secret_key() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn default_expiry_minutes() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
        }
    }
}

impl AuthConfig {
    pub fn uses_default_password(&self) -> bool {
        self.admin_password == default_admin_password()
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "password".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Base URL of the versioned catalog API, without a trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Mark the session cookie `Secure` (enable behind TLS)
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_session_cleanup_interval")]
    pub session_cleanup_interval_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_ttl_minutes: default_session_ttl_minutes(),
            request_timeout_secs: default_request_timeout_secs(),
            secure_cookies: false,
            session_cleanup_interval_secs: default_session_cleanup_interval(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_session_ttl_minutes() -> i64 {
    20
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_session_cleanup_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            auth: AuthConfig::default(),
            web: WebConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load the TOML file at `path` (defaults when it does not exist), then
    /// apply `CATALOG_*` environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Overlay values from the environment. `lookup` is injected so tests do
    /// not have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CATALOG_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("CATALOG_API_PORT") {
            self.server.api_port = v
                .parse()
                .with_context(|| format!("Invalid CATALOG_API_PORT: {}", v))?;
        }
        if let Some(v) = lookup("CATALOG_WEB_PORT") {
            self.server.web_port = v
                .parse()
                .with_context(|| format!("Invalid CATALOG_WEB_PORT: {}", v))?;
        }
        if let Some(v) = lookup("CATALOG_DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("CATALOG_JWT_ISSUER") {
            self.jwt.issuer = v;
        }
        if let Some(v) = lookup("CATALOG_JWT_AUDIENCE") {
            self.jwt.audience = v;
        }
        if let Some(v) = lookup("CATALOG_JWT_SECRET") {
            self.jwt.secret_key = v;
        }
        if let Some(v) = lookup("CATALOG_ADMIN_USERNAME") {
            self.auth.admin_username = v;
        }
        if let Some(v) = lookup("CATALOG_ADMIN_PASSWORD") {
            self.auth.admin_password = v;
        }
        if let Some(v) = lookup("CATALOG_API_BASE_URL") {
            self.web.api_base_url = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret_key.len() < MIN_SECRET_LEN {
            bail!(
                "jwt.secret_key must be at least {} bytes (got {})",
                MIN_SECRET_LEN,
                self.jwt.secret_key.len()
            );
        }
        if self.jwt.issuer.is_empty() || self.jwt.audience.is_empty() {
            bail!("jwt.issuer and jwt.audience must not be empty");
        }
        if !(1..=MAX_TTL_MINUTES).contains(&self.jwt.expiry_minutes) {
            bail!(
                "jwt.expiry_minutes must be between 1 and {} (got {})",
                MAX_TTL_MINUTES,
                self.jwt.expiry_minutes
            );
        }
        if !(1..=MAX_TTL_MINUTES).contains(&self.web.session_ttl_minutes) {
            bail!(
                "web.session_ttl_minutes must be between 1 and {} (got {})",
                MAX_TTL_MINUTES,
                self.web.session_ttl_minutes
            );
        }
        Ok(())
    }

    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.api_port)
    }

    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.web_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.api_port, 5000);
        assert_eq!(config.jwt.expiry_minutes, 30);
        assert_eq!(config.auth.admin_username, "admin");
        assert_eq!(config.jwt.secret_key.len(), 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            api_port = 9000

            [jwt]
            issuer = "shop"
            secret_key = "0123456789abcdef0123456789abcdef"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.api_port, 9000);
        assert_eq!(config.server.web_port, 5001);
        assert_eq!(config.jwt.issuer, "shop");
        assert_eq!(config.jwt.audience, "catalog-clients");
        assert_eq!(config.database.url, "sqlite:./data/catalog.db");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CATALOG_API_PORT", "7000"),
            ("CATALOG_DATABASE_URL", "sqlite::memory:"),
            ("CATALOG_JWT_SECRET", "an-injected-secret-that-is-long-enough"),
            ("CATALOG_API_BASE_URL", "http://api:80/api/v1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.api_port, 7000);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.jwt.secret_key, "an-injected-secret-that-is-long-enough");
        assert_eq!(config.web.api_base_url, "http://api:80/api/v1");
    }

    #[test]
    fn test_invalid_port_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|k| {
            (k == "CATALOG_API_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = Config::default();
        config.jwt.secret_key = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lifetimes_are_bounded() {
        let mut config = Config::default();
        config.jwt.expiry_minutes = MAX_TTL_MINUTES;
        config.web.session_ttl_minutes = MAX_TTL_MINUTES;
        assert!(config.validate().is_ok());

        config.jwt.expiry_minutes = i64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jwt.expiry_minutes"));

        config.jwt.expiry_minutes = 30;
        config.web.session_ttl_minutes = MAX_TTL_MINUTES + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("web.session_ttl_minutes"));

        config.web.session_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[auth]\nadmin_username = \"root\"\n[web]\nsession_ttl_minutes = 5"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.auth.admin_username, "root");
        assert_eq!(config.web.session_ttl_minutes, 5);
    }
}
