use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/quorum.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret shared with the identity provider for signing session tokens.
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub refresh_threshold_seconds: u64,
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_seconds: 3600,
            refresh_threshold_seconds: 900,
            secure_cookies: true,
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist,
    /// then applies `QUORUM_*` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            Self::parse(&raw).with_context(|| format!("invalid config file {path}"))?
        } else {
            tracing::info!("config file {path} not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("QUORUM_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = var("QUORUM_DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = var("QUORUM_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            bail!("auth.jwt_secret must be set (or QUORUM_JWT_SECRET)");
        }
        if self.auth.refresh_threshold_seconds >= self.auth.jwt_expiry_seconds {
            bail!("auth.refresh_threshold_seconds must be below auth.jwt_expiry_seconds");
        }
        Ok(())
    }

    pub fn app_config(&self) -> quorum_core::AppConfig {
        quorum_core::AppConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            jwt_expiry_seconds: self.auth.jwt_expiry_seconds,
            refresh_threshold_seconds: self.auth.refresh_threshold_seconds,
            secure_cookies: self.auth.secure_cookies,
        }
    }
}
