//! Server configuration.

use std::env;

use anyhow::Context;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL, or `memory` for the in-memory store.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// JWT expiration in hours.
    pub jwt_expiration_hours: u64,
    /// Lifetime of a password reset token in minutes.
    pub reset_token_ttl_minutes: i64,
    /// Base URL used to build links sent by e-mail.
    pub public_url: String,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Creates a configuration with default values and the given secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:readlog.db?mode=rwc".to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: auth::DEFAULT_JWT_EXPIRATION_HOURS,
            reset_token_ttl_minutes: 60,
            public_url: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("READLOG_JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .context("READLOG_JWT_SECRET is required")?;

        let mut config = Self::new(jwt_secret);

        if let Some(host) = lookup("READLOG_SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("READLOG_SERVER_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("Invalid READLOG_SERVER_PORT: {port}"))?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(hours) = lookup("READLOG_JWT_EXPIRATION_HOURS") {
            config.jwt_expiration_hours = hours
                .parse()
                .with_context(|| format!("Invalid READLOG_JWT_EXPIRATION_HOURS: {hours}"))?;
        }
        if let Some(minutes) = lookup("READLOG_RESET_TOKEN_TTL_MINUTES") {
            config.reset_token_ttl_minutes = minutes
                .parse()
                .with_context(|| format!("Invalid READLOG_RESET_TOKEN_TTL_MINUTES: {minutes}"))?;
        }
        if let Some(url) = lookup("READLOG_PUBLIC_URL") {
            config.public_url = url;
        }
        if let Some(level) = lookup("READLOG_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if the in-memory store was requested.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.eq_ignore_ascii_case("memory")
    }

    /// Builds the link mailed to a user who asked to reset their password.
    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.public_url.trim_end_matches('/'),
            token
        )
    }
}
