//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::inbox::ValidationRules;
use crate::whatsapp::WhatsAppConfig;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default location of the message log.
pub const DEFAULT_STORE_PATH: &str = "storage/messages.json";

/// Environment variable names.
pub mod env {
    /// HTTP port.
    pub const PORT: &str = "INBOX_PORT";
    /// Message log path.
    pub const STORE_PATH: &str = "INBOX_STORE_PATH";
    /// WhatsApp API base URL; unset or empty means mock mode.
    pub const API_URL: &str = "WHATSAPP_API_URL";
    /// WhatsApp API bearer token.
    pub const TOKEN: &str = "WHATSAPP_TOKEN";
    /// Webhook verify token.
    pub const VERIFY_TOKEN: &str = "WHATSAPP_VERIFY_TOKEN";
    /// Outbound request timeout in seconds.
    pub const TIMEOUT_SECS: &str = "WHATSAPP_TIMEOUT_SECS";
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is set but cannot be used.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Setting name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// A configured URL does not parse.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Message log settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON log file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP port.
    pub port: u16,
    /// Message log settings.
    pub store: StoreConfig,
    /// Provider settings.
    pub whatsapp: WhatsAppConfig,
    /// Outbound submission rules.
    pub validation: ValidationRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            validation: ValidationRules::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a value is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup(env::PORT) {
            config.port = parse_value(env::PORT, &port)?;
        }
        if let Some(path) = lookup(env::STORE_PATH).filter(|p| !p.trim().is_empty()) {
            config.store.path = PathBuf::from(path);
        }

        let mut whatsapp = config.whatsapp;
        if let Some(url) = lookup(env::API_URL) {
            whatsapp = whatsapp.with_base_url(url);
        }
        if let Some(token) = lookup(env::TOKEN) {
            whatsapp = whatsapp.with_token(token);
        }
        if let Some(token) = lookup(env::VERIFY_TOKEN).filter(|t| !t.is_empty()) {
            whatsapp = whatsapp.with_verify_token(token);
        }
        if let Some(secs) = lookup(env::TIMEOUT_SECS) {
            whatsapp = whatsapp.with_timeout(Duration::from_secs(parse_value(env::TIMEOUT_SECS, &secs)?));
        }
        config.whatsapp = whatsapp;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.whatsapp.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "whatsapp.request_timeout",
                value: "0".to_string(),
            });
        }

        let rules = &self.validation;
        if rules.min_phone_digits == 0 || rules.min_phone_digits > rules.max_phone_digits {
            return Err(ConfigError::InvalidValue {
                name: "validation.min_phone_digits",
                value: rules.min_phone_digits.to_string(),
            });
        }

        if let Some(base_url) = &self.whatsapp.base_url {
            Url::parse(base_url)?;
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}
