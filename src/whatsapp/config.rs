//! Configuration for the WhatsApp Business API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Verify token used when none is configured.
pub const DEFAULT_VERIFY_TOKEN: &str = "ispwatch-token";

/// Connection and credential settings for the provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// API base URL, e.g. `https://graph.facebook.com/v18.0/<phone-number-id>`.
    /// `None` switches the client to mock mode.
    pub base_url: Option<String>,
    /// Bearer token for the API.
    pub token: String,
    /// Shared secret expected during the webhook handshake.
    pub verify_token: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: String::new(),
            verify_token: DEFAULT_VERIFY_TOKEN.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl WhatsAppConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL. An empty value keeps mock mode.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url.trim().trim_end_matches('/');
        self.base_url = (!url.is_empty()).then(|| url.to_string());
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the webhook verify token.
    #[must_use]
    pub fn with_verify_token(mut self, token: impl Into<String>) -> Self {
        self.verify_token = token.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether sends are simulated.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        self.base_url.is_none()
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_mock() {
        let config = WhatsAppConfig::default();
        assert!(config.is_mock());
        assert_eq!(config.verify_token, DEFAULT_VERIFY_TOKEN);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder() {
        let config = WhatsAppConfig::new()
            .with_base_url("https://graph.facebook.com/v18.0/123/")
            .with_token("secret")
            .with_verify_token("verify-me")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(
            config.base_url.as_deref(),
            Some("https://graph.facebook.com/v18.0/123")
        );
        assert_eq!(config.token, "secret");
        assert_eq!(config.verify_token, "verify-me");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(!config.is_mock());
    }

    #[test]
    fn test_blank_base_url_stays_mock() {
        assert!(WhatsAppConfig::new().with_base_url("  ").is_mock());
    }

    #[test]
    fn test_timeouts_serialize_as_seconds() {
        let json = serde_json::to_value(WhatsAppConfig::default()).unwrap();
        assert_eq!(json["request_timeout"], 30);
        assert_eq!(json["connect_timeout"], 10);
    }
}
