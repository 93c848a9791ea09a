//! Persisted message records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phone::normalize;

/// Direction of a stored message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Sent by this system through the provider API.
    Sent,
    /// Received from a contact through the webhook.
    Received,
}

/// One entry of the message log. Never mutated after it is appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Record id: a UUID for outbound messages, the provider id for inbound ones.
    pub id: String,
    /// Normalized phone number of the contact.
    pub phone: String,
    /// Message text.
    pub message: String,
    /// Direction.
    pub status: MessageStatus,
    /// Creation time, written as RFC 3339 UTC.
    #[serde(with = "timestamp_serde")]
    pub created_at: DateTime<Utc>,
    /// Raw provider response for outbound messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_response: Option<String>,
}

impl MessageRecord {
    /// Build an outbound record with a fresh id.
    #[must_use]
    pub fn sent(
        phone: &str,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
        api_response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone: normalize(phone),
            message: message.into(),
            status: MessageStatus::Sent,
            created_at,
            api_response: Some(api_response.into()),
        }
    }

    /// Build an inbound record keyed by the provider's message id.
    #[must_use]
    pub fn received(
        id: impl Into<String>,
        phone: &str,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            phone: normalize(phone),
            message: message.into(),
            status: MessageStatus::Received,
            created_at,
            api_response: None,
        }
    }
}

/// Serde module for record timestamps.
///
/// Writes RFC 3339 in UTC. Reads RFC 3339 or the legacy `YYYY-MM-DD HH:MM:SS`
/// form (taken as UTC); anything else is a deserialization error.
pub(crate) mod timestamp_serde {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Legacy wall-clock format found in older message logs.
    const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
    }

    /// Parse a stored timestamp.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}
