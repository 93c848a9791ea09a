//! Webhook payload parsing and the subscription handshake.
//!
//! Cloud API callbacks look like:
//! `{ "object": "whatsapp_business_account", "entry": [{ "changes": [{ "value": { "messages": [...] } }] }] }`
//!
//! Only the first message of the first change of the first entry is read.

use serde::Deserialize;
use serde_json::Value;

/// Mode the provider sends when subscribing a webhook.
const SUBSCRIBE_MODE: &str = "subscribe";

/// Text message extracted from a callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Provider message id (`wamid...`).
    pub id: String,
    /// Sender phone as delivered by the provider.
    pub from: String,
    /// Text body; empty for non-text messages.
    pub body: String,
}

/// Query parameters of the handshake request.
///
/// Accepts both the provider's dotted names (`hub.mode`) and the underscored
/// form (`hub_mode`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VerifyQuery {
    /// Requested mode, expected to be `subscribe`.
    #[serde(rename = "hub.mode", alias = "hub_mode")]
    pub mode: Option<String>,
    /// Shared secret presented by the provider.
    #[serde(rename = "hub.verify_token", alias = "hub_verify_token")]
    pub verify_token: Option<String>,
    /// Value to echo back on success.
    #[serde(rename = "hub.challenge", alias = "hub_challenge")]
    pub challenge: Option<String>,
}

/// Check a handshake request and return the challenge to echo on success.
#[must_use]
pub fn verify(query: &VerifyQuery, expected_token: &str) -> Option<String> {
    let subscribed = query.mode.as_deref() == Some(SUBSCRIBE_MODE);
    let token_matches = query.verify_token.as_deref() == Some(expected_token);

    (subscribed && token_matches).then(|| query.challenge.clone().unwrap_or_default())
}

/// Read `entry[0].changes[0].value.messages[0]` from a callback payload.
///
/// Returns `None` when the path is missing or the message has no `id` or
/// `from`. A missing `text.body` yields an empty body.
#[must_use]
pub fn extract_message(payload: &Value) -> Option<InboundMessage> {
    let message = payload
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)?;

    let id = message.get("id")?.as_str()?;
    let from = message.get("from")?.as_str()?;
    let body = message
        .get("text")
        .and_then(|t| t.get("body"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(InboundMessage {
        id: id.to_string(),
        from: from.to_string(),
        body: body.to_string(),
    })
}
