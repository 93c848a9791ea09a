//! Conversation store for the WhatsApp inbox.
//!
//! This module owns the message log and everything derived from it:
//! - Phone-number normalization and outbound validation
//! - Append-only JSON persistence
//! - Grouping into per-contact conversations
//! - Active conversation selection

pub mod conversation;
pub mod error;
pub mod phone;
pub mod record;
pub mod store;

pub use conversation::{ActiveConversation, Conversation, group, select_active};
pub use error::{InboxError, InboxResult, StoreError, StoreResult};
pub use phone::{ValidationErrors, ValidationRules, normalize, validate_outbound};
pub use record::{MessageRecord, MessageStatus};
pub use store::{AppendOutcome, JsonFileStore, MessageStore};

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::whatsapp::MessageSender;
use crate::whatsapp::webhook::extract_message;

/// Everything the dashboard shows at once.
#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    /// Conversations, most recent first.
    pub conversations: Vec<Conversation>,
    /// Messages of the active conversation.
    pub active_chat: Vec<MessageRecord>,
    /// Normalized phone of the active conversation.
    pub active_phone: Option<String>,
}

/// What happened to an inbound webhook callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A new received message was stored.
    Stored(MessageRecord),
    /// The provider redelivered a message already in the log.
    Duplicate,
    /// The payload carried no message.
    Ignored,
}

/// Inbox service tying the message log to the outbound sender.
pub struct Inbox {
    store: Arc<dyn MessageStore>,
    sender: Arc<dyn MessageSender>,
}

impl Inbox {
    /// Create an inbox over a store and a sender.
    #[must_use]
    pub const fn new(store: Arc<dyn MessageStore>, sender: Arc<dyn MessageSender>) -> Self {
        Self { store, sender }
    }

    /// Build the conversation list and the active conversation.
    ///
    /// # Errors
    /// Returns an error if the log cannot be read.
    pub async fn dashboard(&self, requested_phone: Option<&str>) -> InboxResult<Dashboard> {
        let messages = self.store.load_all().await?;
        let conversations = group(&messages);
        let active = select_active(&conversations, requested_phone);

        Ok(Dashboard {
            conversations,
            active_chat: active.messages,
            active_phone: active.phone,
        })
    }

    /// Send a text and record it once the provider accepts it.
    ///
    /// Nothing is stored when the send fails.
    ///
    /// # Errors
    /// Returns an error if the send fails or the log cannot be written.
    pub async fn send_message(&self, phone: &str, text: &str) -> InboxResult<MessageRecord> {
        let phone = normalize(phone);
        let response = self.sender.send(&phone, text).await?;

        let record = MessageRecord::sent(&phone, text, Utc::now(), response.as_api_response());
        self.store.append(record.clone()).await?;
        info!("Sent message {} to {}", record.id, record.phone);
        Ok(record)
    }

    /// Store the message carried by a webhook callback, if any.
    ///
    /// # Errors
    /// Returns an error if the log cannot be written.
    pub async fn receive_webhook(&self, payload: &Value) -> InboxResult<WebhookOutcome> {
        info!("Webhook received: {payload}");

        let Some(inbound) = extract_message(payload) else {
            warn!("Webhook received but no messages found in payload: {payload}");
            return Ok(WebhookOutcome::Ignored);
        };

        let record = MessageRecord::received(inbound.id, &inbound.from, inbound.body, Utc::now());
        match self.store.append(record.clone()).await? {
            AppendOutcome::Appended => {
                info!("Stored message {} from {}", record.id, record.phone);
                Ok(WebhookOutcome::Stored(record))
            }
            AppendOutcome::Duplicate => Ok(WebhookOutcome::Duplicate),
        }
    }
}
