//! Per-contact conversation views derived from the flat message log.

use std::collections::HashMap;

use serde::Serialize;

use super::phone::normalize;
use super::record::MessageRecord;

/// All messages exchanged with one normalized phone number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conversation {
    /// Normalized phone number shared by every message.
    pub phone: String,
    /// Messages in ascending `created_at` order.
    pub messages: Vec<MessageRecord>,
    /// Chronologically last message.
    pub last_message: MessageRecord,
}

/// Conversation selected for display.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActiveConversation {
    /// Normalized phone of the active conversation, if any.
    pub phone: Option<String>,
    /// Its messages; empty when the phone has no history.
    pub messages: Vec<MessageRecord>,
}

/// Group a message log into conversations ordered by most recent activity.
///
/// Both sorts are stable: messages with equal timestamps keep log order, and
/// conversations whose last messages tie keep the order in which they first
/// appeared in the log.
#[must_use]
pub fn group(messages: &[MessageRecord]) -> Vec<Conversation> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<MessageRecord>> = HashMap::new();

    for message in messages {
        let phone = normalize(&message.phone);
        buckets
            .entry(phone.clone())
            .or_insert_with(|| {
                order.push(phone);
                Vec::new()
            })
            .push(message.clone());
    }

    let mut conversations: Vec<Conversation> = order
        .into_iter()
        .filter_map(|phone| {
            let mut messages = buckets.remove(&phone)?;
            messages.sort_by_key(|m| m.created_at);
            let last_message = messages.last()?.clone();
            Some(Conversation {
                phone,
                messages,
                last_message,
            })
        })
        .collect();

    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    conversations
}

/// Pick the conversation to display.
///
/// A requested phone is normalized and looked up; an unknown phone still
/// becomes the active phone with no messages. Without a request the most
/// recent conversation wins.
#[must_use]
pub fn select_active(
    conversations: &[Conversation],
    requested_phone: Option<&str>,
) -> ActiveConversation {
    match requested_phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => {
            let phone = normalize(raw);
            let messages = conversations
                .iter()
                .find(|c| c.phone == phone)
                .map(|c| c.messages.clone())
                .unwrap_or_default();
            ActiveConversation {
                phone: Some(phone),
                messages,
            }
        }
        None => conversations
            .first()
            .map(|c| ActiveConversation {
                phone: Some(c.phone.clone()),
                messages: c.messages.clone(),
            })
            .unwrap_or_default(),
    }
}
