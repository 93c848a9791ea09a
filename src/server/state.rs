//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::inbox::{Inbox, JsonFileStore, MessageStore, ValidationRules};
use crate::whatsapp::{MessageSender, WhatsAppClient};

/// Shared application state.
pub struct AppState {
    /// Conversation store and sender.
    pub inbox: Inbox,
    /// Shared secret for the webhook handshake.
    pub verify_token: String,
    /// Outbound submission rules.
    pub validation: ValidationRules,
}

impl AppState {
    /// Build state from explicit collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn MessageStore>,
        sender: Arc<dyn MessageSender>,
        verify_token: impl Into<String>,
        validation: ValidationRules,
    ) -> Arc<Self> {
        Arc::new(Self {
            inbox: Inbox::new(store, sender),
            verify_token: verify_token.into(),
            validation,
        })
    }

    /// Open the message log and build the provider client from configuration.
    ///
    /// # Errors
    /// Returns an error if the log cannot be loaded or the client cannot be built.
    pub async fn from_config(
        config: &AppConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let store = JsonFileStore::open(&config.store.path)
            .await
            .map_err(|e| format!("Failed to open message log: {e}"))?;
        let client = WhatsAppClient::new(&config.whatsapp)
            .map_err(|e| format!("Failed to create WhatsApp client: {e}"))?;

        Ok(Self::new(
            Arc::new(store),
            Arc::new(client),
            config.whatsapp.verify_token.clone(),
            config.validation.clone(),
        ))
    }
}
