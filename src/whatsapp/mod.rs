//! WhatsApp Business (Cloud) API integration.
//!
//! - Outbound text messages (`client`)
//! - Inbound webhook parsing and verification handshake (`webhook`)

pub mod client;
pub mod config;
pub mod error;
pub mod webhook;

pub use client::{MessageSender, ProviderResponse, WhatsAppClient};
pub use config::WhatsAppConfig;
pub use error::SendError;
pub use webhook::{InboundMessage, VerifyQuery};
