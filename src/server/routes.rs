//! HTTP route handlers for the inbox API.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::inbox::{Dashboard, InboxError, MessageRecord, validate_outbound};
use crate::whatsapp::VerifyQuery;
use crate::whatsapp::webhook::verify;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/conversations", get(list_conversations))
        .route("/api/messages", post(send_message))
        .route("/webhook", get(verify_webhook).post(handle_webhook))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "whatsapp-inbox",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Error body for failed requests.
fn internal_error(err: &InboxError) -> Response {
    error!("Request failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Conversation list query.
#[derive(Debug, Default, Deserialize)]
pub struct ConversationsQuery {
    /// Phone of the conversation to open.
    pub phone: Option<String>,
}

/// List conversations and the active chat.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<Dashboard>, Response> {
    state
        .inbox
        .dashboard(query.phone.as_deref())
        .await
        .map(Json)
        .map_err(|e| internal_error(&e))
}

/// Outbound message submission.
///
/// Read from the raw body so that a missing content type, a malformed body or
/// a wrongly typed field all end up as field errors instead of extractor
/// rejections.
#[derive(Debug, Default)]
pub struct SendRequest {
    /// Recipient phone, digits only.
    pub phone: String,
    /// Message text.
    pub message: String,
}

impl SendRequest {
    /// Decode a submission body. Anything that is not a JSON object yields
    /// empty fields.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };
        Self {
            phone: field_text(fields.get("phone")),
            message: field_text(fields.get("message")),
        }
    }
}

/// Strings are taken as is and numbers by their decimal digits.
fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Successful send response.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// Always `sent`.
    pub status: &'static str,
    /// Normalized phone the message went to.
    pub phone: String,
    /// Stored record.
    pub record: MessageRecord,
}

/// Validate, send and record an outbound message.
async fn send_message(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = SendRequest::from_body(&body);
    if let Err(errors) = validate_outbound(&request.phone, &request.message, &state.validation) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response();
    }

    match state.inbox.send_message(&request.phone, &request.message).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(SendResponse {
                status: "sent",
                phone: record.phone.clone(),
                record,
            }),
        )
            .into_response(),
        Err(InboxError::Send(err)) => {
            let errors = BTreeMap::from([("message", format!("Failed to send message: {err}"))]);
            (StatusCode::BAD_GATEWAY, Json(json!({ "errors": errors }))).into_response()
        }
        Err(err) => internal_error(&err),
    }
}

/// Webhook subscription handshake. Any failure, including an unreadable
/// query string, is a 403.
async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Response {
    let challenge = match query {
        Ok(Query(query)) => verify(&query, &state.verify_token),
        Err(rejection) => {
            warn!("Rejected webhook handshake query: {rejection}");
            None
        }
    };

    match challenge {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
    }
}

/// Inbound webhook events. Always acknowledged.
async fn handle_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    if let Err(err) = state.inbox.receive_webhook(&payload).await {
        error!("Failed to store webhook message: {err}");
    }

    Json(json!({ "status": "EVENT_RECEIVED" })).into_response()
}
