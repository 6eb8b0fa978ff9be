use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    services::webhook::{UserEvent, UserEventKind, WebhookHeaders},
};

fn svix_header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::InvalidWebhook(format!("missing {} header", name)))
}

/// Handler for the auth provider's user lifecycle webhook
///
/// The signature covers the raw body, so the payload is only parsed after
/// verification.
pub async fn user_register_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signed = WebhookHeaders {
        id: svix_header(&headers, "svix-id")?,
        timestamp: svix_header(&headers, "svix-timestamp")?,
        signature: svix_header(&headers, "svix-signature")?,
    };
    state.webhook_verifier.verify(signed, &body)?;

    let event: UserEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidWebhook(format!("unreadable payload: {}", e)))?;

    tracing::info!(
        event_type = %event.event_type,
        user_id = %event.data.id,
        "Webhook received"
    );

    match event.kind() {
        UserEventKind::Created => {
            state
                .store
                .put_profile(&event.data.id, &event.data.profile())
                .await?;
            Ok(Json(json!({ "success": true })))
        }
        UserEventKind::Updated => {
            state
                .store
                .put_profile(&event.data.id, &event.data.profile())
                .await?;
            Ok(Json(json!({ "success": true, "message": "User updated" })))
        }
        UserEventKind::Other => Ok(Json(json!({ "success": true, "message": "Event ignored" }))),
    }
}
