use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::AppState,
    middleware::AuthUser,
    models::RecommendationEnvelope,
    services::recommendations,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub user_message: Option<String>,
}

/// Handler for the chat recommendation endpoint
pub async fn recommend(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationEnvelope>, (StatusCode, Json<Value>)> {
    let Some(message) = request
        .user_message
        .filter(|message| !message.trim().is_empty())
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing user message" })),
        ));
    };

    tracing::info!(user_id = %user.user_id, "Generating recommendations");

    recommendations::recommend(state.chat_model.as_ref(), &message)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.user_id, "Recommendation call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate recommendations" })),
            )
        })
}
