use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    api::AppState,
    error::AppResult,
    middleware::AuthUser,
    services::onboarding,
};

/// Overwrites the caller's onboarding interests
pub async fn user_interests(
    State(state): State<AppState>,
    user: AuthUser,
    Json(interests): Json<Value>,
) -> AppResult<Json<Value>> {
    tracing::info!(user_id = %user.user_id, "Storing interests");

    onboarding::submit_interests(
        state.store.clone(),
        state.chat_model.clone(),
        &user.user_id,
        interests,
    )
    .await?;

    Ok(Json(json!({ "success": true, "message": "Interests updated" })))
}

/// Gate for the onboarding flow: 403 once the user has completed it
pub async fn onboarding(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<Value>)> {
    if state.store.is_onboarded(&user.user_id).await? {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "User already onboarded" })),
        ));
    }

    Ok((StatusCode::OK, Json(json!({ "message": "Onboarding allowed" }))))
}
