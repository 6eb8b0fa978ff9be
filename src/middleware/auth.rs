use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    api::AppState,
    error::AppError,
    models::UserId,
    services::auth::bearer_token,
};

/// Authenticated caller, resolved from the bearer token
///
/// Handlers that take this extractor reject the request with 401 before
/// touching any user-scoped data.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_string()))?;

        let user_id = state.token_verifier.verify(token)?;

        Ok(Self { user_id })
    }
}
