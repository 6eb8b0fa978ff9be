use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::AppResult,
    middleware::AuthUser,
    models::{CatalogMovie, MovieId, MovieRecord},
    services::movies,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub search_term: String,
}

/// Movies derived from the caller's stored recommendations
pub async fn featured(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<MovieRecord>>> {
    let recommendations = state.store.recommendations(&user.user_id).await?;
    if recommendations.is_empty() {
        tracing::info!(user_id = %user.user_id, "No stored recommendations");
        return Ok(Json(Vec::new()));
    }

    let records = movies::movies_for_recommendations(
        state.catalog.as_ref(),
        &recommendations,
        state.fanout_concurrency,
    )
    .await;

    Ok(Json(records))
}

pub async fn trending(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<CatalogMovie>>> {
    let movies = movies::trending(state.catalog.as_ref()).await?;
    Ok(Json(movies))
}

/// Handler for title search; open to anonymous visitors
pub async fn search_movies(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<Vec<CatalogMovie>>> {
    tracing::info!(search_term = %request.search_term, "Searching movies");
    let movies = movies::search(state.catalog.as_ref(), &request.search_term).await?;
    Ok(Json(movies))
}

pub async fn movie_full(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<MovieRecord>> {
    let record = movies::movie_full(state.catalog.as_ref(), movie_id).await?;
    Ok(Json(record))
}
