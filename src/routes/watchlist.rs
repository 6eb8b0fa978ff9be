use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{MovieId, MovieRecord, WatchlistAction},
    services::movies,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistUpdateRequest {
    #[serde(default)]
    pub movie_id: Option<MovieId>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WatchlistResponse<T> {
    pub watchlist: Vec<T>,
}

/// Adds or removes a movie; responds with the updated ids
pub async fn update_watchlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<WatchlistUpdateRequest>,
) -> AppResult<Json<WatchlistResponse<MovieId>>> {
    let (Some(movie_id), Some(action)) = (request.movie_id.filter(|id| *id != 0), request.action)
    else {
        return Err(AppError::InvalidInput("Missing movieId or action".to_string()));
    };
    let action = WatchlistAction::parse(&action)
        .ok_or_else(|| AppError::InvalidInput("Invalid action".to_string()))?;

    let watchlist = match action {
        WatchlistAction::Add => state.store.add_to_watchlist(&user.user_id, movie_id).await?,
        WatchlistAction::Remove => {
            state
                .store
                .remove_from_watchlist(&user.user_id, movie_id)
                .await?
        }
    };

    tracing::info!(
        user_id = %user.user_id,
        movie_id,
        action = ?action,
        size = watchlist.len(),
        "Watchlist updated"
    );

    Ok(Json(WatchlistResponse { watchlist }))
}

pub async fn get_watchlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<WatchlistResponse<MovieId>>> {
    let watchlist = state.store.watchlist(&user.user_id).await?;
    Ok(Json(WatchlistResponse { watchlist }))
}

/// Watchlist resolved to full movie records
pub async fn watchlist_data(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<WatchlistResponse<MovieRecord>>> {
    let ids = state.store.watchlist(&user.user_id).await?;
    let watchlist =
        movies::movies_by_ids(state.catalog.as_ref(), &ids, state.fanout_concurrency).await;

    tracing::info!(
        user_id = %user.user_id,
        requested = ids.len(),
        resolved = watchlist.len(),
        "Watchlist resolved"
    );

    Ok(Json(WatchlistResponse { watchlist }))
}
