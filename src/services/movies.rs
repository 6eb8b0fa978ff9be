use futures::stream::{self, StreamExt};

use crate::{
    error::AppResult,
    models::{
        movie::pick_trailer, CatalogMovie, MovieId, MovieRecord, RecordShape, StoredRecommendation,
    },
    services::catalog::{with_genre_names, Catalog},
};

/// Search results shown to the client
const SEARCH_LIMIT: usize = 7;

/// Resolves a title/year pair into a featured record
///
/// Takes the first search hit. A missing hit and a failed vendor call are
/// treated alike: the title is skipped.
pub async fn movie_by_title_and_year(
    catalog: &dyn Catalog,
    title: &str,
    year: Option<i32>,
) -> Option<MovieRecord> {
    let hit = match catalog.search_movies(title, year).await {
        Ok(results) => results.into_iter().next(),
        Err(e) => {
            tracing::warn!(error = %e, title = %title, "Catalog search failed");
            None
        }
    };

    let Some(hit) = hit else {
        tracing::debug!(title = %title, year = ?year, "No catalog match, skipping");
        return None;
    };

    let details = match catalog.movie_details(hit.id).await {
        Ok(details) => details,
        Err(e) => {
            tracing::warn!(error = %e, movie_id = hit.id, "Catalog details failed");
            return None;
        }
    };
    let (credits, trailer) = tokio::join!(catalog.movie_credits(hit.id), trailer(catalog, hit.id));

    Some(MovieRecord::assemble(
        details,
        credits.ok().as_ref(),
        trailer,
        RecordShape::recommended(year.unwrap_or(0)),
    ))
}

/// Featured row for a user's stored recommendations, in stored order
pub async fn movies_for_recommendations(
    catalog: &dyn Catalog,
    recommendations: &[StoredRecommendation],
    concurrency: usize,
) -> Vec<MovieRecord> {
    let records: Vec<MovieRecord> = stream::iter(recommendations.iter().cloned())
        .map(|rec| async move {
            movie_by_title_and_year(catalog, &rec.name, rec.release_year).await
        })
        .buffered(concurrency.max(1))
        .filter_map(|record| async move { record })
        .collect()
        .await;

    tracing::info!(
        requested = recommendations.len(),
        resolved = records.len(),
        "Featured movies resolved"
    );

    records
}

/// Full record for the detail page
///
/// Details are required; credits and trailer fall back to defaults.
pub async fn movie_full(catalog: &dyn Catalog, id: MovieId) -> AppResult<MovieRecord> {
    let (details, credits, trailer) = tokio::join!(
        catalog.movie_details(id),
        catalog.movie_credits(id),
        trailer(catalog, id)
    );

    let credits = credits
        .map_err(|e| tracing::warn!(error = %e, movie_id = id, "Credits unavailable"))
        .ok();

    Ok(MovieRecord::assemble(
        details?,
        credits.as_ref(),
        trailer,
        RecordShape::full(),
    ))
}

/// Resolves watchlist ids with at most `concurrency` lookups in flight
///
/// Ids that fail to resolve are left out.
pub async fn movies_by_ids(
    catalog: &dyn Catalog,
    ids: &[MovieId],
    concurrency: usize,
) -> Vec<MovieRecord> {
    let results: Vec<(MovieId, AppResult<MovieRecord>)> = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, movie_full(catalog, id).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut records = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (id, result) in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::error!(error = %e, movie_id = id, "Watchlist item lookup failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!(
            success_count = records.len(),
            error_count = failed,
            "Partial watchlist resolution"
        );
    }

    records
}

pub async fn trending(catalog: &dyn Catalog) -> AppResult<Vec<CatalogMovie>> {
    let movies = catalog.trending_movies().await?;
    Ok(with_genre_names(catalog, movies).await)
}

/// Poster-bearing hits, most popular first, capped at [`SEARCH_LIMIT`]
pub async fn search(catalog: &dyn Catalog, term: &str) -> AppResult<Vec<CatalogMovie>> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let mut movies: Vec<CatalogMovie> = catalog
        .search_movies(term, None)
        .await?
        .into_iter()
        .filter(|movie| movie.poster_path.as_deref().is_some_and(|p| !p.is_empty()))
        .collect();
    movies.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    movies.truncate(SEARCH_LIMIT);

    Ok(with_genre_names(catalog, movies).await)
}

async fn trailer(catalog: &dyn Catalog, id: MovieId) -> Option<String> {
    match catalog.movie_videos(id).await {
        Ok(videos) => pick_trailer(&videos),
        Err(e) => {
            tracing::warn!(error = %e, movie_id = id, "Videos unavailable");
            None
        }
    }
}
