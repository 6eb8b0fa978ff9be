//! Movie catalog abstraction
//!
//! The catalog answers searches and id lookups. Record assembly on top of
//! these primitives lives in `services::movies`, so a catalog only has to
//! return the vendor's own shapes.

use std::collections::HashMap;

use tracing::instrument;

use crate::{
    error::AppResult,
    models::{CatalogMovie, Credits, MovieDetails, MovieId, Video},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Search movies by title, optionally narrowed to a release year
    async fn search_movies(&self, query: &str, year: Option<i32>) -> AppResult<Vec<CatalogMovie>>;

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails>;

    async fn movie_credits(&self, id: MovieId) -> AppResult<Credits>;

    async fn movie_videos(&self, id: MovieId) -> AppResult<Vec<Video>>;

    /// Today's trending movies
    async fn trending_movies(&self) -> AppResult<Vec<CatalogMovie>>;

    /// Genre id → name table
    async fn genre_names(&self) -> AppResult<HashMap<u64, String>>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}

/// Fills `genre` on each hit from its `genre_ids`
///
/// Unknown ids are dropped. When the genre table cannot be loaded the hits are
/// returned without names.
#[instrument(skip_all, fields(count = movies.len()))]
pub async fn with_genre_names(
    catalog: &dyn Catalog,
    mut movies: Vec<CatalogMovie>,
) -> Vec<CatalogMovie> {
    let genres = match catalog.genre_names().await {
        Ok(genres) => genres,
        Err(e) => {
            tracing::warn!(error = %e, catalog = catalog.name(), "Genre list unavailable");
            return movies;
        }
    };

    for movie in &mut movies {
        movie.genre = movie
            .genre_ids
            .iter()
            .filter_map(|id| genres.get(id).cloned())
            .collect();
    }

    movies
}
