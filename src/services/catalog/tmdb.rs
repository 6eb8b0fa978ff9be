//! TMDB catalog
//!
//! API Flow:
//! 1. Search: /search/movie?query=&year= → candidate ids
//! 2. Details: /movie/{id}, /movie/{id}/credits, /movie/{id}/videos
//! 3. Lists: /trending/movie/day, /genre/movie/list
//!
//! Authenticates with a v4 read access token sent as a bearer header.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::{
    error::{AppError, AppResult},
    models::{
        movie::{GenreList, SearchResults, VideoList},
        CatalogMovie, Credits, MovieDetails, MovieId, Video,
    },
    services::catalog::Catalog,
};

const LANGUAGE: &str = "en-US";

pub struct TmdbCatalog {
    http_client: HttpClient,
    api_token: String,
    api_url: String,
    /// Loaded on first use and kept for the life of the process
    genres: OnceCell<HashMap<u64, String>>,
}

impl TmdbCatalog {
    pub fn new(api_token: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        if api_token.trim().is_empty() {
            return Err(AppError::Internal("TMDB API token cannot be empty".to_string()));
        }

        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            genres: OnceCell::new(),
        })
    }

    /// GET helper that checks status and decodes the JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource not found: {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API {} returned status {}: {}",
                path, status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse TMDB response from {}: {}", path, e))
        })
    }

    fn language() -> (&'static str, String) {
        ("language", LANGUAGE.to_string())
    }
}

#[async_trait::async_trait]
impl Catalog for TmdbCatalog {
    async fn search_movies(&self, query: &str, year: Option<i32>) -> AppResult<Vec<CatalogMovie>> {
        let mut params = vec![("query", query.to_string()), Self::language()];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let results: SearchResults = self.get("/search/movie", &params).await?;

        tracing::info!(
            query = %query,
            year = ?year,
            results = results.results.len(),
            catalog = self.name(),
            "Movie search completed"
        );

        Ok(results.results)
    }

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        self.get(&format!("/movie/{}", id), &[Self::language()]).await
    }

    async fn movie_credits(&self, id: MovieId) -> AppResult<Credits> {
        self.get(&format!("/movie/{}/credits", id), &[Self::language()])
            .await
    }

    async fn movie_videos(&self, id: MovieId) -> AppResult<Vec<Video>> {
        let videos: VideoList = self
            .get(&format!("/movie/{}/videos", id), &[Self::language()])
            .await?;
        Ok(videos.results)
    }

    async fn trending_movies(&self) -> AppResult<Vec<CatalogMovie>> {
        let trending: SearchResults = self
            .get("/trending/movie/day", &[Self::language()])
            .await?;

        tracing::info!(
            results = trending.results.len(),
            catalog = self.name(),
            "Trending movies fetched"
        );

        Ok(trending.results)
    }

    async fn genre_names(&self) -> AppResult<HashMap<u64, String>> {
        let genres = self
            .genres
            .get_or_try_init(|| async {
                let list: GenreList = self
                    .get("/genre/movie/list", &[("language", "en".to_string())])
                    .await?;
                tracing::info!(genres = list.genres.len(), "Loaded TMDB genre list");
                Ok::<_, AppError>(list.genres.into_iter().map(|g| (g.id, g.name)).collect())
            })
            .await?;

        Ok(genres.clone())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
