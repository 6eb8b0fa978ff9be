use serde::{Deserialize, Serialize};

use super::MovieId;

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

/// Popularity above which a title is flagged as trending
const TRENDING_POPULARITY: f64 = 50.0;

// ============================================================================
// TMDB API Types
// ============================================================================

/// A search or trending hit, passed through to the client with TMDB field names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    /// Genre names resolved from `genre_ids`
    #[serde(default)]
    pub genre: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<CatalogMovie>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// `/movie/{id}` response
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct MovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub revenue: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

/// `/movie/{id}/credits` response; cast is in billing order
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl Credits {
    pub fn director(&self) -> Option<&str> {
        self.crew
            .iter()
            .find(|person| person.job == "Director")
            .map(|person| person.name.as_str())
    }

    pub fn top_cast(&self, limit: usize) -> Vec<String> {
        self.cast
            .iter()
            .take(limit)
            .map(|actor| actor.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Video {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Key of the first YouTube trailer, if any
pub fn pick_trailer(videos: &[Video]) -> Option<String> {
    videos
        .iter()
        .find(|video| video.site == "YouTube" && video.video_type == "Trailer")
        .map(|video| video.key.clone())
}

/// Formats a runtime in minutes as `{h}h {m}m`; unknown runtime is `0h 0m`
pub fn format_runtime(runtime: Option<u32>) -> String {
    let minutes = runtime.unwrap_or(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Leading year of a `YYYY-MM-DD` date
pub fn release_year(release_date: Option<&str>) -> Option<i32> {
    release_date?.split('-').next()?.parse().ok()
}

pub fn poster_url(path: Option<&str>) -> String {
    image_url(POSTER_BASE_URL, path)
}

pub fn backdrop_url(path: Option<&str>) -> String {
    image_url(BACKDROP_BASE_URL, path)
}

fn image_url(base: &str, path: Option<&str>) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("{}{}", base, path),
        _ => String::new(),
    }
}

// ============================================================================
// Assembled record returned to the client
// ============================================================================

/// Flat movie record merged from details, credits and videos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub year: i32,
    pub rating: f64,
    pub genre: Vec<String>,
    pub director: String,
    pub duration: String,
    pub poster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    pub description: String,
    pub cast: Vec<String>,
    pub trending: bool,
    pub ai_recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<u64>,
}

/// Controls how much of the merged data lands in a [`MovieRecord`]
#[derive(Debug, Clone, Copy)]
pub struct RecordShape {
    pub cast_limit: usize,
    pub ai_recommended: bool,
    /// Include backdrop, tagline, status, budget and revenue
    pub extended: bool,
    /// Year used when the release date is missing or unparseable
    pub fallback_year: i32,
}

impl RecordShape {
    /// Featured rows built from stored recommendations
    pub fn recommended(fallback_year: i32) -> Self {
        Self {
            cast_limit: 3,
            ai_recommended: true,
            extended: false,
            fallback_year,
        }
    }

    /// Detail page and watchlist rows
    pub fn full() -> Self {
        Self {
            cast_limit: 10,
            ai_recommended: false,
            extended: true,
            fallback_year: 0,
        }
    }
}

impl MovieRecord {
    pub fn assemble(
        details: MovieDetails,
        credits: Option<&Credits>,
        trailer: Option<String>,
        shape: RecordShape,
    ) -> Self {
        let director = credits
            .and_then(Credits::director)
            .unwrap_or("Unknown")
            .to_string();
        let cast = credits
            .map(|c| c.top_cast(shape.cast_limit))
            .unwrap_or_default();

        let (backdrop, tagline, status, budget, revenue) = if shape.extended {
            (
                Some(backdrop_url(details.backdrop_path.as_deref())),
                details.tagline,
                details.status,
                details.budget,
                details.revenue,
            )
        } else {
            (None, None, None, None, None)
        };

        Self {
            id: details.id,
            year: release_year(details.release_date.as_deref()).unwrap_or(shape.fallback_year),
            rating: details.vote_average,
            genre: details.genres.into_iter().map(|g| g.name).collect(),
            director,
            duration: format_runtime(details.runtime),
            poster: poster_url(details.poster_path.as_deref()),
            backdrop,
            description: details.overview.unwrap_or_default(),
            cast,
            trending: details.popularity > TRENDING_POPULARITY,
            ai_recommended: shape.ai_recommended,
            trailer,
            tagline,
            status,
            budget,
            revenue,
            title: details.title,
        }
    }
}
