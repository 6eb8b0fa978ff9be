//! User store abstraction
//!
//! One record per user, keyed by the auth provider's opaque id. Redis is the
//! production backend; the in-memory store serves tests and local runs.

use crate::{
    error::AppResult,
    models::{MovieId, StoredRecommendation, UserProfile, UserRecord},
};

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryUserStore;
pub use self::redis::{create_redis_client, RedisUserStore, StoreKey};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Liveness probe against the backing store
    async fn ping(&self) -> AppResult<()>;

    /// Overwrites the profile fields, leaving onboarding state and watchlist alone
    async fn put_profile(&self, user_id: &str, profile: &UserProfile) -> AppResult<()>;

    async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>>;

    /// Overwrites the onboarding interests blob
    async fn set_interests(&self, user_id: &str, interests: &serde_json::Value) -> AppResult<()>;

    async fn is_onboarded(&self, user_id: &str) -> AppResult<bool>;

    async fn set_onboarded(&self, user_id: &str, onboarded: bool) -> AppResult<()>;

    async fn recommendations(&self, user_id: &str) -> AppResult<Vec<StoredRecommendation>>;

    async fn set_recommendations(
        &self,
        user_id: &str,
        recommendations: &[StoredRecommendation],
    ) -> AppResult<()>;

    /// Watchlist ids in insertion order
    async fn watchlist(&self, user_id: &str) -> AppResult<Vec<MovieId>>;

    /// Adds an id unless already present; returns the updated list
    async fn add_to_watchlist(&self, user_id: &str, movie_id: MovieId) -> AppResult<Vec<MovieId>>;

    /// Removes every occurrence of an id; returns the updated list
    async fn remove_from_watchlist(
        &self,
        user_id: &str,
        movie_id: MovieId,
    ) -> AppResult<Vec<MovieId>>;
}
