use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    db::UserStore,
    error::AppResult,
    models::{MovieId, StoredRecommendation, UserProfile, UserRecord},
};

/// Process-local user store
///
/// All mutation happens under one write lock, so watchlist updates are atomic
/// just like the Redis pipelines.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F, T>(&self, user_id: &str, apply: F) -> T
    where
        F: FnOnce(&mut UserRecord) -> T,
    {
        let mut users = self.users.write().await;
        let record = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id));
        apply(record)
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn put_profile(&self, user_id: &str, profile: &UserProfile) -> AppResult<()> {
        self.update(user_id, |record| record.profile = profile.clone())
            .await;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn set_interests(&self, user_id: &str, interests: &serde_json::Value) -> AppResult<()> {
        self.update(user_id, |record| record.interests = Some(interests.clone()))
            .await;
        Ok(())
    }

    async fn is_onboarded(&self, user_id: &str) -> AppResult<bool> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|record| record.onboarded)
            .unwrap_or(false))
    }

    async fn set_onboarded(&self, user_id: &str, onboarded: bool) -> AppResult<()> {
        self.update(user_id, |record| record.onboarded = onboarded)
            .await;
        Ok(())
    }

    async fn recommendations(&self, user_id: &str) -> AppResult<Vec<StoredRecommendation>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|record| record.recommendations.clone())
            .unwrap_or_default())
    }

    async fn set_recommendations(
        &self,
        user_id: &str,
        recommendations: &[StoredRecommendation],
    ) -> AppResult<()> {
        self.update(user_id, |record| {
            record.recommendations = recommendations.to_vec()
        })
        .await;
        Ok(())
    }

    async fn watchlist(&self, user_id: &str) -> AppResult<Vec<MovieId>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|record| record.watchlist.clone())
            .unwrap_or_default())
    }

    async fn add_to_watchlist(&self, user_id: &str, movie_id: MovieId) -> AppResult<Vec<MovieId>> {
        Ok(self
            .update(user_id, |record| {
                if !record.watchlist.contains(&movie_id) {
                    record.watchlist.push(movie_id);
                }
                record.watchlist.clone()
            })
            .await)
    }

    async fn remove_from_watchlist(
        &self,
        user_id: &str,
        movie_id: MovieId,
    ) -> AppResult<Vec<MovieId>> {
        Ok(self
            .update(user_id, |record| {
                record.watchlist.retain(|id| *id != movie_id);
                record.watchlist.clone()
            })
            .await)
    }
}
