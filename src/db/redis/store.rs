use std::collections::HashMap;
use std::fmt::Display;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{MovieId, StoredRecommendation, UserProfile, UserRecord},
};

const FIELD_EMAIL: &str = "email";
const FIELD_USERNAME: &str = "username";
const FIELD_NAME: &str = "name";
const FIELD_PICTURE: &str = "picture";
const FIELD_INTERESTS: &str = "interests";
const FIELD_ONBOARDED: &str = "onboarded";
const FIELD_RECOMMENDATIONS: &str = "recommendations";

const PROFILE_FIELDS: [&str; 4] = [FIELD_EMAIL, FIELD_USERNAME, FIELD_NAME, FIELD_PICTURE];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Hash holding profile, interests, onboarding flag and recommendations
    User(String),
    /// Sorted set of movie ids scored by insertion sequence
    Watchlist(String),
    /// Counter handing out watchlist scores
    WatchlistSeq(String),
}

/// Scores each new id with the next value of the user's counter.
/// KEYS[1] watchlist, KEYS[2] counter, ARGV[1] movie id.
const WATCHLIST_ADD_SCRIPT: &str = r#"
if not redis.call('ZSCORE', KEYS[1], ARGV[1]) then
    local seq = redis.call('INCR', KEYS[2])
    redis.call('ZADD', KEYS[1], 'NX', seq, ARGV[1])
end
return redis.call('ZRANGE', KEYS[1], 0, -1)
"#;

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::User(id) => write!(f, "user:{}", id),
            StoreKey::Watchlist(id) => write!(f, "user:{}:watchlist", id),
            StoreKey::WatchlistSeq(id) => write!(f, "user:{}:watchlist:seq", id),
        }
    }
}

/// Creates a Redis client for the user store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed user store
///
/// Watchlist mutations and the read of the resulting list run in one atomic
/// pipeline, so concurrent add/remove calls for the same user cannot lose
/// updates.
#[derive(Clone)]
pub struct RedisUserStore {
    conn: ConnectionManager,
}

impl RedisUserStore {
    pub async fn new(client: Client) -> AppResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn user_key(user_id: &str) -> String {
        StoreKey::User(user_id.to_string()).to_string()
    }

    fn watchlist_key(user_id: &str) -> String {
        StoreKey::Watchlist(user_id.to_string()).to_string()
    }

    fn watchlist_seq_key(user_id: &str) -> String {
        StoreKey::WatchlistSeq(user_id.to_string()).to_string()
    }
}

fn profile_fields(profile: &UserProfile) -> Vec<(&'static str, String)> {
    [
        (FIELD_EMAIL, &profile.email),
        (FIELD_USERNAME, &profile.username),
        (FIELD_NAME, &profile.name),
        (FIELD_PICTURE, &profile.picture),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.clone().map(|v| (field, v)))
    .collect()
}

fn decode_recommendations(raw: Option<&String>) -> AppResult<Vec<StoredRecommendation>> {
    match raw {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| AppError::Internal(format!("Stored recommendations are corrupt: {}", e))),
        None => Ok(Vec::new()),
    }
}

fn decode_record(
    user_id: &str,
    mut fields: HashMap<String, String>,
    watchlist: Vec<MovieId>,
) -> AppResult<UserRecord> {
    let recommendations = decode_recommendations(fields.get(FIELD_RECOMMENDATIONS))?;
    let interests = match fields.remove(FIELD_INTERESTS) {
        Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
            AppError::Internal(format!("Stored interests are corrupt: {}", e))
        })?),
        None => None,
    };

    Ok(UserRecord {
        user_id: user_id.to_string(),
        profile: UserProfile {
            email: fields.remove(FIELD_EMAIL),
            username: fields.remove(FIELD_USERNAME),
            name: fields.remove(FIELD_NAME),
            picture: fields.remove(FIELD_PICTURE),
        },
        interests,
        onboarded: fields.get(FIELD_ONBOARDED).map(|v| v == "true").unwrap_or(false),
        recommendations,
        watchlist,
    })
}

#[async_trait::async_trait]
impl UserStore for RedisUserStore {
    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn put_profile(&self, user_id: &str, profile: &UserProfile) -> AppResult<()> {
        let key = Self::user_key(user_id);
        let fields = profile_fields(profile);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().hdel(&key, &PROFILE_FIELDS[..]).ignore();
        if !fields.is_empty() {
            pipe.hset_multiple(&key, &fields).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;

        tracing::debug!(user_id = %user_id, fields = fields.len(), "Profile stored");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        let mut conn = self.conn.clone();
        let (fields, watchlist): (HashMap<String, String>, Vec<MovieId>) = redis::pipe()
            .atomic()
            .hgetall(Self::user_key(user_id))
            .zrange(Self::watchlist_key(user_id), 0, -1)
            .query_async(&mut conn)
            .await?;

        if fields.is_empty() && watchlist.is_empty() {
            return Ok(None);
        }

        decode_record(user_id, fields, watchlist).map(Some)
    }

    async fn set_interests(&self, user_id: &str, interests: &serde_json::Value) -> AppResult<()> {
        let json = serde_json::to_string(interests)
            .map_err(|e| AppError::Internal(format!("Interests serialization error: {}", e)))?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(Self::user_key(user_id), FIELD_INTERESTS, json)
            .await?;
        Ok(())
    }

    async fn is_onboarded(&self, user_id: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let flag: Option<String> = conn.hget(Self::user_key(user_id), FIELD_ONBOARDED).await?;
        Ok(flag.as_deref() == Some("true"))
    }

    async fn set_onboarded(&self, user_id: &str, onboarded: bool) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(Self::user_key(user_id), FIELD_ONBOARDED, onboarded.to_string())
            .await?;
        Ok(())
    }

    async fn recommendations(&self, user_id: &str) -> AppResult<Vec<StoredRecommendation>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .hget(Self::user_key(user_id), FIELD_RECOMMENDATIONS)
            .await?;
        decode_recommendations(raw.as_ref())
    }

    async fn set_recommendations(
        &self,
        user_id: &str,
        recommendations: &[StoredRecommendation],
    ) -> AppResult<()> {
        let json = serde_json::to_string(recommendations).map_err(|e| {
            AppError::Internal(format!("Recommendations serialization error: {}", e))
        })?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(Self::user_key(user_id), FIELD_RECOMMENDATIONS, json)
            .await?;
        Ok(())
    }

    async fn watchlist(&self, user_id: &str) -> AppResult<Vec<MovieId>> {
        let mut conn = self.conn.clone();
        let ids: Vec<MovieId> = conn.zrange(Self::watchlist_key(user_id), 0, -1).await?;
        Ok(ids)
    }

    async fn add_to_watchlist(&self, user_id: &str, movie_id: MovieId) -> AppResult<Vec<MovieId>> {
        let mut conn = self.conn.clone();
        let script = Script::new(WATCHLIST_ADD_SCRIPT);

        // Ids already listed keep their original position
        let ids: Vec<MovieId> = script
            .key(Self::watchlist_key(user_id))
            .key(Self::watchlist_seq_key(user_id))
            .arg(movie_id)
            .invoke_async(&mut conn)
            .await?;

        tracing::debug!(user_id = %user_id, movie_id, size = ids.len(), "Watchlist add");
        Ok(ids)
    }

    async fn remove_from_watchlist(
        &self,
        user_id: &str,
        movie_id: MovieId,
    ) -> AppResult<Vec<MovieId>> {
        let key = Self::watchlist_key(user_id);
        let mut conn = self.conn.clone();

        let (ids,): (Vec<MovieId>,) = redis::pipe()
            .atomic()
            .zrem(&key, movie_id)
            .ignore()
            .zrange(&key, 0, -1)
            .query_async(&mut conn)
            .await?;

        tracing::debug!(user_id = %user_id, movie_id, size = ids.len(), "Watchlist remove");
        Ok(ids)
    }
}
