use serde::{Deserialize, Serialize};

use super::{MovieId, StoredRecommendation};

/// Opaque user id issued by the auth provider
pub type UserId = String;

/// Profile fields synced from the auth provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Everything stored for a single user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserRecord {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Free-form onboarding answers, stored without validation
    pub interests: Option<serde_json::Value>,
    pub onboarded: bool,
    pub recommendations: Vec<StoredRecommendation>,
    /// Movie ids in insertion order
    pub watchlist: Vec<MovieId>,
}

impl UserRecord {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistAction {
    Add,
    Remove,
}

impl WatchlistAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}
