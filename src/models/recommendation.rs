use serde::{Deserialize, Deserializer, Serialize};

/// A single pick produced by the language model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    /// Models return the year either as a number or a string
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub link: String,
}

/// JSON envelope the model is instructed to reply with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecommendationEnvelope {
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationEnvelope {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Title/year pair persisted on the user record for the featured row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecommendation {
    pub name: String,
    pub release_year: Option<i32>,
}

impl From<&Recommendation> for StoredRecommendation {
    fn from(rec: &Recommendation) -> Self {
        Self {
            name: rec.title.clone(),
            release_year: rec.year,
        }
    }
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(serde_json::Value::String(s)) => s.trim().get(..4).and_then(|y| y.parse().ok()),
        _ => None,
    })
}
