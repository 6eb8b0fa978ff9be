use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::RecommendationEnvelope,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Hosted chat-completion model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Content of the first choice, `None` when the model returned nothing
    async fn chat(&self, messages: Vec<ChatMessage>) -> AppResult<Option<String>>;
}

/// OpenRouter chat-completions client (OpenAI-compatible wire format)
pub struct OpenRouterClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    referer: String,
    title: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        referer: String,
        title: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            referer,
            title,
        })
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenRouterClient {
    async fn chat(&self, messages: Vec<ChatMessage>) -> AppResult<Option<String>> {
        let url = format!("{}/chat/completions", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&CompletionRequest {
                model: &self.model,
                messages: &messages,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenRouter returned status {}: {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        tracing::debug!(
            model = %self.model,
            has_content = content.is_some(),
            "Chat completion received"
        );

        Ok(content)
    }
}

/// Fixed instruction sent ahead of every user request
pub fn system_prompt(user_message: &str) -> String {
    format!(
        "You are a knowledgeable and enthusiastic movie/tv shows/webseries recommendation agent. \
         Your name is CineBot. You have extensive knowledge of films across all genres, eras, and cultures. \
         User's message: \"{user_message}\" \
         Please provide movie recommendations that match their request. Include: \
         - Movie titles with release years \
         - Brief compelling descriptions (1-2 sentences each) \
         - Why you think they'd enjoy it based on their request \
         - Mix of popular and hidden gem recommendations when appropriate \
         Give me a total of 4 movies/tv shows/webseries with the link to where I can watch each one. \
         Output format should be in JSON format with the following structure: \
         {{ \"recommendations\": [ {{ \"title\": \"Content Title\", \"year\": 2023, \
         \"reason\": \"Explanation for why this content is recommended. Make this very short and to the point\", \
         \"genre\": \"the main genre of the content\", \"link\": \"imdb link to this content\" }}, ... ] }} \
         The response should only be strictly in JSON format and nothing else! \
         Only plain texts no images or other unicode characters. \
         If you have no recommendation give me empty JSON object! \
         The response should only be json of recommendations"
    )
}

/// Request sent for a user's onboarding answers
pub fn interests_message(interests: &serde_json::Value) -> String {
    format!(
        "Recommend movies for someone who described their taste like this: {}",
        interests
    )
}

/// Parses the model reply, degrading to an empty list on any failure
pub fn parse_recommendations(content: Option<&str>) -> RecommendationEnvelope {
    let Some(content) = content.map(str::trim).filter(|c| !c.is_empty()) else {
        return RecommendationEnvelope::empty();
    };

    match serde_json::from_str(strip_code_fence(content)) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "Model reply was not a recommendation envelope");
            RecommendationEnvelope::empty()
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(body) = content.strip_prefix("```") else {
        return content;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// One outbound chat call with the fixed prompt
///
/// Transport failures propagate; malformed output becomes an empty list.
pub async fn recommend(
    model: &dyn ChatModel,
    user_message: &str,
) -> AppResult<RecommendationEnvelope> {
    let messages = vec![
        ChatMessage::system(system_prompt(user_message)),
        ChatMessage::user(user_message),
    ];

    let content = model.chat(messages).await?;
    let envelope = parse_recommendations(content.as_deref());

    tracing::info!(
        recommendations = envelope.recommendations.len(),
        "Recommendations generated"
    );

    Ok(envelope)
}
