//! Typed client for the handful of backend calls the web app makes outside
//! of page rendering: the onboarding gate and watchlist sync.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use crate::models::{MovieId, WatchlistAction};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Token not found")]
    MissingToken,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedStatus(u16),
}

/// Outcome of one onboarding check, shaped like the JSON the web app expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OnboardingCheck {
    Status {
        #[serde(rename = "needsOnboarding")]
        needs_onboarding: bool,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The backend reported the user as onboarded
    Onboarded,
    /// A check failed; polling stopped
    Failed(String),
    /// Still not onboarded after the attempt budget
    GaveUp,
}

#[derive(Debug, Deserialize)]
struct WatchlistBody {
    #[serde(default)]
    watchlist: Vec<MovieId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchlistUpdate {
    movie_id: MovieId,
    action: WatchlistAction,
}

#[derive(Clone)]
pub struct BackendClient {
    http_client: HttpClient,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 403 means the user already finished onboarding
    pub async fn check_onboarding(&self, token: &str) -> OnboardingCheck {
        let response = self
            .http_client
            .post(self.url("/onboarding"))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return OnboardingCheck::Error { error: e.to_string() },
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            OnboardingCheck::Status {
                needs_onboarding: false,
            }
        } else if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Unexpected response");
            OnboardingCheck::Error {
                error: format!("Unexpected response: {}", status.as_u16()),
            }
        } else {
            OnboardingCheck::Status {
                needs_onboarding: true,
            }
        }
    }

    /// Re-checks onboarding until it completes, a check fails, or attempts run out
    ///
    /// At least one check is made even when `max_attempts` is zero.
    pub async fn poll_onboarding_status(
        &self,
        token: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> PollOutcome {
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.check_onboarding(token).await {
                OnboardingCheck::Error { error } => {
                    tracing::error!(error = %error, attempt, "Polling error");
                    return PollOutcome::Failed(error);
                }
                OnboardingCheck::Status {
                    needs_onboarding: false,
                } => return PollOutcome::Onboarded,
                OnboardingCheck::Status { .. } => {}
            }

            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        tracing::warn!(max_attempts, "Max polling attempts reached");
        PollOutcome::GaveUp
    }

    pub async fn get_watchlist(&self, token: &str) -> Result<Vec<MovieId>, ClientError> {
        require_token(token)?;

        let response = self
            .http_client
            .get(self.url("/watchlist"))
            .bearer_auth(token)
            .send()
            .await?;
        let body: WatchlistBody = success(response)?.json().await?;

        Ok(body.watchlist)
    }

    pub async fn update_watchlist(
        &self,
        token: &str,
        movie_id: MovieId,
        action: WatchlistAction,
    ) -> Result<Vec<MovieId>, ClientError> {
        require_token(token)?;

        let response = self
            .http_client
            .post(self.url("/watchlist"))
            .bearer_auth(token)
            .json(&WatchlistUpdate { movie_id, action })
            .send()
            .await?;
        let body: WatchlistBody = success(response)?.json().await?;

        Ok(body.watchlist)
    }
}

fn require_token(token: &str) -> Result<(), ClientError> {
    if token.trim().is_empty() {
        tracing::error!("{}", ClientError::MissingToken);
        return Err(ClientError::MissingToken);
    }
    Ok(())
}

fn success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::UnexpectedStatus(status.as_u16()))
    }
}
