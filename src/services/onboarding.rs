use std::sync::Arc;

use crate::{
    db::UserStore,
    error::AppResult,
    models::StoredRecommendation,
    services::recommendations::{self, ChatModel},
};

/// Stores the onboarding answers; the rest of onboarding runs in the background
pub async fn submit_interests(
    store: Arc<dyn UserStore>,
    model: Arc<dyn ChatModel>,
    user_id: &str,
    interests: serde_json::Value,
) -> AppResult<()> {
    store.set_interests(user_id, &interests).await?;
    tracing::info!(user_id = %user_id, "Interests stored");

    let user_id = user_id.to_string();
    tokio::spawn(async move {
        if let Err(e) = finish_onboarding(store.as_ref(), model.as_ref(), &user_id, &interests).await {
            tracing::error!(error = %e, user_id = %user_id, "Onboarding completion failed");
        }
    });

    Ok(())
}

/// Seeds the featured recommendations from the interests, then flips the flag
///
/// A failed model call leaves the featured list empty but still completes
/// onboarding, so the client's polling loop terminates.
pub async fn finish_onboarding(
    store: &dyn UserStore,
    model: &dyn ChatModel,
    user_id: &str,
    interests: &serde_json::Value,
) -> AppResult<()> {
    let message = recommendations::interests_message(interests);
    let picks: Vec<StoredRecommendation> = match recommendations::recommend(model, &message).await
    {
        Ok(envelope) => envelope
            .recommendations
            .iter()
            .map(StoredRecommendation::from)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user_id, "Onboarding recommendations unavailable");
            Vec::new()
        }
    };

    store.set_recommendations(user_id, &picks).await?;
    store.set_onboarded(user_id, true).await?;

    tracing::info!(
        user_id = %user_id,
        recommendations = picks.len(),
        "Onboarding completed"
    );

    Ok(())
}
