use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{Config, StoreBackend},
    db::{create_redis_client, InMemoryUserStore, RedisUserStore, UserStore},
    services::{
        auth::{ClerkVerifier, TokenVerifier},
        catalog::{Catalog, TmdbCatalog},
        recommendations::{ChatModel, OpenRouterClient},
        webhook::WebhookVerifier,
    },
};

/// Shared application state
///
/// Every vendor sits behind a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub catalog: Arc<dyn Catalog>,
    pub chat_model: Arc<dyn ChatModel>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub webhook_verifier: Arc<WebhookVerifier>,
    /// Parallel catalog lookups allowed per request
    pub fanout_concurrency: usize,
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Wires the production vendors from configuration
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let store: Arc<dyn UserStore> = match config.store_backend {
            StoreBackend::Redis => {
                let client = create_redis_client(&config.redis_url)?;
                Arc::new(RedisUserStore::new(client).await?)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory user store; data is lost on restart");
                Arc::new(InMemoryUserStore::new())
            }
        };

        let catalog = TmdbCatalog::new(
            config.tmdb_token().to_string(),
            config.tmdb_api_url.clone(),
            timeout,
        )?;

        let chat_model = OpenRouterClient::new(
            config.openrouter_api_key.clone(),
            config.openrouter_api_url.clone(),
            config.openrouter_model.clone(),
            config.openrouter_referer.clone(),
            config.openrouter_title.clone(),
            timeout,
        )?;

        let token_verifier =
            ClerkVerifier::new(&config.clerk_jwt_key, config.clerk_authorized_parties.clone())?;
        let webhook_verifier = WebhookVerifier::new(&config.clerk_webhook_secret)?;

        tracing::info!(
            store = ?config.store_backend,
            catalog = catalog.name(),
            model = %config.openrouter_model,
            "Application state initialised"
        );

        Ok(Self {
            store,
            catalog: Arc::new(catalog),
            chat_model: Arc::new(chat_model),
            token_verifier: Arc::new(token_verifier),
            webhook_verifier: Arc::new(webhook_verifier),
            fanout_concurrency: config.fanout_concurrency,
            cors_origins: config.cors_origins.clone(),
        })
    }
}
