use serde::Deserialize;

/// Which user store implementation backs the service
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// User store implementation
    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,

    /// TMDB read access token (with or without the "Bearer " prefix)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// OpenRouter API key
    pub openrouter_api_key: String,

    /// OpenRouter API base URL
    #[serde(default = "default_openrouter_api_url")]
    pub openrouter_api_url: String,

    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,

    /// Sent as the `HTTP-Referer` attribution header
    #[serde(default = "default_openrouter_referer")]
    pub openrouter_referer: String,

    /// Sent as the `X-Title` attribution header
    #[serde(default = "default_openrouter_title")]
    pub openrouter_title: String,

    /// Clerk instance public key (PEM) used for networkless JWT verification
    pub clerk_jwt_key: String,

    /// Accepted `azp` claims; empty accepts any origin
    #[serde(default)]
    pub clerk_authorized_parties: Vec<String>,

    /// Svix signing secret for the user webhook (`whsec_...`)
    pub clerk_webhook_secret: String,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Upper bound on parallel catalog lookups per request
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,

    /// Timeout applied to every outbound vendor call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Redis
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_openrouter_api_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_model() -> String {
    "meta-llama/llama-3.3-70b-instruct:free".to_string()
}

fn default_openrouter_referer() -> String {
    "https://moviedb.arpangautam.com".to_string()
}

fn default_openrouter_title() -> String {
    "MovieDB".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "https://mov-ai.vercel.app".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_fanout_concurrency() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// TMDB token without any "Bearer " prefix
    pub fn tmdb_token(&self) -> &str {
        let key = self.tmdb_api_key.trim();
        key.strip_prefix("Bearer ").unwrap_or(key)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
