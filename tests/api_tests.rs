use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};

use movai_api::{
    api::{create_router, AppState},
    db::{InMemoryUserStore, UserStore},
    error::{AppError, AppResult},
    models::{
        CastMember, CatalogMovie, Credits, CrewMember, MovieDetails, MovieId, StoredRecommendation,
        UserId, UserProfile, UserRecord, Video,
    },
    services::{
        auth::TokenVerifier,
        catalog::Catalog,
        recommendations::{ChatMessage, ChatModel},
        webhook::WebhookVerifier,
    },
};

const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldA==";
const USER: &str = "user_1";

struct StaticVerifier;

impl TokenVerifier for StaticVerifier {
    fn verify(&self, token: &str) -> AppResult<UserId> {
        match token {
            "valid-token" => Ok(USER.to_string()),
            "other-token" => Ok("user_2".to_string()),
            _ => Err(AppError::Unauthorized("invalid token".to_string())),
        }
    }
}

/// Canned catalog: ids 100..=105, with 404 for anything else
struct FixtureCatalog;

fn fixture_movie(id: MovieId) -> CatalogMovie {
    CatalogMovie {
        id,
        title: format!("Movie {}", id),
        original_title: None,
        overview: Some("An overview".to_string()),
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: None,
        release_date: Some("2010-07-16".to_string()),
        popularity: id as f64,
        vote_average: 8.0,
        vote_count: 100,
        genre_ids: vec![28],
        genre: Vec::new(),
    }
}

#[async_trait::async_trait]
impl Catalog for FixtureCatalog {
    async fn search_movies(&self, query: &str, _year: Option<i32>) -> AppResult<Vec<CatalogMovie>> {
        if query == "Inception" {
            let mut posterless = fixture_movie(104);
            posterless.poster_path = None;
            return Ok(vec![fixture_movie(101), posterless, fixture_movie(103)]);
        }
        Ok(Vec::new())
    }

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        if !(100..=105).contains(&id) {
            return Err(AppError::NotFound(format!("movie {}", id)));
        }
        Ok(MovieDetails {
            id,
            title: format!("Movie {}", id),
            release_date: Some("2010-07-16".to_string()),
            runtime: Some(148),
            vote_average: 8.4,
            popularity: 80.0,
            poster_path: Some("/p.jpg".to_string()),
            ..MovieDetails::default()
        })
    }

    async fn movie_credits(&self, _id: MovieId) -> AppResult<Credits> {
        Ok(Credits {
            cast: vec![CastMember {
                name: "Leonardo DiCaprio".to_string(),
            }],
            crew: vec![CrewMember {
                name: "Christopher Nolan".to_string(),
                job: "Director".to_string(),
            }],
        })
    }

    async fn movie_videos(&self, _id: MovieId) -> AppResult<Vec<Video>> {
        Ok(vec![Video {
            key: "YoHD9XEInc0".to_string(),
            site: "YouTube".to_string(),
            video_type: "Trailer".to_string(),
        }])
    }

    async fn trending_movies(&self) -> AppResult<Vec<CatalogMovie>> {
        Ok(vec![fixture_movie(102)])
    }

    async fn genre_names(&self) -> AppResult<HashMap<u64, String>> {
        Ok(HashMap::from([(28, "Action".to_string())]))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Replies with a fixed body, or fails when `reply` is `None`
struct CannedModel {
    reply: Option<String>,
}

#[async_trait::async_trait]
impl ChatModel for CannedModel {
    async fn chat(&self, _messages: Vec<ChatMessage>) -> AppResult<Option<String>> {
        match &self.reply {
            Some(reply) => Ok(Some(reply.clone())),
            None => Err(AppError::ExternalApi("model unavailable".to_string())),
        }
    }
}

fn picks_reply() -> String {
    json!({
        "recommendations": [
            { "title": "Inception", "year": 2010, "reason": "Mind-bending", "genre": "Sci-Fi", "link": "" },
            { "title": "Interstellar", "year": "2014", "reason": "Space", "genre": "Sci-Fi", "link": "" }
        ]
    })
    .to_string()
}

/// Store whose backend is unreachable
struct OfflineStore;

fn offline() -> AppError {
    AppError::Store(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait::async_trait]
impl UserStore for OfflineStore {
    async fn ping(&self) -> AppResult<()> {
        Err(offline())
    }

    async fn put_profile(&self, _user_id: &str, _profile: &UserProfile) -> AppResult<()> {
        Err(offline())
    }

    async fn get_user(&self, _user_id: &str) -> AppResult<Option<UserRecord>> {
        Err(offline())
    }

    async fn set_interests(&self, _user_id: &str, _interests: &Value) -> AppResult<()> {
        Err(offline())
    }

    async fn is_onboarded(&self, _user_id: &str) -> AppResult<bool> {
        Err(offline())
    }

    async fn set_onboarded(&self, _user_id: &str, _onboarded: bool) -> AppResult<()> {
        Err(offline())
    }

    async fn recommendations(&self, _user_id: &str) -> AppResult<Vec<StoredRecommendation>> {
        Err(offline())
    }

    async fn set_recommendations(
        &self,
        _user_id: &str,
        _recommendations: &[StoredRecommendation],
    ) -> AppResult<()> {
        Err(offline())
    }

    async fn watchlist(&self, _user_id: &str) -> AppResult<Vec<MovieId>> {
        Err(offline())
    }

    async fn add_to_watchlist(&self, _user_id: &str, _movie_id: MovieId) -> AppResult<Vec<MovieId>> {
        Err(offline())
    }

    async fn remove_from_watchlist(
        &self,
        _user_id: &str,
        _movie_id: MovieId,
    ) -> AppResult<Vec<MovieId>> {
        Err(offline())
    }
}

struct Harness {
    server: TestServer,
    store: Arc<InMemoryUserStore>,
}

fn server_with(store: Arc<dyn UserStore>, reply: Option<String>) -> TestServer {
    let state = AppState {
        store,
        catalog: Arc::new(FixtureCatalog),
        chat_model: Arc::new(CannedModel { reply }),
        token_verifier: Arc::new(StaticVerifier),
        webhook_verifier: Arc::new(WebhookVerifier::new(WEBHOOK_SECRET).unwrap()),
        fanout_concurrency: 4,
        cors_origins: vec!["http://localhost:3000".to_string()],
    };
    TestServer::new(create_router(state)).unwrap()
}

fn harness_with_model(reply: Option<String>) -> Harness {
    let store = Arc::new(InMemoryUserStore::new());
    let server = server_with(store.clone(), reply);
    Harness { server, store }
}

fn harness() -> Harness {
    harness_with_model(Some(picks_reply()))
}

fn authed(request: TestRequest) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_static("Bearer valid-token"),
    )
}

fn signed_webhook(request: TestRequest, payload: &[u8], signature: Option<String>) -> TestRequest {
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature =
        signature.unwrap_or_else(|| verifier.sign("msg_1", &timestamp, payload).unwrap());

    request
        .add_header(HeaderName::from_static("svix-id"), HeaderValue::from_static("msg_1"))
        .add_header(
            HeaderName::from_static("svix-timestamp"),
            HeaderValue::from_str(&timestamp).unwrap(),
        )
        .add_header(
            HeaderName::from_static("svix-signature"),
            HeaderValue::from_str(&signature).unwrap(),
        )
        .content_type("application/json")
        .bytes(payload.to_vec().into())
}

#[tokio::test]
async fn test_health_check() {
    let h = harness();
    let response = h.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "healthy" }));

    h.server.get("/test").await.assert_text("Test successful");
    h.server.get("/health-check").await.assert_text("Store connection OK");
}

#[tokio::test]
async fn test_request_id_echoed() {
    let h = harness();
    let response = h
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("rndr-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "rndr-42");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let h = harness();

    for path in ["/watchlist", "/watchlist-data", "/featured", "/trending", "/movie/100/full"] {
        let response = h.server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = h
        .server
        .post("/onboarding")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer forged"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_watchlist_add_then_remove() {
    let h = harness();

    let response = authed(h.server.post("/watchlist"))
        .json(&json!({ "movieId": 603, "action": "add" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "watchlist": [603] }));

    let response = authed(h.server.post("/watchlist"))
        .json(&json!({ "movieId": 603, "action": "remove" }))
        .await;
    assert_eq!(response.json::<Value>(), json!({ "watchlist": [] }));

    let response = authed(h.server.get("/watchlist")).await;
    assert_eq!(response.json::<Value>(), json!({ "watchlist": [] }));
}

#[tokio::test]
async fn test_watchlist_duplicate_add_stored_once() {
    let h = harness();

    for id in [100, 101, 100] {
        authed(h.server.post("/watchlist"))
            .json(&json!({ "movieId": id, "action": "add" }))
            .await
            .assert_status_ok();
    }

    let response = authed(h.server.get("/watchlist")).await;
    assert_eq!(response.json::<Value>(), json!({ "watchlist": [100, 101] }));
}

#[tokio::test]
async fn test_watchlist_is_scoped_to_caller() {
    let h = harness();

    authed(h.server.post("/watchlist"))
        .json(&json!({ "movieId": 100, "action": "add" }))
        .await
        .assert_status_ok();

    let response = h
        .server
        .get("/watchlist")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer other-token"))
        .await;
    assert_eq!(response.json::<Value>(), json!({ "watchlist": [] }));
}

#[tokio::test]
async fn test_watchlist_rejects_bad_requests() {
    let h = harness();

    let response = authed(h.server.post("/watchlist"))
        .json(&json!({ "action": "add" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Missing movieId or action" })
    );

    let response = authed(h.server.post("/watchlist"))
        .json(&json!({ "movieId": 100, "action": "toggle" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "Invalid action" }));

    let watchlist = h.store.watchlist(USER).await.unwrap();
    assert!(watchlist.is_empty());
}

#[tokio::test]
async fn test_watchlist_data_skips_unknown_movies() {
    let h = harness();
    for id in [100, 999, 101] {
        h.store.add_to_watchlist(USER, id).await.unwrap();
    }

    let response = authed(h.server.get("/watchlist-data")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let ids: Vec<u64> = body["watchlist"]
        .as_array()
        .unwrap()
        .iter()
        .map(|movie| movie["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![100, 101]);
    assert_eq!(body["watchlist"][0]["director"], "Christopher Nolan");
    assert_eq!(body["watchlist"][0]["duration"], "2h 28m");
}

#[tokio::test]
async fn test_onboarding_gate() {
    let h = harness();

    let response = authed(h.server.post("/onboarding")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "message": "Onboarding allowed" }));

    h.store.set_onboarded(USER, true).await.unwrap();

    let response = authed(h.server.post("/onboarding")).await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "User already onboarded" })
    );
}

#[tokio::test]
async fn test_interests_complete_onboarding_in_background() {
    let h = harness();
    let interests = json!({ "genres": ["Sci-Fi"], "favoriteMovie": "Inception" });

    let response = authed(h.server.post("/user-interests")).json(&interests).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "message": "Interests updated" })
    );

    let mut onboarded = false;
    for _ in 0..50 {
        if h.store.is_onboarded(USER).await.unwrap() {
            onboarded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(onboarded);

    let user = h.store.get_user(USER).await.unwrap().unwrap();
    assert_eq!(user.interests, Some(interests));
    assert_eq!(
        user.recommendations,
        vec![
            StoredRecommendation {
                name: "Inception".to_string(),
                release_year: Some(2010),
            },
            StoredRecommendation {
                name: "Interstellar".to_string(),
                release_year: Some(2014),
            },
        ]
    );
}

#[tokio::test]
async fn test_featured_empty_without_recommendations() {
    let h = harness();
    let response = authed(h.server.get("/featured")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_featured_resolves_stored_recommendations() {
    let h = harness();
    h.store
        .set_recommendations(
            USER,
            &[
                StoredRecommendation {
                    name: "Inception".to_string(),
                    release_year: Some(2010),
                },
                StoredRecommendation {
                    name: "Nothing Matches This".to_string(),
                    release_year: None,
                },
            ],
        )
        .await
        .unwrap();

    let response = authed(h.server.get("/featured")).await;
    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["id"], 101);
    assert_eq!(body[0]["aiRecommended"], true);
    assert_eq!(body[0]["trailer"], "YoHD9XEInc0");
}

#[tokio::test]
async fn test_search_is_public_and_filtered() {
    let h = harness();
    let response = h
        .server
        .post("/search-movies")
        .json(&json!({ "searchTerm": "Inception" }))
        .await;
    response.assert_status_ok();

    let body: Vec<Value> = response.json();
    let ids: Vec<u64> = body.iter().map(|m| m["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![103, 101]);
    assert_eq!(body[0]["genre"], json!(["Action"]));

    let response = h
        .server
        .post("/search-movies")
        .json(&json!({ "searchTerm": "  " }))
        .await;
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_movie_full_and_not_found() {
    let h = harness();

    let response = authed(h.server.get("/movie/100/full")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Movie 100");
    assert_eq!(body["year"], 2010);
    assert_eq!(body["aiRecommended"], false);

    let response = authed(h.server.get("/movie/999/full")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>(), json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_trending_with_genre_names() {
    let h = harness();
    let response = authed(h.server.get("/trending")).await;
    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body[0]["id"], 102);
    assert_eq!(body[0]["genre"], json!(["Action"]));
}

#[tokio::test]
async fn test_recommend_requires_message() {
    let h = harness();
    let response = authed(h.server.post("/api/recommend"))
        .json(&json!({ "userMessage": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "Missing user message" }));
}

#[tokio::test]
async fn test_recommend_returns_envelope() {
    let h = harness();
    let response = authed(h.server.post("/api/recommend"))
        .json(&json!({ "userMessage": "Something like Inception" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 2);
    assert_eq!(body["recommendations"][1]["year"], 2014);
}

#[tokio::test]
async fn test_recommend_malformed_output_is_empty() {
    let h = harness_with_model(Some("I am not JSON".to_string()));
    let response = authed(h.server.post("/api/recommend"))
        .json(&json!({ "userMessage": "Anything" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "recommendations": [] }));
}

#[tokio::test]
async fn test_recommend_model_failure() {
    let h = harness_with_model(None);
    let response = authed(h.server.post("/api/recommend"))
        .json(&json!({ "userMessage": "Anything" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to generate recommendations" })
    );
}

fn user_event(event_type: &str) -> Vec<u8> {
    json!({
        "type": event_type,
        "data": {
            "id": USER,
            "email_addresses": [{ "email_address": "ada@example.com" }],
            "image_url": "https://img.example.com/ada.png",
            "username": "ada",
            "first_name": "Ada"
        }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn test_webhook_creates_profile() {
    let h = harness();
    let payload = user_event("user.created");

    let response = signed_webhook(h.server.post("/user_register_webhook"), &payload, None).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "success": true }));

    let user = h.store.get_user(USER).await.unwrap().unwrap();
    assert_eq!(user.profile.email.as_deref(), Some("ada@example.com"));
    assert_eq!(user.profile.username.as_deref(), Some("ada"));
    assert!(!user.onboarded);
}

#[tokio::test]
async fn test_webhook_update_keeps_watchlist() {
    let h = harness();
    h.store.add_to_watchlist(USER, 603).await.unwrap();

    let payload = user_event("user.updated");
    let response = signed_webhook(h.server.post("/user_register_webhook"), &payload, None).await;
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "message": "User updated" })
    );
    assert_eq!(h.store.watchlist(USER).await.unwrap(), vec![603]);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let h = harness();
    let payload = user_event("user.created");
    let forged = "v1,ZmFrZS1zaWduYXR1cmU=".to_string();

    let response =
        signed_webhook(h.server.post("/user_register_webhook"), &payload, Some(forged)).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "Invalid webhook" }));
    assert!(h.store.get_user(USER).await.unwrap().is_none());
}

#[tokio::test]
async fn test_webhook_ignores_other_events() {
    let h = harness();
    let payload = user_event("user.deleted");

    let response = signed_webhook(h.server.post("/user_register_webhook"), &payload, None).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "message": "Event ignored" })
    );
    assert!(h.store.get_user(USER).await.unwrap().is_none());
}

#[tokio::test]
async fn test_webhook_rejects_missing_headers() {
    let h = harness();
    let response = h
        .server
        .post("/user_register_webhook")
        .content_type("application/json")
        .bytes(user_event("user.created").into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "Invalid webhook" }));
}

#[tokio::test]
async fn test_store_health_check_reports_failure() {
    let server = server_with(Arc::new(OfflineStore), None);
    let response = server.get("/health-check").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_text("Store connection FAILED");
}

#[tokio::test]
async fn test_watchlist_store_failure_is_generic_500() {
    let server = server_with(Arc::new(OfflineStore), None);

    let response = authed(server.get("/watchlist")).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Server error" }));

    let response = authed(server.post("/watchlist"))
        .json(&json!({ "movieId": 603, "action": "add" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Server error" }));
}
