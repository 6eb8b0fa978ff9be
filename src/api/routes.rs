use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use super::AppState;
use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    routes,
};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        // Liveness
        .route("/health", get(routes::health_check))
        .route("/test", get(routes::test))
        .route("/health-check", get(routes::store_health_check))
        // Auth provider
        .route("/user_register_webhook", post(routes::webhook::user_register_webhook))
        // Onboarding
        .route("/user-interests", post(routes::users::user_interests))
        .route("/onboarding", post(routes::users::onboarding))
        // Catalog
        .route("/featured", get(routes::movies::featured))
        .route("/trending", get(routes::movies::trending))
        .route("/search-movies", post(routes::movies::search_movies))
        .route("/movie/:id/full", get(routes::movies::movie_full))
        // Watchlist
        .route(
            "/watchlist",
            get(routes::watchlist::get_watchlist).post(routes::watchlist::update_watchlist),
        )
        .route("/watchlist-data", get(routes::watchlist::watchlist_data))
        // Recommendations
        .route("/api/recommend", post(routes::recommendations::recommend))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::{TestRequest, TestServer};

    use super::*;
    use crate::{
        db::InMemoryUserStore,
        services::{
            auth::MockTokenVerifier, catalog::MockCatalog, recommendations::MockChatModel,
            webhook::WebhookVerifier,
        },
    };

    fn server() -> TestServer {
        let state = AppState {
            store: Arc::new(InMemoryUserStore::new()),
            catalog: Arc::new(MockCatalog::new()),
            chat_model: Arc::new(MockChatModel::new()),
            token_verifier: Arc::new(MockTokenVerifier::new()),
            webhook_verifier: Arc::new(WebhookVerifier::new("whsec_c2VjcmV0").unwrap()),
            fanout_concurrency: 2,
            cors_origins: vec!["http://localhost:3000".to_string()],
        };
        TestServer::new(create_router(state)).unwrap()
    }

    fn preflight(server: &TestServer, origin: &'static str) -> TestRequest {
        server
            .method(Method::OPTIONS, "/watchlist")
            .add_header(header::ORIGIN, HeaderValue::from_static(origin))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .add_header(
                header::ACCESS_CONTROL_REQUEST_HEADERS,
                HeaderValue::from_static("authorization,content-type"),
            )
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin() {
        let server = server();
        let response = preflight(&server, "http://localhost:3000").await;

        response.assert_status_ok();
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "http://localhost:3000"
        );
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS), "true");
    }

    #[tokio::test]
    async fn test_preflight_from_unknown_origin_not_allowed() {
        let server = server();
        let response = preflight(&server, "https://evil.example").await;
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_invalid_origin_is_skipped() {
        // Must not panic on a value that is not a valid header
        let _ = cors_layer(&["http://ok.example".to_string(), "bad\norigin".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = server().get("/nope").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
