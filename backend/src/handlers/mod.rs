pub mod connections;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::ConnectionService;
use crate::utils::Config;

pub use connections::{
    accept_request, create_link, decline_request, get_connection, get_stats, list_friends,
    list_history, list_pending, list_sent, list_suggestions, parse_link, resolve_link,
    send_request,
};

pub fn create_router(service: ConnectionService, config: &Config) -> Router {
    let cors_layer = create_cors_layer(config);

    Router::new()
        .route("/health", get(health_check))
        // Links and QR payloads
        .route("/api/connections/link", post(create_link))
        .route("/api/connections/parse", post(parse_link))
        .route("/api/connections/resolve", post(resolve_link))
        // Friend requests
        .route("/api/connections", post(send_request))
        .route("/api/connections/{id}", get(get_connection))
        .route("/api/connections/{id}/accept", post(accept_request))
        .route("/api/connections/{id}/decline", post(decline_request))
        .route("/api/users/{user_id}/requests", get(list_pending))
        .route("/api/users/{user_id}/friends", get(list_friends))
        .route("/api/users/{user_id}/sent", get(list_sent))
        .route("/api/users/{user_id}/history", get(list_history))
        .route("/api/users/{user_id}/suggestions", get(list_suggestions))
        .route("/api/users/{user_id}/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(service)
}

fn create_cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        // Default to permissive for development
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

async fn health_check() -> &'static str {
    "OK"
}
