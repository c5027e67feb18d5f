// routes.rs
use axum::routing::{get, post};
use axum::Router;
use http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::poll::PollStore;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: PollStore,
}

impl AppState {
    pub fn new(store: PollStore) -> Self {
        Self { store }
    }
}

pub fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    match allow_origin {
        None | Some("*") => layer.allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                warn!("ignoring unusable CORS origin {:?}, allowing any", origin);
                layer.allow_origin(Any)
            }
        },
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/polls", post(handlers::create_poll).get(handlers::list_active_polls))
        .route(
            "/polls/{id}",
            get(handlers::get_poll_results).delete(handlers::delete_poll),
        )
        .route("/polls/{id}/votes", post(handlers::vote))
        .route("/polls/{id}/close", post(handlers::close_poll))
        .with_state(state)
}

/// Routes plus the request tracing and CORS layers used by the server.
pub fn app(state: AppState, allow_origin: Option<&str>) -> Router {
    create_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allow_origin))
}
