use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use app::state::AppState;

use crate::gateway;
use crate::routers::create_router;

pub fn setup_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::OPTIONS, Method::GET, Method::POST])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .allow_origin(
            state
                .config
                .allowed_origin
                .parse::<HeaderValue>()
                .expect("Failed to parse allowed origin"),
        );

    gateway::spawn_event_forwarder(&state);

    create_router(state).layer(cors)
}
