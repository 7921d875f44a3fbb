use axum::Router;
use axum::routing::get;

pub mod tournament;

use app::state::AppState;
use tournament::create_tournament_router;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/tournament", create_tournament_router())
        .route("/ws", get(crate::gateway::ws_handler))
        .with_state(state)
}
