use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};

use app::state::AppState;
use models::params::tournament::{
    CheckSubmissionsParams, JoinTournamentParams, StartMatchParams,
};
use models::schemas::tournament::TournamentEnvelope;

use crate::error::ApiError;

#[axum::debug_handler]
async fn create_post(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.create())
}

#[axum::debug_handler]
async fn join_post(
    State(state): State<AppState>,
    Json(params): Json<JoinTournamentParams>,
) -> Result<impl IntoResponse, ApiError> {
    let tournament = state.registry.join(params).await?;
    Ok(Json(TournamentEnvelope { tournament }))
}

#[axum::debug_handler]
async fn tournament_get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tournament = state.registry.get(&code)?;
    Ok(Json(TournamentEnvelope { tournament }))
}

#[axum::debug_handler]
async fn check_submissions_post(
    State(state): State<AppState>,
    Json(params): Json<CheckSubmissionsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.registry.check_submissions(params).await?;
    Ok(Json(result))
}

#[axum::debug_handler]
async fn start_match_post(
    State(state): State<AppState>,
    Json(params): Json<StartMatchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.registry.start_match(params)?;
    Ok(Json(result))
}

pub fn create_tournament_router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_post))
        .route("/join", post(join_post))
        .route("/check-submissions", post(check_submissions_post))
        .route("/start-match", post(start_match_post))
        .route("/{code}", get(tournament_get))
}
