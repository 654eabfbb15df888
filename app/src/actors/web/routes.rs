//! REST endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::WebState;
use garland::{DecorationsResponse, GarlandMessage, HudFrame, PlayerCommand, StatusResponse};

/// GET /api/status
pub async fn get_status(State(state): State<Arc<WebState>>) -> Json<StatusResponse> {
    let actors = state
        .actors
        .read()
        .await
        .iter()
        .map(|(id, a)| (id.clone(), a.clone()))
        .collect();
    let game = &state.root.game;
    Json(StatusResponse {
        actors,
        stage: game.stage(),
        decorations: game.decorations().len(),
    })
}

/// GET /api/frame: the most recent simulation frame. 503 until the game
/// actor has produced one.
pub async fn get_frame(
    State(state): State<Arc<WebState>>,
) -> Result<Json<HudFrame>, StatusCode> {
    state
        .root
        .game
        .frame()
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// GET /api/decorations
pub async fn get_decorations(State(state): State<Arc<WebState>>) -> Json<DecorationsResponse> {
    Json(DecorationsResponse {
        decorations: state.root.game.decorations(),
    })
}

/// POST /api/command: one-shot player input for clients without a socket.
pub async fn post_command(
    State(state): State<Arc<WebState>>,
    Json(cmd): Json<PlayerCommand>,
) -> StatusCode {
    tracing::debug!("web: command {cmd:?}");
    let _ = state
        .bus_tx
        .send(GarlandMessage::new(cmd).source(&state.actor_id));
    StatusCode::ACCEPTED
}
