//! The HTTP surface: room creation only.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cardczar_protocol::GameId;
use serde::Serialize;

use crate::server::ServerState;

#[derive(Debug, Serialize)]
struct CreatedGame {
    #[serde(rename = "gameID")]
    game_id: GameId,
}

pub(crate) fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/game", post(create_game))
        .with_state(state)
}

/// Allocates a room and returns its id for the client to redirect to.
async fn create_game(State(state): State<Arc<ServerState>>) -> Result<Json<CreatedGame>, StatusCode> {
    match state.directory.create_room().await {
        Ok(game_id) => Ok(Json(CreatedGame { game_id })),
        Err(err) => {
            tracing::error!(error = %err, "room creation failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
