use axum::{
    Router,
    extract::{Path, Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::{services::websocket_service, state::SharedState};

/// Query string of the WebSocket endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    player_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/ws/{scorepad_id}",
    tag = "players",
    params(
        ("scorepad_id" = String, Path, description = "Scorepad the game is played for"),
        ("playerId" = String, Query, description = "Player joining the game")
    ),
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a player WebSocket session.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(scorepad_id): Path<String>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        websocket_service::handle_socket(state, socket, scorepad_id, params.player_id)
    })
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws/{scorepad_id}", get(ws_handler))
}
