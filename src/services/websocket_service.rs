use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::{AttachError, ServiceError},
    state::{
        SharedState,
        connection::Connection,
        game::PlayerId,
        session::GameSession,
    },
};

/// Handle the full lifecycle of a player WebSocket connection.
pub async fn handle_socket(
    state: SharedState,
    socket: WebSocket,
    scorepad_id: String,
    player_id: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection = Connection::new(outbound_tx.clone());
    let connection_id = connection.id();
    let player_id = player_id.unwrap_or_default();

    let (session, player) = match attach(&state, &scorepad_id, &player_id, connection.clone()).await {
        Ok(attached) => attached,
        Err(err) => {
            warn!(%scorepad_id, %player_id, error = %err, "refusing player connection");
            let _ = connection.send(&ServerMessage::Error(err.to_string()));
            let _ = outbound_tx.send(Message::Close(None));
            drop(connection);
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    info!(%scorepad_id, player_id = %player, "player connected");
    session.send_initial_state(player).await;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(inbound) => {
                    debug!(%scorepad_id, player_id = %player, message = ?inbound, "received player message");
                    session.handle_message(player, inbound).await;
                }
                Err(err) => {
                    warn!(%scorepad_id, player_id = %player, error = %err, payload = %text.as_str(), "failed to parse player message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%scorepad_id, player_id = %player, "player closed connection");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%scorepad_id, player_id = %player, error = %err, "websocket error");
                break;
            }
        }
    }

    if session.leave(player, connection_id) {
        info!(%scorepad_id, player_id = %player, "player disconnected");
    } else {
        debug!(%scorepad_id, player_id = %player, "stale connection closed after replacement");
    }

    drop(connection);
    finalize(writer_task, outbound_tx).await;
}

/// Resolve the game session for the ids the client connected with.
async fn attach(
    state: &SharedState,
    scorepad_id: &str,
    player_id: &str,
    connection: Connection,
) -> Result<(Arc<GameSession>, PlayerId), AttachError> {
    if state.is_degraded() {
        return Err(AttachError::Unavailable(ServiceError::Degraded));
    }

    state
        .sessions()
        .attach(state.store_slot(), scorepad_id, player_id, connection)
        .await
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
