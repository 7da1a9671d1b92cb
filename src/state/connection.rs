use axum::extract::ws::Message;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::{dto::ws::ServerMessage, state::game::PlayerId};

/// Failure to push a message to a player.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The socket writer is gone; the client will get a replay when it reconnects.
    #[error("connection closed")]
    Closed,
}

/// Handle used to push messages to a connected player.
#[derive(Debug, Clone)]
pub struct Connection {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

impl Connection {
    /// Wrap the sender feeding a socket writer task.
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// Identifier distinguishing successive sockets of the same player.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the socket writer still accepts messages.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Serialize `message` and queue it on the socket writer.
    ///
    /// Serialization failures are logged and swallowed; only a closed writer is reported.
    pub fn send(&self, message: &ServerMessage) -> Result<(), ConnectionError> {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize message `{message:?}`");
                return Ok(());
            }
        };

        self.tx
            .send(Message::Text(payload.into()))
            .map_err(|_| ConnectionError::Closed)
    }
}

/// Outcome of sending one message to every connection of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Players the message was queued for.
    pub delivered: Vec<PlayerId>,
    /// Players whose connection was already closed.
    pub skipped: Vec<PlayerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_reports_closed_writer() {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection::new(tx);
        assert!(connection.is_open());

        drop(rx);

        assert!(!connection.is_open());
        assert_eq!(
            connection.send(&ServerMessage::Reset),
            Err(ConnectionError::Closed)
        );
    }

    #[test]
    fn send_queues_json_text_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection = Connection::new(tx);

        connection.send(&ServerMessage::Error("boom".into())).unwrap();

        match rx.try_recv().unwrap() {
            Message::Text(text) => {
                assert_eq!(text.as_str(), r#"{"type":"error","payload":"boom"}"#)
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
