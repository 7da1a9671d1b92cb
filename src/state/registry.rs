use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::AttachError,
    state::{
        StoreSlot,
        connection::Connection,
        game::{PlayerId, Scorepad},
        session::GameSession,
    },
};

/// Process-wide table of live game sessions, at most one per scorepad.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<GameSession>>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Live session of `scorepad_id`, if any.
    pub fn get(&self, scorepad_id: &Uuid) -> Option<Arc<GameSession>> {
        self.sessions.get(scorepad_id).map(|entry| entry.value().clone())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Bind `connection` to the session of `scorepad_id`, creating the session when needed.
    ///
    /// The ids come straight from the client; unknown or malformed ones are refused
    /// without touching any session. The caller replays the match state afterwards.
    pub async fn attach(
        &self,
        stores: &StoreSlot,
        scorepad_id: &str,
        player_id: &str,
        connection: Connection,
    ) -> Result<(Arc<GameSession>, PlayerId), AttachError> {
        let scorepad_uuid = Uuid::parse_str(scorepad_id)
            .map_err(|_| AttachError::UnknownScorepad(scorepad_id.to_owned()))?;
        let player = Uuid::parse_str(player_id)
            .map_err(|_| AttachError::UnknownPlayer(player_id.to_owned()))?;

        let scorepad = match self.get(&scorepad_uuid) {
            Some(session) => session.scorepad().clone(),
            None => load_scorepad(stores, scorepad_uuid, scorepad_id).await?,
        };
        if !scorepad.has_player(&player) {
            return Err(AttachError::UnknownPlayer(player_id.to_owned()));
        }

        // Joining under the entry guard keeps the reaper from dropping a session
        // between its creation and its first connection.
        let entry = self.sessions.entry(scorepad_uuid).or_insert_with(|| {
            info!(scorepad_id = %scorepad_uuid, "creating game session");
            GameSession::new(scorepad, stores.clone())
        });
        entry.join(player, connection);
        let session = entry.value().clone();
        drop(entry);

        Ok((session, player))
    }

    /// Drop every session without an open connection; returns how many were removed.
    pub fn reap(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|scorepad_id, session| {
            let active = session.is_active();
            if !active {
                debug!(%scorepad_id, "reaping inactive game session");
            }
            active
        });
        before.saturating_sub(self.sessions.len())
    }
}

async fn load_scorepad(stores: &StoreSlot, id: Uuid, raw_id: &str) -> Result<Scorepad, AttachError> {
    let stores = stores.require().await.map_err(AttachError::Unavailable)?;
    stores
        .scorepads
        .find_scorepad(id)
        .await
        .map_err(|err| AttachError::Unavailable(err.into()))?
        .map(Scorepad::from)
        .ok_or_else(|| AttachError::UnknownScorepad(raw_id.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::scorepad_store::Stores,
        dto::{phase::VisibleMatchPhase, ws::ServerMessage},
        state::session::tests::{memory_store, scorepad_entity, slot_with},
    };
    use axum::extract::ws::Message;
    use std::time::Duration;
    use tokio::{sync::mpsc, time::timeout};

    fn channel() -> (Connection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(tx), rx)
    }

    async fn wait_for(rx: &mut mpsc::UnboundedReceiver<Message>, expected: &ServerMessage) {
        loop {
            let frame = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out")
                .expect("closed");
            if let Message::Text(text) = frame {
                let message: ServerMessage = serde_json::from_str(text.as_str()).unwrap();
                if &message == expected {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn unknown_scorepad_and_foreign_player_are_refused() {
        let entity = scorepad_entity(4);
        let slot = slot_with(Stores::from_backend(memory_store(&entity))).await;
        let registry = SessionRegistry::new();
        let unknown = Uuid::new_v4().to_string();
        let player = entity.players[0].id.to_string();

        let (connection, _rx) = channel();
        let err = registry
            .attach(&slot, &unknown, &player, connection)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Scorepad {unknown} does not exist."));

        let stranger = Uuid::new_v4().to_string();
        let (connection, _rx) = channel();
        let err = registry
            .attach(&slot, &entity.id.to_string(), &stranger, connection)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Player {stranger} does not belong to scorepad.")
        );

        let (connection, _rx) = channel();
        assert!(matches!(
            registry
                .attach(&slot, "not-an-id", &player, connection)
                .await,
            Err(AttachError::UnknownScorepad(_))
        ));

        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn attach_is_refused_without_storage() {
        let entity = scorepad_entity(4);
        let registry = SessionRegistry::new();
        let (connection, _rx) = channel();

        let result = registry
            .attach(
                &StoreSlot::default(),
                &entity.id.to_string(),
                &entity.players[0].id.to_string(),
                connection,
            )
            .await;

        assert!(matches!(result, Err(AttachError::Unavailable(_))));
    }

    #[tokio::test]
    async fn players_of_one_scorepad_share_a_session() {
        let entity = scorepad_entity(4);
        let slot = slot_with(Stores::from_backend(memory_store(&entity))).await;
        let registry = SessionRegistry::new();

        let (first_conn, _first_rx) = channel();
        let (first, _) = registry
            .attach(&slot, &entity.id.to_string(), &entity.players[0].id.to_string(), first_conn)
            .await
            .unwrap();
        let (second_conn, _second_rx) = channel();
        let (second, _) = registry
            .attach(&slot, &entity.id.to_string(), &entity.players[1].id.to_string(), second_conn)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn reaper_removes_idle_sessions_and_next_attach_starts_fresh() {
        let entity = scorepad_entity(4);
        let slot = slot_with(Stores::from_backend(memory_store(&entity))).await;
        let registry = SessionRegistry::new();
        let scorepad_id = entity.id.to_string();
        let player = entity.players[0].id.to_string();

        let (connection, mut rx) = channel();
        let (first, player_id) = registry
            .attach(&slot, &scorepad_id, &player, connection)
            .await
            .unwrap();
        first.send_initial_state(player_id).await;
        wait_for(&mut rx, &ServerMessage::State(VisibleMatchPhase::Words)).await;

        assert_eq!(registry.reap(), 0);
        drop(rx);
        assert_eq!(registry.reap(), 1);
        assert!(registry.get(&entity.id).is_none());

        let (connection, mut rx) = channel();
        let (second, player_id) = registry
            .attach(&slot, &scorepad_id, &player, connection)
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        second.send_initial_state(player_id).await;
        wait_for(&mut rx, &ServerMessage::State(VisibleMatchPhase::Words)).await;
        assert_eq!(second.phase().await, Some(crate::state::state_machine::MatchPhase::Words));
    }
}
