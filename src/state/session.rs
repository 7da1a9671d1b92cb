//! Game session of one scorepad: connected players, the current match and its persistence.

use std::{fmt, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{BetPayload, ClientMessage, PayoutPayload, ServerMessage, WordPayload},
    error::ServiceError,
    state::{
        StoreSlot,
        connection::{Connection, FanOut},
        distribution::{distribute, joker_count, terms_needed},
        game::{PlayerId, Scorepad, Term},
        game_match::{BetOutcome, Match, MatchError},
        state_machine::MatchPhase,
    },
};

const DEAL_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const DEAL_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

const DEAL_FAILED_MESSAGE: &str = "Unable to deal terms, retrying.";
const PERSIST_FAILED_MESSAGE: &str = "Unable to save the match, please submit your bet again.";

/// Live game of one scorepad.
///
/// Connections are kept per player (last writer wins). Every match mutation
/// happens under the `inner` lock, one inbound message at a time.
pub struct GameSession {
    scorepad: Scorepad,
    connections: DashMap<PlayerId, Connection>,
    inner: Mutex<SessionInner>,
    stores: StoreSlot,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connected: Vec<PlayerId> = self.connections.iter().map(|entry| *entry.key()).collect();
        f.debug_struct("GameSession")
            .field("scorepad_id", &self.scorepad.id)
            .field("connected", &connected)
            .finish_non_exhaustive()
    }
}

struct SessionInner {
    current: Option<Match>,
    /// Terms never dealt again on this scorepad.
    used_terms: Vec<String>,
}

impl GameSession {
    /// Session for `scorepad` without connections or match.
    pub fn new(scorepad: Scorepad, stores: StoreSlot) -> Arc<Self> {
        let used_terms = scorepad.used_terms.clone();
        Arc::new(Self {
            scorepad,
            connections: DashMap::new(),
            inner: Mutex::new(SessionInner {
                current: None,
                used_terms,
            }),
            stores,
        })
    }

    /// Scorepad snapshot taken when the session was created.
    pub fn scorepad(&self) -> &Scorepad {
        &self.scorepad
    }

    /// Whether at least one player connection is still open.
    pub fn is_active(&self) -> bool {
        self.connections.iter().any(|entry| entry.value().is_open())
    }

    /// Register `connection` for `player` and exchange presence with everyone else.
    ///
    /// A previous connection of the same player is replaced but not closed.
    pub fn join(&self, player: PlayerId, connection: Connection) {
        for entry in self.connections.iter() {
            let other = *entry.key();
            if other == player {
                continue;
            }
            let _ = entry.value().send(&ServerMessage::Connect(player));
            let _ = connection.send(&ServerMessage::Connect(other));
        }

        if self.connections.insert(player, connection).is_some() {
            debug!(scorepad_id = %self.scorepad.id, player_id = %player, "replaced player connection");
        }
    }

    /// Remove the connection of `player` if it is still the registered one.
    ///
    /// Returns whether it was removed, in which case the others are told the player left.
    pub fn leave(&self, player: PlayerId, connection_id: Uuid) -> bool {
        let removed = self
            .connections
            .remove_if(&player, |_, connection| connection.id() == connection_id)
            .is_some();
        if removed {
            self.broadcast(&ServerMessage::Disconnect(player));
        }
        removed
    }

    /// Send the match as `player` is allowed to see it, starting a match when there is none.
    ///
    /// While terms are being dealt, the player receives them with everyone else.
    pub async fn send_initial_state(self: &Arc<Self>, player: PlayerId) {
        let mut inner = self.inner.lock().await;
        let Some(current) = inner.current.as_ref() else {
            self.start_match(&mut inner);
            return;
        };
        let Some(connection) = self.connection(&player) else {
            return;
        };

        let phase = current.phase();
        let mut replay = vec![ServerMessage::State(phase.into())];

        if phase == MatchPhase::Payout {
            replay.push(ServerMessage::Payout(payout_payload(
                current,
                current.score().cloned().unwrap_or_default(),
            )));
        } else if let Some(term) = current.term_of(&player) {
            replay.push(ServerMessage::Term(term.as_str().to_owned()));
        }

        for (round, entry) in current.rounds().iter().enumerate() {
            replay.extend(entry.words.iter().map(|(author, word)| {
                ServerMessage::Word(WordPayload {
                    player_id: *author,
                    round,
                    word: word.clone(),
                })
            }));
            if let Some(bet) = entry.bets.get(&player) {
                replay.push(ServerMessage::Bet(BetPayload {
                    player_id: player,
                    round,
                    bet: *bet,
                }));
            }
        }

        if phase == MatchPhase::Payout {
            replay.extend(current.ready().iter().copied().map(ServerMessage::Ready));
        }

        for message in &replay {
            if connection.send(message).is_err() {
                debug!(scorepad_id = %self.scorepad.id, player_id = %player, "connection closed during replay");
                break;
            }
        }
    }

    /// Start a match unless one is already running.
    #[cfg(test)]
    pub(crate) async fn ensure_match(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        self.start_match(&mut inner);
    }

    /// Route one inbound message of `player` to the current match.
    pub async fn handle_message(self: &Arc<Self>, player: PlayerId, message: ClientMessage) {
        let mut inner = self.inner.lock().await;
        let Some(current) = inner.current.as_mut() else {
            debug!(scorepad_id = %self.scorepad.id, player_id = %player, "message ignored: no match");
            return;
        };

        match message {
            ClientMessage::Word(word) => match current.record_word(player, &word) {
                Ok(outcome) => {
                    self.broadcast(&ServerMessage::Word(WordPayload {
                        player_id: player,
                        round: outcome.round,
                        word: outcome.word,
                    }));
                    if outcome.bets_opened {
                        self.broadcast(&ServerMessage::State(current.phase().into()));
                    }
                }
                Err(err) => self.reject(player, "word", err),
            },
            ClientMessage::Bet(bet) => match current.record_bet(player, bet) {
                Ok(BetOutcome::Recorded) => {}
                Ok(BetOutcome::RoundSettled) => {
                    self.broadcast(&ServerMessage::State(current.phase().into()));
                }
                Ok(BetOutcome::AllBetsIn) => self.settle(&mut inner).await,
                Err(err) => self.reject(player, "bet", err),
            },
            ClientMessage::New => match current.mark_ready(player) {
                Ok(all_ready) => {
                    self.broadcast(&ServerMessage::Ready(player));
                    if all_ready {
                        info!(scorepad_id = %self.scorepad.id, "every player is ready; starting a new match");
                        self.broadcast(&ServerMessage::Reset);
                        inner.current = None;
                        self.start_match(&mut inner);
                    }
                }
                Err(err) => self.reject(player, "new", err),
            },
        }
    }

    /// Send `message` to every registered connection, skipping closed ones.
    pub fn broadcast(&self, message: &ServerMessage) -> FanOut {
        let mut fan_out = FanOut::default();
        for entry in self.connections.iter() {
            match entry.value().send(message) {
                Ok(()) => fan_out.delivered.push(*entry.key()),
                Err(_) => fan_out.skipped.push(*entry.key()),
            }
        }

        if !fan_out.skipped.is_empty() {
            debug!(
                scorepad_id = %self.scorepad.id,
                skipped = ?fan_out.skipped,
                "broadcast skipped closed connections"
            );
        }
        fan_out
    }

    #[cfg(test)]
    pub(crate) async fn phase(&self) -> Option<MatchPhase> {
        self.inner.lock().await.current.as_ref().map(Match::phase)
    }

    fn connection(&self, player: &PlayerId) -> Option<Connection> {
        self.connections.get(player).map(|entry| entry.value().clone())
    }

    fn start_match(self: &Arc<Self>, inner: &mut SessionInner) {
        if inner.current.is_some() {
            return;
        }

        let roster = self.scorepad.players.iter().map(|player| player.id).collect();
        let current = Match::new(roster);
        let match_id = current.id();
        inner.current = Some(current);

        info!(scorepad_id = %self.scorepad.id, %match_id, "match created; dealing terms");
        tokio::spawn(self.clone().deal_terms(match_id, inner.used_terms.clone()));
    }

    /// Fetch terms until it succeeds or nobody is left, then deal them to the match `match_id`.
    async fn deal_terms(self: Arc<Self>, match_id: Uuid, excluded: Vec<String>) {
        let players = self.scorepad.players.len();
        let jokers = joker_count(players, &mut rand::rng());
        let needed = terms_needed(players, jokers);

        let mut delay = DEAL_RETRY_INITIAL_DELAY;
        let terms = loop {
            match self.fetch_terms(excluded.clone(), needed).await {
                Ok(terms) => break terms,
                Err(err) => {
                    warn!(scorepad_id = %self.scorepad.id, %match_id, error = %err, "failed to fetch terms");
                    self.broadcast(&ServerMessage::Error(DEAL_FAILED_MESSAGE.into()));

                    if self.abandon_if_idle(match_id).await {
                        return;
                    }
                    sleep(delay).await;
                    delay = (delay * 2).min(DEAL_RETRY_MAX_DELAY);
                }
            }
        };

        if terms.len() < needed {
            warn!(
                scorepad_id = %self.scorepad.id,
                requested = needed,
                received = terms.len(),
                "term catalogue ran short; dealing extra jokers"
            );
        }

        let mut inner = self.inner.lock().await;
        let Some(current) = inner
            .current
            .as_mut()
            .filter(|current| current.id() == match_id && current.phase() == MatchPhase::Loading)
        else {
            debug!(scorepad_id = %self.scorepad.id, %match_id, "match replaced before terms were dealt");
            return;
        };

        let dealt = distribute(current.roster(), terms, &mut rand::rng());
        for (player, term) in &dealt {
            if let Some(connection) = self.connection(player) {
                let _ = connection.send(&ServerMessage::Term(term.as_str().to_owned()));
            }
        }

        if let Err(err) = current.deal(dealt) {
            warn!(scorepad_id = %self.scorepad.id, %match_id, error = %err, "failed to deal terms");
            return;
        }
        self.broadcast(&ServerMessage::State(current.phase().into()));
    }

    /// Drop the match `match_id` when no player is connected; returns whether the deal should stop.
    async fn abandon_if_idle(&self, match_id: Uuid) -> bool {
        if self.is_active() {
            return false;
        }

        let mut inner = self.inner.lock().await;
        // A player joining before the lock was taken replays this match.
        if self.is_active() {
            return false;
        }
        if inner.current.as_ref().is_some_and(|current| current.id() == match_id) {
            debug!(scorepad_id = %self.scorepad.id, %match_id, "nobody left; dropping undealt match");
            inner.current = None;
        }
        true
    }

    async fn fetch_terms(&self, excluded: Vec<String>, count: usize) -> Result<Vec<Term>, ServiceError> {
        let stores = self.stores.require().await?;
        let terms = stores.terms.random_unused(excluded, count).await?;
        Ok(terms.into_iter().map(|term| Term::new(term.value)).collect())
    }

    /// Score the match, persist it and publish the payout.
    ///
    /// On a storage failure the match stays in betting with every bet, so the
    /// next resubmitted bet retries.
    async fn settle(&self, inner: &mut SessionInner) {
        let Some(current) = inner.current.as_mut() else {
            return;
        };

        let (plan_id, score) = match current.plan_payout() {
            Ok(planned) => planned,
            Err(err) => {
                warn!(scorepad_id = %self.scorepad.id, error = %err, "failed to plan payout");
                return;
            }
        };
        let record = current.to_record(score);

        let persisted = match self.stores.require().await {
            Ok(stores) => stores
                .scorepads
                .append_match(self.scorepad.id, record)
                .await
                .map_err(ServiceError::from),
            Err(err) => Err(err),
        };

        let receipt = match persisted {
            Ok(receipt) => receipt,
            Err(err) => {
                if let Err(abort_err) = current.abort_payout(plan_id) {
                    warn!(scorepad_id = %self.scorepad.id, error = %abort_err, "failed to abort payout");
                }
                warn!(scorepad_id = %self.scorepad.id, error = %err, "failed to persist match; keeping bets");
                self.broadcast(&ServerMessage::Error(PERSIST_FAILED_MESSAGE.into()));
                return;
            }
        };

        if let Err(err) = current.finish_payout(plan_id, receipt.score.clone()) {
            warn!(scorepad_id = %self.scorepad.id, error = %err, "failed to apply payout");
            return;
        }

        let payout = payout_payload(current, receipt.score);
        let played: Vec<String> = current
            .terms()
            .values()
            .filter(|term| !term.is_joker())
            .map(|term| term.as_str().to_owned())
            .collect();
        let phase = current.phase();

        for term in played {
            if !inner.used_terms.contains(&term) {
                inner.used_terms.push(term);
            }
        }

        info!(scorepad_id = %self.scorepad.id, match_id = %receipt.id, "match persisted");
        self.broadcast(&ServerMessage::State(phase.into()));
        self.broadcast(&ServerMessage::Payout(payout));
    }

    fn reject(&self, player: PlayerId, action: &'static str, err: MatchError) {
        match err {
            MatchError::WrongPhase { .. } => {
                debug!(scorepad_id = %self.scorepad.id, player_id = %player, action, error = %err, "message ignored");
            }
            _ => {
                warn!(scorepad_id = %self.scorepad.id, player_id = %player, action, error = %err, "malformed message dropped");
            }
        }
    }
}

fn payout_payload(current: &Match, score_map: indexmap::IndexMap<PlayerId, i32>) -> PayoutPayload {
    PayoutPayload {
        terms: current
            .terms()
            .iter()
            .map(|(player, term)| (*player, term.as_str().to_owned()))
            .collect(),
        score_map,
    }
}
