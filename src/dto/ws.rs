use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::phase::VisibleMatchPhase;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Messages accepted from player WebSocket clients, as `{type, payload}` envelopes.
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Word for the current round.
    Word(String),
    /// Guess of the two players sharing a term.
    Bet([Uuid; 2]),
    /// Ready for the next match.
    New,
}

impl ClientMessage {
    /// Decode a client message from a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Messages pushed to player WebSocket clients, as `{type, payload}` envelopes.
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerMessage {
    /// A player is connected to the session.
    Connect(Uuid),
    /// A player left the session.
    Disconnect(Uuid),
    /// Something went wrong; the text is meant for the player.
    Error(String),
    /// Secret term of the receiving player.
    Term(String),
    /// A player submitted a word.
    Word(WordPayload),
    /// Bet of the receiving player, only replayed on reconnection.
    Bet(BetPayload),
    /// Phase the match moved to.
    State(VisibleMatchPhase),
    /// Outcome of a completed match.
    Payout(PayoutPayload),
    /// A player asked for the next match.
    Ready(Uuid),
    /// Every player is ready; a new match starts.
    Reset,
}

/// Word submitted by a player during a round.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPayload {
    /// Author of the word.
    pub player_id: Uuid,
    /// Zero-based round index.
    pub round: usize,
    /// Submitted word, trimmed.
    pub word: String,
}

/// Bet placed by a player during a round.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetPayload {
    /// Player who placed the bet.
    pub player_id: Uuid,
    /// Zero-based round index.
    pub round: usize,
    /// The two players guessed to share a term.
    pub bet: [Uuid; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// Terms of every player and the score each one won or lost.
pub struct PayoutPayload {
    /// Term each player held.
    pub terms: IndexMap<Uuid, String>,
    /// Score delta of every player.
    pub score_map: IndexMap<Uuid, i32>,
}
