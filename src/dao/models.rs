use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Player registered in the surrounding scorekeeping application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Display name of the player.
    pub name: String,
    /// Reference to the uploaded picture, if any.
    #[serde(default)]
    pub picture: Option<String>,
}

/// Named group of players and the history of the matches they played.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScorepadEntity {
    /// Stable identifier for the scorepad.
    pub id: Uuid,
    /// Kind of game tracked by the scorepad (e.g. "JanK").
    pub game: String,
    /// Ordered list of participating players.
    pub players: Vec<PlayerEntity>,
    /// Completed matches, oldest first.
    #[serde(default)]
    pub matches: Vec<MatchEntity>,
}

/// Words and bets submitted during one round of a match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Word submitted by each player.
    pub words: IndexMap<Uuid, String>,
    /// Pair of players each player bet on.
    pub bets: IndexMap<Uuid, [Uuid; 2]>,
}

/// Completed match as stored in a scorepad's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Identifier generated by the store when the match was appended.
    pub id: Uuid,
    /// Term each player held (the joker sentinel for unpaired players).
    pub terms: IndexMap<Uuid, String>,
    /// Both rounds of the match.
    pub rounds: Vec<RoundEntity>,
    /// Score delta of every player.
    pub score: IndexMap<Uuid, i32>,
    /// Time the match was completed.
    pub created_at: SystemTime,
}

/// Completed match handed to the store, which assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatchEntity {
    /// Term each player held.
    pub terms: IndexMap<Uuid, String>,
    /// Both rounds of the match.
    pub rounds: Vec<RoundEntity>,
    /// Score delta of every player.
    pub score: IndexMap<Uuid, i32>,
    /// Time the match was completed.
    pub created_at: SystemTime,
}

impl NewMatchEntity {
    /// Attach the identifier generated by the store.
    pub fn with_id(self, id: Uuid) -> MatchEntity {
        MatchEntity {
            id,
            terms: self.terms,
            rounds: self.rounds,
            score: self.score,
            created_at: self.created_at,
        }
    }
}

/// Outcome of appending a match to a scorepad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReceipt {
    /// Identifier generated for the stored match.
    pub id: Uuid,
    /// Score delta of every player, as stored.
    pub score: IndexMap<Uuid, i32>,
}

impl From<&MatchEntity> for MatchReceipt {
    fn from(value: &MatchEntity) -> Self {
        Self {
            id: value.id,
            score: value.score.clone(),
        }
    }
}

/// Entry of the term catalogue players get their secret terms from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TermEntity {
    /// Stable identifier for the term.
    pub id: Uuid,
    /// Lowercase term value.
    pub value: String,
}
