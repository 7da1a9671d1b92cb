//! Runtime view of the scorepad a session plays for, and the values a match is built from.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{PlayerEntity, RoundEntity, ScorepadEntity};

/// Sentinel term handed to players that share their term with nobody.
pub const JOKER_TERM: &str = "JOKER";

/// Identifier of a player, as stored by the scorepad application.
pub type PlayerId = Uuid;

/// Guess naming the two players believed to share a term.
pub type Bet = [PlayerId; 2];

/// Secret term dealt to a player for the duration of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term(String);

impl Term {
    /// Term with the given value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The sentinel dealt to unpaired players.
    pub fn joker() -> Self {
        Self(JOKER_TERM.to_owned())
    }

    /// Whether this is the joker sentinel.
    pub fn is_joker(&self) -> bool {
        self.0 == JOKER_TERM
    }

    /// Value as sent to players.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Member of a scorepad roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Picture reference, if any.
    pub picture: Option<String>,
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            picture: value.picture,
        }
    }
}

/// Snapshot of a scorepad taken when its game session is created.
#[derive(Debug, Clone)]
pub struct Scorepad {
    /// Scorepad identifier.
    pub id: Uuid,
    /// Kind of game tracked by the scorepad.
    pub game: String,
    /// Roster in scorepad order.
    pub players: Vec<Player>,
    /// Terms already played on this scorepad, never dealt again.
    pub used_terms: Vec<String>,
}

impl Scorepad {
    /// Whether `player_id` is on the roster.
    pub fn has_player(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|player| &player.id == player_id)
    }
}

impl From<ScorepadEntity> for Scorepad {
    fn from(value: ScorepadEntity) -> Self {
        let mut used_terms: Vec<String> = Vec::new();
        for term in value
            .matches
            .iter()
            .flat_map(|entry| entry.terms.values())
            .filter(|term| term.as_str() != JOKER_TERM)
        {
            if !used_terms.contains(term) {
                used_terms.push(term.clone());
            }
        }

        Self {
            id: value.id,
            game: value.game,
            players: value.players.into_iter().map(Into::into).collect(),
            used_terms,
        }
    }
}

/// Words and bets submitted during one round; resubmissions overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Round {
    /// Word of each player.
    pub words: IndexMap<PlayerId, String>,
    /// Pair each player bet on.
    pub bets: IndexMap<PlayerId, Bet>,
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            words: value.words,
            bets: value.bets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::MatchEntity;
    use std::time::SystemTime;

    #[test]
    fn scorepad_collects_used_terms_without_jokers() {
        let player = Uuid::new_v4();
        let played = |values: &[&str]| MatchEntity {
            id: Uuid::new_v4(),
            terms: values
                .iter()
                .map(|value| (Uuid::new_v4(), value.to_string()))
                .collect(),
            rounds: Vec::new(),
            score: IndexMap::new(),
            created_at: SystemTime::now(),
        };

        let scorepad = Scorepad::from(ScorepadEntity {
            id: Uuid::new_v4(),
            game: "JanK".into(),
            players: vec![PlayerEntity {
                id: player,
                name: "Ada".into(),
                picture: None,
            }],
            matches: vec![
                played(&["apple", "apple", JOKER_TERM]),
                played(&["pear", "pear", "apple", "apple"]),
            ],
        });

        assert_eq!(scorepad.used_terms, vec!["apple", "pear"]);
        assert!(scorepad.has_player(&player));
        assert!(!scorepad.has_player(&Uuid::new_v4()));
    }

    #[test]
    fn joker_term_is_recognised() {
        assert!(Term::joker().is_joker());
        assert!(!Term::new("apple").is_joker());
    }
}
