use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{MatchEntity, PlayerEntity, RoundEntity, ScorepadEntity, TermEntity};

/// Scorepad as stored in the `scorepads` collection; players are referenced by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScorepadDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub matches: Vec<MongoMatchDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    #[serde(default)]
    words: IndexMap<String, String>,
    #[serde(default)]
    bets: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    id: String,
    terms: IndexMap<String, String>,
    #[serde(default)]
    rounds: Vec<MongoRoundDocument>,
    #[serde(default)]
    score: IndexMap<String, i32>,
    created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTermDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub value: String,
}

impl MongoScorepadDocument {
    /// Assemble the entity, ordering `players` like the scorepad's own list.
    ///
    /// Referenced players missing from the `players` collection are skipped.
    pub fn into_entity(self, players: Vec<PlayerEntity>) -> MongoResult<ScorepadEntity> {
        let id = parse_uuid(&self.id, "_id", &self.id)?;
        let mut by_id: IndexMap<Uuid, PlayerEntity> =
            players.into_iter().map(|player| (player.id, player)).collect();

        let mut ordered = Vec::with_capacity(self.players.len());
        for raw in &self.players {
            let player_id = parse_uuid(&self.id, "player reference", raw)?;
            if let Some(player) = by_id.shift_remove(&player_id) {
                ordered.push(player);
            }
        }

        let matches = self
            .matches
            .into_iter()
            .map(MatchEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(ScorepadEntity {
            id,
            game: self.game,
            players: ordered,
            matches,
        })
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(&value.id, "_id", &value.id)?,
            name: value.name,
            picture: value.picture,
        })
    }
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            words: value
                .words
                .into_iter()
                .map(|(player_id, word)| (player_id.to_string(), word))
                .collect(),
            bets: value
                .bets
                .into_iter()
                .map(|(player_id, bet)| {
                    (
                        player_id.to_string(),
                        bet.iter().map(Uuid::to_string).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl MongoRoundDocument {
    fn into_entity(self, match_id: &str) -> MongoResult<RoundEntity> {
        let words = self
            .words
            .into_iter()
            .map(|(player_id, word)| Ok((parse_uuid(match_id, "word author", &player_id)?, word)))
            .collect::<MongoResult<_>>()?;

        let mut bets = IndexMap::new();
        for (player_id, bet) in self.bets {
            let bettor = parse_uuid(match_id, "bettor", &player_id)?;
            let [first, second] = bet.as_slice() else {
                return Err(MongoDaoError::InvalidDocument {
                    id: match_id.to_owned(),
                    field: "bet",
                    value: bet.join(","),
                });
            };
            bets.insert(
                bettor,
                [
                    parse_uuid(match_id, "bet", first)?,
                    parse_uuid(match_id, "bet", second)?,
                ],
            );
        }

        Ok(RoundEntity { words, bets })
    }
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            terms: value
                .terms
                .into_iter()
                .map(|(player_id, term)| (player_id.to_string(), term))
                .collect(),
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            score: value
                .score
                .into_iter()
                .map(|(player_id, delta)| (player_id.to_string(), delta))
                .collect(),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        let match_id = value.id;
        let terms = value
            .terms
            .into_iter()
            .map(|(player_id, term)| Ok((parse_uuid(&match_id, "term holder", &player_id)?, term)))
            .collect::<MongoResult<_>>()?;
        let score = value
            .score
            .into_iter()
            .map(|(player_id, delta)| Ok((parse_uuid(&match_id, "score", &player_id)?, delta)))
            .collect::<MongoResult<_>>()?;
        let rounds = value
            .rounds
            .into_iter()
            .map(|round| round.into_entity(&match_id))
            .collect::<MongoResult<_>>()?;

        Ok(Self {
            id: parse_uuid(&match_id, "id", &match_id)?,
            terms,
            rounds,
            score,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl TryFrom<MongoTermDocument> for TermEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTermDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(&value.id, "_id", &value.id)?,
            value: value.value,
        })
    }
}

fn parse_uuid(document_id: &str, field: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| MongoDaoError::InvalidDocument {
        id: document_id.to_owned(),
        field,
        value: raw.to_owned(),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
