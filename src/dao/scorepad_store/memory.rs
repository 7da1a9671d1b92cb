//! In-process storage backend, seeded from an optional JSON fixture.
//!
//! Used for local runs without MongoDB and by the test suites.

use std::{fs, io, path::Path, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ScorepadStore, TermStore};
use crate::dao::{
    models::{MatchReceipt, NewMatchEntity, ScorepadEntity, TermEntity},
    storage::{StorageError, StorageResult},
};

/// Failures while loading a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("failed to read fixture `{path}`")]
    Read {
        /// Fixture location.
        path: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The fixture file is not valid JSON.
    #[error("failed to parse fixture `{path}`")]
    Parse {
        /// Fixture location.
        path: String,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}

impl From<FixtureError> for StorageError {
    fn from(err: FixtureError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// JSON layout of a fixture file.
#[derive(Debug, Default, Deserialize)]
pub struct MemoryFixture {
    /// Scorepads with their players and history.
    #[serde(default)]
    pub scorepads: Vec<ScorepadEntity>,
    /// Term catalogue; values are lowercased on load.
    #[serde(default)]
    pub terms: Vec<String>,
}

/// Scorepad and term store kept in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    scorepads: DashMap<Uuid, ScorepadEntity>,
    terms: RwLock<Vec<TermEntity>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding the fixture's scorepads and terms.
    pub fn from_fixture(fixture: MemoryFixture) -> Self {
        let scorepads = fixture
            .scorepads
            .into_iter()
            .map(|scorepad| (scorepad.id, scorepad))
            .collect();
        let terms = fixture
            .terms
            .into_iter()
            .map(|value| TermEntity {
                id: Uuid::new_v4(),
                value: value.to_lowercase(),
            })
            .collect();

        Self {
            inner: Arc::new(MemoryInner {
                scorepads,
                terms: RwLock::new(terms),
            }),
        }
    }

    /// Load a fixture from disk.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: display.clone(),
            source,
        })?;
        let fixture = serde_json::from_str::<MemoryFixture>(&contents)
            .map_err(|source| FixtureError::Parse {
                path: display,
                source,
            })?;
        Ok(Self::from_fixture(fixture))
    }

    /// Insert or replace a scorepad.
    pub fn insert_scorepad(&self, scorepad: ScorepadEntity) {
        self.inner.scorepads.insert(scorepad.id, scorepad);
    }

    /// Current copy of a scorepad, including appended matches.
    pub fn scorepad(&self, id: Uuid) -> Option<ScorepadEntity> {
        self.inner.scorepads.get(&id).map(|entry| entry.clone())
    }

    async fn insert_term(&self, value: String) -> TermEntity {
        let value = value.to_lowercase();
        let mut terms = self.inner.terms.write().await;
        if let Some(existing) = terms.iter().find(|term| term.value == value) {
            return existing.clone();
        }
        let term = TermEntity {
            id: Uuid::new_v4(),
            value,
        };
        terms.push(term.clone());
        term
    }
}

impl ScorepadStore for MemoryStore {
    fn find_scorepad(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScorepadEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.scorepad(id)) })
    }

    fn append_match(
        &self,
        scorepad_id: Uuid,
        entry: NewMatchEntity,
    ) -> BoxFuture<'static, StorageResult<MatchReceipt>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scorepad = store
                .inner
                .scorepads
                .get_mut(&scorepad_id)
                .ok_or_else(|| StorageError::missing("scorepad", scorepad_id))?;
            let stored = entry.with_id(Uuid::new_v4());
            let receipt = MatchReceipt::from(&stored);
            scorepad.matches.push(stored);
            Ok(receipt)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

impl TermStore for MemoryStore {
    fn random_unused(
        &self,
        excluded: Vec<String>,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<TermEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut candidates: Vec<TermEntity> = store
                .inner
                .terms
                .read()
                .await
                .iter()
                .filter(|term| !excluded.contains(&term.value))
                .cloned()
                .collect();
            candidates.shuffle(&mut rand::rng());
            candidates.truncate(count);
            Ok(candidates)
        })
    }

    fn list_terms(&self) -> BoxFuture<'static, StorageResult<Vec<TermEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.terms.read().await.clone()) })
    }

    fn add_term(&self, value: String) -> BoxFuture<'static, StorageResult<TermEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_term(value).await) })
    }

    fn delete_term(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut terms = store.inner.terms.write().await;
            let before = terms.len();
            terms.retain(|term| term.id != id);
            Ok(terms.len() != before)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::PlayerEntity;
    use indexmap::IndexMap;
    use std::time::SystemTime;

    fn fixture() -> MemoryFixture {
        MemoryFixture {
            scorepads: vec![ScorepadEntity {
                id: Uuid::new_v4(),
                game: "JanK".into(),
                players: vec![PlayerEntity {
                    id: Uuid::new_v4(),
                    name: "Ada".into(),
                    picture: None,
                }],
                matches: Vec::new(),
            }],
            terms: vec!["Apple".into(), "pear".into(), "plum".into()],
        }
    }

    #[tokio::test]
    async fn random_unused_skips_excluded_values() {
        let store = MemoryStore::from_fixture(fixture());

        let picked = store
            .random_unused(vec!["apple".into(), "plum".into()], 3)
            .await
            .unwrap();

        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].value, "pear");
    }

    #[tokio::test]
    async fn random_unused_respects_count() {
        let store = MemoryStore::from_fixture(fixture());
        let picked = store.random_unused(Vec::new(), 2).await.unwrap();
        assert_eq!(picked.len(), 2);
    }

    #[tokio::test]
    async fn add_term_returns_existing_entry_for_duplicates() {
        let store = MemoryStore::new();

        let first = TermStore::add_term(&store, "Banana".into()).await.unwrap();
        let second = TermStore::add_term(&store, "BANANA".into()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.value, "banana");
        assert_eq!(store.list_terms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_term_reports_whether_it_existed() {
        let store = MemoryStore::new();
        let term = TermStore::add_term(&store, "kiwi".into()).await.unwrap();

        assert!(store.delete_term(term.id).await.unwrap());
        assert!(!store.delete_term(term.id).await.unwrap());
    }

    #[tokio::test]
    async fn append_match_grows_history_and_generates_id() {
        let fixture = fixture();
        let scorepad_id = fixture.scorepads[0].id;
        let player_id = fixture.scorepads[0].players[0].id;
        let store = MemoryStore::from_fixture(fixture);

        let mut score = IndexMap::new();
        score.insert(player_id, 3);
        let receipt = store
            .append_match(
                scorepad_id,
                NewMatchEntity {
                    terms: IndexMap::new(),
                    rounds: Vec::new(),
                    score: score.clone(),
                    created_at: SystemTime::now(),
                },
            )
            .await
            .unwrap();

        let stored = store.scorepad(scorepad_id).unwrap();
        assert_eq!(stored.matches.len(), 1);
        assert_eq!(stored.matches[0].id, receipt.id);
        assert_eq!(receipt.score, score);
    }

    #[tokio::test]
    async fn append_match_to_unknown_scorepad_fails() {
        let store = MemoryStore::new();
        let result = store
            .append_match(
                Uuid::new_v4(),
                NewMatchEntity {
                    terms: IndexMap::new(),
                    rounds: Vec::new(),
                    score: IndexMap::new(),
                    created_at: SystemTime::now(),
                },
            )
            .await;
        assert!(matches!(result, Err(StorageError::Missing { .. })));
    }
}
