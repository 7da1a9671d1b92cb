/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::sync::Arc;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{MatchReceipt, NewMatchEntity, ScorepadEntity, TermEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence of scorepads and their match history.
pub trait ScorepadStore: Send + Sync {
    /// Fetch a scorepad together with its players, in roster order.
    fn find_scorepad(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScorepadEntity>>>;
    /// Append a completed match to the scorepad's history.
    fn append_match(
        &self,
        scorepad_id: Uuid,
        entry: NewMatchEntity,
    ) -> BoxFuture<'static, StorageResult<MatchReceipt>>;
    /// Check the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Abstraction over the catalogue of terms handed out to players.
pub trait TermStore: Send + Sync {
    /// Pick up to `count` random terms whose value is not listed in `excluded`.
    fn random_unused(
        &self,
        excluded: Vec<String>,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<TermEntity>>>;
    /// List the whole catalogue.
    fn list_terms(&self) -> BoxFuture<'static, StorageResult<Vec<TermEntity>>>;
    /// Add a term, returning the existing entry when the value is already known.
    fn add_term(&self, value: String) -> BoxFuture<'static, StorageResult<TermEntity>>;
    /// Delete a term, returning whether it existed.
    fn delete_term(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
}

/// Handles to the installed storage backend.
#[derive(Clone)]
pub struct Stores {
    /// Scorepads and match history.
    pub scorepads: Arc<dyn ScorepadStore>,
    /// Term catalogue.
    pub terms: Arc<dyn TermStore>,
}

impl Stores {
    /// Use a single backend implementing both stores.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: ScorepadStore + TermStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            scorepads: backend.clone(),
            terms: backend,
        }
    }
}
