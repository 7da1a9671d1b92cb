use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoMatchDocument, MongoPlayerDocument, MongoScorepadDocument, MongoTermDocument, doc_id,
    },
};
use crate::dao::{
    models::{MatchReceipt, NewMatchEntity, PlayerEntity, ScorepadEntity, TermEntity},
    scorepad_store::{ScorepadStore, TermStore},
    storage::{StorageError, StorageResult},
};

const SCOREPAD_COLLECTION_NAME: &str = "scorepads";
const PLAYER_COLLECTION_NAME: &str = "players";
const TERM_COLLECTION_NAME: &str = "terms";

/// MongoDB implementation of the scorepad and term stores.
#[derive(Clone)]
pub struct MongoScorepadStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScorepadStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState { client, database }),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! {"value": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("term_value_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        self.terms()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TERM_COLLECTION_NAME,
                index: "value",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.state.read().await.database.clone()
    }

    async fn scorepads(&self) -> Collection<MongoScorepadDocument> {
        self.database()
            .await
            .collection::<MongoScorepadDocument>(SCOREPAD_COLLECTION_NAME)
    }

    async fn players(&self) -> Collection<MongoPlayerDocument> {
        self.database()
            .await
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    async fn terms(&self) -> Collection<MongoTermDocument> {
        self.database()
            .await
            .collection::<MongoTermDocument>(TERM_COLLECTION_NAME)
    }

    async fn find_scorepad(&self, id: Uuid) -> MongoResult<Option<ScorepadEntity>> {
        let Some(document) = self
            .scorepads()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadScorepad {
                id: id.to_string(),
                source,
            })?
        else {
            return Ok(None);
        };

        let player_docs: Vec<MongoPlayerDocument> = self
            .players()
            .await
            .find(doc! {"_id": {"$in": document.players.clone()}})
            .await
            .map_err(|source| MongoDaoError::LoadPlayers {
                id: id.to_string(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPlayers {
                id: id.to_string(),
                source,
            })?;

        let players = player_docs
            .into_iter()
            .map(PlayerEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;

        document.into_entity(players).map(Some)
    }

    /// Append a match by rewriting the scorepad document; `None` when the scorepad is unknown.
    ///
    /// Matches of one scorepad are only ever appended by its single game session,
    /// so the read-modify-write cannot interleave with another append.
    async fn append_match(
        &self,
        scorepad_id: Uuid,
        entry: NewMatchEntity,
    ) -> MongoResult<Option<MatchReceipt>> {
        let collection = self.scorepads().await;
        let Some(mut document) = collection
            .find_one(doc_id(scorepad_id))
            .await
            .map_err(|source| MongoDaoError::LoadScorepad {
                id: scorepad_id.to_string(),
                source,
            })?
        else {
            return Ok(None);
        };

        let stored = entry.with_id(Uuid::new_v4());
        let receipt = MatchReceipt::from(&stored);
        document.matches.push(MongoMatchDocument::from(stored));

        collection
            .replace_one(doc_id(scorepad_id), &document)
            .await
            .map_err(|source| MongoDaoError::AppendMatch {
                id: scorepad_id.to_string(),
                source,
            })?;

        Ok(Some(receipt))
    }

    async fn random_unused(&self, excluded: Vec<String>, count: usize) -> MongoResult<Vec<TermEntity>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let pipeline = vec![
            doc! {"$match": {"value": {"$nin": excluded}}},
            doc! {"$sample": {"size": count as i64}},
        ];

        let documents: Vec<MongoTermDocument> = self
            .terms()
            .await
            .aggregate(pipeline)
            .with_type::<MongoTermDocument>()
            .await
            .map_err(|source| MongoDaoError::QueryTerms { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryTerms { source })?;

        documents.into_iter().map(TermEntity::try_from).collect()
    }

    async fn list_terms(&self) -> MongoResult<Vec<TermEntity>> {
        let documents: Vec<MongoTermDocument> = self
            .terms()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::QueryTerms { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryTerms { source })?;

        documents.into_iter().map(TermEntity::try_from).collect()
    }

    async fn add_term(&self, value: String) -> MongoResult<TermEntity> {
        let value = value.to_lowercase();
        let collection = self.terms().await;

        if let Some(existing) = collection
            .find_one(doc! {"value": &value})
            .await
            .map_err(|source| MongoDaoError::QueryTerms { source })?
        {
            return existing.try_into();
        }

        let document = MongoTermDocument {
            id: Uuid::new_v4().to_string(),
            value,
        };
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveTerm {
                value: document.value.clone(),
                source,
            })?;

        document.try_into()
    }

    async fn delete_term(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .terms()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteTerm {
                id: id.to_string(),
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

impl ScorepadStore for MongoScorepadStore {
    fn find_scorepad(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScorepadEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_scorepad(id).await.map_err(Into::into) })
    }

    fn append_match(
        &self,
        scorepad_id: Uuid,
        entry: NewMatchEntity,
    ) -> BoxFuture<'static, StorageResult<MatchReceipt>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .append_match(scorepad_id, entry)
                .await?
                .ok_or_else(|| StorageError::missing("scorepad", scorepad_id))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

impl TermStore for MongoScorepadStore {
    fn random_unused(
        &self,
        excluded: Vec<String>,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<TermEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .random_unused(excluded, count)
                .await
                .map_err(Into::into)
        })
    }

    fn list_terms(&self) -> BoxFuture<'static, StorageResult<Vec<TermEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_terms().await.map_err(Into::into) })
    }

    fn add_term(&self, value: String) -> BoxFuture<'static, StorageResult<TermEntity>> {
        let store = self.clone();
        Box::pin(async move { store.add_term(value).await.map_err(Into::into) })
    }

    fn delete_term(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_term(id).await.map_err(Into::into) })
    }
}
