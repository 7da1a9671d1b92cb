use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB backend operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a scorepad failed.
    #[error("failed to load scorepad `{id}`")]
    LoadScorepad {
        /// Document identifier.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading the players of a scorepad failed.
    #[error("failed to load the players of scorepad `{id}`")]
    LoadPlayers {
        /// Document identifier.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Writing a completed match failed.
    #[error("failed to append a match to scorepad `{id}`")]
    AppendMatch {
        /// Document identifier.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading the term catalogue failed.
    #[error("failed to query the term catalogue")]
    QueryTerms {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a term failed.
    #[error("failed to save term `{value}`")]
    SaveTerm {
        /// Offending value.
        value: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Deleting a term failed.
    #[error("failed to delete term `{id}`")]
    DeleteTerm {
        /// Document identifier.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A stored document holds a value that does not parse.
    #[error("stored document `{id}` has an invalid {field}: `{value}`")]
    InvalidDocument {
        /// Document identifier.
        id: String,
        /// Field holding the value.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}
