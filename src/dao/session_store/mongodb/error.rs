use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("missing required environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save session `{key}`")]
    SaveSession {
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load session `{key}`")]
    LoadSession {
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete session `{key}`")]
    DeleteSession {
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to look up session by query")]
    FindSession {
        #[source]
        source: MongoError,
    },
    #[error("failed to list sessions")]
    ListSessions {
        #[source]
        source: MongoError,
    },
    #[error("failed to save cost preset `{id}`")]
    SavePreset {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load cost preset `{id}`")]
    LoadPreset {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete cost preset `{id}`")]
    DeletePreset {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list cost presets")]
    ListPresets {
        #[source]
        source: MongoError,
    },
    #[error("cost preset row carries malformed id `{id}`")]
    DecodePreset {
        id: String,
        #[source]
        source: uuid::Error,
    },
    #[error("failed to clear references to cost preset `{id}`")]
    ClearPresetRefs {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to resolve owner identity")]
    ResolveIdentity {
        #[source]
        source: MongoError,
    },
}
