use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoIdentityDocument, MongoPresetDocument, MongoSessionDocument, preset_doc_id,
        session_doc_id,
    },
};
use crate::dao::{
    models::{CostPresetEntity, OwnerIdentity, SessionEntity},
    session_store::DraftStore,
    storage::StorageResult,
};

const SESSION_COLLECTION_NAME: &str = "sessions";
const PRESET_COLLECTION_NAME: &str = "cost_presets";
const IDENTITY_COLLECTION_NAME: &str = "identities";

#[derive(Clone)]
pub struct MongoDraftStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

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

impl MongoDraftStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let sessions = database.collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME);

        let session_indexes = [
            (doc! {"owner_user_id": 1, "is_complete": 1}, "session_owner_open_idx", "owner_user_id,is_complete"),
            (doc! {"last_activity_at": -1}, "session_activity_idx", "last_activity_at"),
            (doc! {"is_complete": 1, "completed_at": -1}, "session_completed_idx", "is_complete,completed_at"),
            (doc! {"blue_token": 1}, "session_blue_token_idx", "blue_token"),
            (doc! {"red_token": 1}, "session_red_token_idx", "red_token"),
        ];
        for (keys, name, fields) in session_indexes {
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(Some(name.to_owned())).build())
                .build();
            sessions
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: SESSION_COLLECTION_NAME,
                    index: fields,
                    source,
                })?;
        }

        let presets = database.collection::<MongoPresetDocument>(PRESET_COLLECTION_NAME);
        let preset_index = mongodb::IndexModel::builder()
            .keys(doc! {"owner_user_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("preset_owner_idx".to_owned()))
                    .build(),
            )
            .build();
        presets
            .create_index(preset_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PRESET_COLLECTION_NAME,
                index: "owner_user_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn sessions(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn presets(&self) -> Collection<MongoPresetDocument> {
        self.database()
            .await
            .collection::<MongoPresetDocument>(PRESET_COLLECTION_NAME)
    }

    async fn identities(&self) -> Collection<MongoIdentityDocument> {
        self.database()
            .await
            .collection::<MongoIdentityDocument>(IDENTITY_COLLECTION_NAME)
    }

    async fn save_session(&self, session: SessionEntity) -> MongoResult<()> {
        let key = session.session_key.clone();
        let document: MongoSessionDocument = session.into();
        self.sessions()
            .await
            .replace_one(session_doc_id(&key), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSession { key, source })?;
        Ok(())
    }

    async fn find_session(&self, key: String) -> MongoResult<Option<SessionEntity>> {
        let document = self
            .sessions()
            .await
            .find_one(session_doc_id(&key))
            .await
            .map_err(|source| MongoDaoError::LoadSession { key, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_open_session_for_owner(
        &self,
        owner_id: String,
    ) -> MongoResult<Option<SessionEntity>> {
        let document = self
            .sessions()
            .await
            .find_one(doc! {"owner_user_id": owner_id, "is_complete": false})
            .await
            .map_err(|source| MongoDaoError::FindSession { source })?;
        Ok(document.map(Into::into))
    }

    async fn find_session_by_player_token(
        &self,
        token: String,
    ) -> MongoResult<Option<SessionEntity>> {
        let document = self
            .sessions()
            .await
            .find_one(doc! {"$or": [{"blue_token": token.as_str()}, {"red_token": token.as_str()}]})
            .await
            .map_err(|source| MongoDaoError::FindSession { source })?;
        Ok(document.map(Into::into))
    }

    async fn delete_session(&self, key: String) -> MongoResult<bool> {
        let result = self
            .sessions()
            .await
            .delete_one(session_doc_id(&key))
            .await
            .map_err(|source| MongoDaoError::DeleteSession { key, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn list_recent_sessions(
        &self,
        limit: i64,
        offset: u64,
    ) -> MongoResult<Vec<SessionEntity>> {
        let documents: Vec<MongoSessionDocument> = self
            .sessions()
            .await
            .find(doc! {"is_complete": true})
            .sort(doc! {"completed_at": -1})
            .skip(offset)
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_live_sessions(
        &self,
        since: SystemTime,
        limit: i64,
        offset: u64,
    ) -> MongoResult<Vec<SessionEntity>> {
        let cutoff = DateTime::from_system_time(since);
        let documents: Vec<MongoSessionDocument> = self
            .sessions()
            .await
            .find(doc! {"is_complete": false, "last_activity_at": {"$gte": cutoff}})
            .sort(doc! {"last_activity_at": -1})
            .skip(offset)
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_preset(&self, preset: CostPresetEntity) -> MongoResult<()> {
        let id = preset.id;
        let document: MongoPresetDocument = preset.into();
        self.presets()
            .await
            .replace_one(preset_doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePreset { id, source })?;
        Ok(())
    }

    async fn find_preset(&self, id: Uuid) -> MongoResult<Option<CostPresetEntity>> {
        let document = self
            .presets()
            .await
            .find_one(preset_doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadPreset { id, source })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn list_presets_for_owner(&self, owner_id: String) -> MongoResult<Vec<CostPresetEntity>> {
        let documents: Vec<MongoPresetDocument> = self
            .presets()
            .await
            .find(doc! {"owner_user_id": owner_id})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListPresets { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListPresets { source })?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_preset(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .presets()
            .await
            .delete_one(preset_doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeletePreset { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn clear_preset_references(&self, id: Uuid) -> MongoResult<u64> {
        let result = self
            .sessions()
            .await
            .update_many(
                doc! {"cost_profile_id": id.to_string()},
                doc! {"$set": {"cost_profile_id": Bson::Null}},
            )
            .await
            .map_err(|source| MongoDaoError::ClearPresetRefs { id, source })?;
        Ok(result.modified_count)
    }

    async fn resolve_identity(&self, bearer: String) -> MongoResult<Option<OwnerIdentity>> {
        let document = self
            .identities()
            .await
            .find_one(doc! {"_id": bearer})
            .await
            .map_err(|source| MongoDaoError::ResolveIdentity { source })?;
        Ok(document.map(|identity| OwnerIdentity {
            user_id: identity.user_id,
        }))
    }
}

impl DraftStore for MongoDraftStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_session(session).await.map_err(Into::into) })
    }

    fn find_session(&self, key: String) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_session(key).await.map_err(Into::into) })
    }

    fn find_open_session_for_owner(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_open_session_for_owner(owner_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_session_by_player_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_session_by_player_token(token)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_session(&self, key: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_session(key).await.map_err(Into::into) })
    }

    fn list_recent_sessions(
        &self,
        limit: i64,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_recent_sessions(limit, offset)
                .await
                .map_err(Into::into)
        })
    }

    fn list_live_sessions(
        &self,
        since: SystemTime,
        limit: i64,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_live_sessions(since, limit, offset)
                .await
                .map_err(Into::into)
        })
    }

    fn save_preset(&self, preset: CostPresetEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_preset(preset).await.map_err(Into::into) })
    }

    fn find_preset(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CostPresetEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_preset(id).await.map_err(Into::into) })
    }

    fn list_presets_for_owner(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<CostPresetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_presets_for_owner(owner_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_preset(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_preset(id).await.map_err(Into::into) })
    }

    fn clear_preset_references(&self, id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .clear_preset_references(id)
                .await
                .map_err(Into::into)
        })
    }

    fn resolve_identity(
        &self,
        bearer: String,
    ) -> BoxFuture<'static, StorageResult<Option<OwnerIdentity>>> {
        let store = self.clone();
        Box::pin(async move { store.resolve_identity(bearer).await.map_err(Into::into) })
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
