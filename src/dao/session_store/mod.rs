pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{CostPresetEntity, OwnerIdentity, SessionEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for draft sessions, cost presets,
/// and the owner-identity lookup the draft core depends on.
///
/// Methods take owned arguments so implementations can move them into
/// `'static` futures.
pub trait DraftStore: Send + Sync {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_session(&self, key: String) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Open (not yet complete) session owned by `owner_id`, if any. Used by
    /// create to hand back an existing draft instead of minting another.
    fn find_open_session_for_owner(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Session holding `token` as either side's player token.
    fn find_session_by_player_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    fn delete_session(&self, key: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Completed sessions, newest `completed_at` first.
    fn list_recent_sessions(
        &self,
        limit: i64,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Unfinished sessions active since `since`, newest `last_activity_at`
    /// first.
    fn list_live_sessions(
        &self,
        since: SystemTime,
        limit: i64,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;

    fn save_preset(&self, preset: CostPresetEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_preset(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CostPresetEntity>>>;
    fn list_presets_for_owner(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<CostPresetEntity>>>;
    fn delete_preset(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Null out `cost_profile_id` on every session referencing the preset,
    /// returning how many rows changed. Ran before the preset row goes away
    /// so references never dangle.
    fn clear_preset_references(&self, id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Resolve a bearer credential to the owning user, if known.
    fn resolve_identity(
        &self,
        bearer: String,
    ) -> BoxFuture<'static, StorageResult<Option<OwnerIdentity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
