//! Session lifecycle: create, owner update, public reads, listings, token
//! resolution, and owner delete.
//!
//! Owner updates are administrative snapshots: they bypass the reducer,
//! never burn the clock, and re-seed missing timer fields only. Player
//! actions live in `action_service`.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rand::{Rng, distributions::Alphanumeric};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{CostPresetEntity, OwnerIdentity, SessionEntity},
        session_store::DraftStore,
    },
    dto::session::{
        CreateSessionRequest, LiveQuery, RecentQuery, ResolveTokenResponse,
        SessionCreatedResponse, SessionView, UpdateSessionRequest,
    },
    dto::validation::{validate_player_token, validate_session_key, validate_team_name},
    draft::document::StateDoc,
    draft::featured::{FeaturedRule, coerce_featured},
    draft::timer,
    error::ServiceError,
    services::shaping::shape_session,
    state::SharedState,
};

const SESSION_KEY_LENGTH: usize = 22;
const PLAYER_TOKEN_LENGTH: usize = 20;
const DEFAULT_PENALTY_PER_POINT: i64 = 2500;
const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

/// Create a session for `owner`, or hand back their already-open one.
pub async fn create_session(
    state: &SharedState,
    owner: &OwnerIdentity,
    request: CreateSessionRequest,
) -> Result<SessionCreatedResponse, ServiceError> {
    ensure_owner_budget(state, owner)?;
    let store = state.require_draft_store().await?;

    if let Some(existing) = store
        .find_open_session_for_owner(owner.user_id.clone())
        .await?
    {
        info!(session = %existing.session_key, "owner already has an open session; returning it");
        let view = shape_with_preset(&store, &existing).await?;
        return Ok(SessionCreatedResponse {
            stream_url: state.config().stream_url(&existing.session_key),
            blue_token: existing.blue_token,
            red_token: existing.red_token,
            session: view,
            created: false,
        });
    }

    validate_team_name(&request.team1)
        .and(validate_team_name(&request.team2))
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let now = SystemTime::now();
    let state_value = validate_and_seed_state(&request.state, timer::epoch_ms(now))?;
    let featured = coerce_featured_input(&request.featured)?;

    if let Some(preset_id) = request.cost_profile_id {
        require_owned_preset(&store, preset_id, owner).await?;
    }

    let entity = SessionEntity {
        session_key: random_token(SESSION_KEY_LENGTH),
        owner_user_id: owner.user_id.clone(),
        mode: request.mode,
        team1: request.team1,
        team2: request.team2,
        state: state_value,
        featured,
        is_complete: false,
        completed_at: None,
        last_activity_at: now,
        blue_token: random_token(PLAYER_TOKEN_LENGTH),
        red_token: random_token(PLAYER_TOKEN_LENGTH),
        cost_profile_id: request.cost_profile_id,
        cost_limit: request
            .cost_limit
            .unwrap_or_else(|| request.mode.default_cost_limit()),
        penalty_per_point: request.penalty_per_point.unwrap_or(DEFAULT_PENALTY_PER_POINT),
    };

    store.save_session(entity.clone()).await?;
    info!(session = %entity.session_key, mode = entity.mode.as_str(), "session created");

    let view = shape_with_preset(&store, &entity).await?;
    Ok(SessionCreatedResponse {
        stream_url: state.config().stream_url(&entity.session_key),
        blue_token: entity.blue_token,
        red_token: entity.red_token,
        session: view,
        created: true,
    })
}

/// Apply a partial owner update and broadcast the shaped result.
pub async fn update_session(
    state: &SharedState,
    owner: &OwnerIdentity,
    key: &str,
    request: UpdateSessionRequest,
) -> Result<SessionView, ServiceError> {
    ensure_owner_budget(state, owner)?;
    let _guard = state
        .locks()
        .acquire(key, state.config().action_deadline)
        .await?;
    let store = state.require_draft_store().await?;

    let mut entity = require_owned_session(&store, key, owner).await?;
    if entity.is_complete {
        return Err(ServiceError::InvalidState(
            "completed sessions are immutable".into(),
        ));
    }

    if let Some(raw_state) = &request.state {
        // Administrative snapshot: validated, re-seeded, never burned.
        entity.state = validate_and_seed_state(raw_state, timer::now_ms())?;
    }
    if let Some(raw_featured) = &request.featured {
        entity.featured = coerce_featured_input(raw_featured)?;
    }
    match request.cost_profile_id {
        Some(Some(preset_id)) => {
            require_owned_preset(&store, preset_id, owner).await?;
            entity.cost_profile_id = Some(preset_id);
        }
        Some(None) => entity.cost_profile_id = None,
        None => {}
    }
    if let Some(cost_limit) = request.cost_limit {
        if !cost_limit.is_finite() || cost_limit < 0.0 {
            return Err(ServiceError::InvalidInput(
                "costLimit must be a non-negative number".into(),
            ));
        }
        entity.cost_limit = cost_limit;
    }
    if let Some(penalty) = request.penalty_per_point {
        if penalty < 0 {
            return Err(ServiceError::InvalidInput(
                "penaltyPerPoint must be non-negative".into(),
            ));
        }
        entity.penalty_per_point = penalty;
    }
    match request.is_complete {
        Some(true) => {
            entity.is_complete = true;
            entity.completed_at = Some(SystemTime::now());
        }
        Some(false) => {
            return Err(ServiceError::InvalidInput(
                "isComplete can only transition to true".into(),
            ));
        }
        None => {}
    }

    entity.last_activity_at = SystemTime::now();
    store.save_session(entity.clone()).await?;

    let view = shape_with_preset(&store, &entity).await?;
    state.hub().publish_update(key, view.clone()).await;
    Ok(view)
}

/// Public read of one shaped session. The persisted row is returned as
/// stored; live burns happen on hub snapshots, not here.
pub async fn get_session(state: &SharedState, key: &str) -> Result<SessionView, ServiceError> {
    if validate_session_key(key).is_err() {
        return Err(ServiceError::NotFound(format!("session `{key}` not found")));
    }
    let store = state.require_draft_store().await?;
    let entity = store
        .find_session(key.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{key}` not found")))?;
    shape_with_preset(&store, &entity).await
}

/// Completed sessions, newest first.
pub async fn list_recent(
    state: &SharedState,
    query: RecentQuery,
) -> Result<Vec<SessionView>, ServiceError> {
    let store = state.require_draft_store().await?;
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let sessions = store.list_recent_sessions(limit, offset).await?;
    Ok(sessions
        .iter()
        .map(|entity| shape_session(entity, None))
        .collect())
}

/// Unfinished sessions with recent activity, newest first.
pub async fn list_live(
    state: &SharedState,
    query: LiveQuery,
) -> Result<Vec<SessionView>, ServiceError> {
    let store = state.require_draft_store().await?;
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let minutes = query
        .minutes
        .filter(|minutes| *minutes > 0)
        .unwrap_or(state.config().live_window_minutes);
    let since = SystemTime::now()
        .checked_sub(Duration::from_secs(minutes.saturating_mul(60)))
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let sessions = store.list_live_sessions(since, limit, offset).await?;
    Ok(sessions
        .iter()
        .map(|entity| shape_session(entity, None))
        .collect())
}

/// Resolve a player token to its side, without naming the session.
pub async fn resolve_player_token(
    state: &SharedState,
    token: &str,
) -> Result<ResolveTokenResponse, ServiceError> {
    if validate_player_token(token).is_err() {
        return Err(ServiceError::Forbidden("unknown player token".into()));
    }
    let store = state.require_draft_store().await?;
    let side = store
        .find_session_by_player_token(token.to_owned())
        .await?
        .as_ref()
        .and_then(|session| session.side_for_token(token));
    match side {
        Some(side) => Ok(ResolveTokenResponse { side }),
        None => Err(ServiceError::Forbidden("unknown player token".into())),
    }
}

/// Owner delete of an unfinished session; spectators get a terminal
/// `deleted` event.
pub async fn delete_session(
    state: &SharedState,
    owner: &OwnerIdentity,
    key: &str,
) -> Result<(), ServiceError> {
    ensure_owner_budget(state, owner)?;
    {
        let _guard = state
            .locks()
            .acquire(key, state.config().action_deadline)
            .await?;
        let store = state.require_draft_store().await?;

        let entity = require_owned_session(&store, key, owner).await?;
        if entity.is_complete {
            return Err(ServiceError::InvalidState(
                "completed sessions cannot be deleted".into(),
            ));
        }
        store.delete_session(key.to_owned()).await?;
    }

    state.hub().publish_deleted(key).await;
    state.locks().evict(key);
    info!(session = %key, "session deleted");
    Ok(())
}

/// Burn-free parse, shape validation, and timer seeding shared by create
/// and owner update.
fn validate_and_seed_state(
    raw: &serde_json::Value,
    now_ms: i64,
) -> Result<serde_json::Value, ServiceError> {
    let mut doc =
        StateDoc::parse(raw).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    timer::ensure_timer_fields(&mut doc, now_ms);
    Ok(doc.to_value())
}

fn coerce_featured_input(raw: &[serde_json::Value]) -> Result<Vec<FeaturedRule>, ServiceError> {
    coerce_featured(raw).map_err(|err| ServiceError::InvalidInput(err.to_string()))
}

pub(crate) fn ensure_owner_budget(
    state: &SharedState,
    owner: &OwnerIdentity,
) -> Result<(), ServiceError> {
    if state.owner_limiter().check(&owner.user_id) {
        Ok(())
    } else {
        Err(ServiceError::RateLimited)
    }
}

async fn require_owned_session(
    store: &Arc<dyn DraftStore>,
    key: &str,
    owner: &OwnerIdentity,
) -> Result<SessionEntity, ServiceError> {
    let entity = store
        .find_session(key.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{key}` not found")))?;
    if entity.owner_user_id != owner.user_id {
        return Err(ServiceError::Forbidden(
            "session belongs to another owner".into(),
        ));
    }
    Ok(entity)
}

async fn require_owned_preset(
    store: &Arc<dyn DraftStore>,
    preset_id: Uuid,
    owner: &OwnerIdentity,
) -> Result<CostPresetEntity, ServiceError> {
    let preset = store
        .find_preset(preset_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("cost preset `{preset_id}` not found")))?;
    if preset.owner_user_id != owner.user_id {
        return Err(ServiceError::Forbidden(
            "cost preset belongs to another owner".into(),
        ));
    }
    Ok(preset)
}

/// Shape a row, joining its cost preset when one is referenced.
pub(crate) async fn shape_with_preset(
    store: &Arc<dyn DraftStore>,
    entity: &SessionEntity,
) -> Result<SessionView, ServiceError> {
    let preset = match entity.cost_profile_id {
        Some(preset_id) => store.find_preset(preset_id).await?,
        None => None,
    };
    Ok(shape_session(entity, preset.as_ref()))
}

fn page_bounds(limit: Option<i64>, offset: Option<u64>) -> (i64, u64) {
    let limit = limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .min(MAX_PAGE_LIMIT);
    (limit, offset.unwrap_or(0))
}

fn random_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_have_the_minted_shape() {
        let key = random_token(SESSION_KEY_LENGTH);
        let token = random_token(PLAYER_TOKEN_LENGTH);
        assert_eq!(key.len(), 22);
        assert_eq!(token.len(), 20);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_token(PLAYER_TOKEN_LENGTH), token);
    }

    #[test]
    fn page_bounds_clamp_and_default() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(500), Some(40)), (100, 40));
        assert_eq!(page_bounds(Some(-3), None), (20, 0));
    }

    #[test]
    fn seeding_materializes_a_disabled_timer() {
        let raw = serde_json::json!({
            "draftSequence": ["BB", "RR"],
            "currentTurn": 0,
            "picks": [null, null],
        });
        let seeded = validate_and_seed_state(&raw, 1_000).unwrap();
        assert_eq!(seeded.get("timerEnabled"), Some(&serde_json::json!(false)));
        assert_eq!(seeded.get("timerUpdatedAt"), Some(&serde_json::json!(1_000)));
    }

    #[test]
    fn malformed_state_is_invalid_input() {
        let raw = serde_json::json!({"draftSequence": [], "currentTurn": 0, "picks": []});
        assert!(matches!(
            validate_and_seed_state(&raw, 0),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
