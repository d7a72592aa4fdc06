//! The player-action pipeline: rate gate, per-session lock, load, burn,
//! reduce, persist, broadcast.
//!
//! A rejected action changes nothing: the burn computed for the attempt is
//! discarded with the rest of the in-memory document, and spectators never
//! see it.

use std::net::SocketAddr;

use tracing::{debug, info};

use crate::{
    dto::action::ActionRequest,
    dto::session::SessionView,
    draft::reducer::{self, Rejection},
    draft::timer,
    draft::{document::StateDoc, featured::FeaturedIndex},
    error::ServiceError,
    services::session_service::shape_with_preset,
    state::SharedState,
};

/// Apply one player action to a session.
pub async fn apply_action(
    state: &SharedState,
    key: &str,
    request: ActionRequest,
    client_addr: Option<SocketAddr>,
) -> Result<SessionView, ServiceError> {
    ensure_action_budget(state, key, &request.pt, client_addr)?;

    let token = request.pt.clone();
    let op = request.op.clone();
    let action = request.into_action().map_err(ServiceError::Rejected)?;

    let _guard = state
        .locks()
        .acquire(key, state.config().action_deadline)
        .await?;
    let store = state.require_draft_store().await?;

    let mut entity = store
        .find_session(key.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{key}` not found")))?;
    if entity.is_complete {
        return Err(ServiceError::Rejected(Rejection::DraftAlreadyCompleted));
    }
    let side = entity
        .side_for_token(&token)
        .ok_or_else(|| ServiceError::Unauthorized("invalid player token".into()))?;

    let mut doc = StateDoc::parse(&entity.state)
        .map_err(|err| ServiceError::InvalidState(format!("stored state unusable: {err}")))?;
    let now_ms = timer::now_ms();
    timer::burn(&mut doc, now_ms);

    let featured = FeaturedIndex::build(&entity.featured);
    if let Err(rejection) = reducer::reduce(&mut doc, side, &action, &featured, now_ms) {
        debug!(session = %key, side = side.key(), op, code = rejection.code(), "action rejected");
        return Err(ServiceError::Rejected(rejection));
    }

    entity.state = doc.to_value();
    entity.last_activity_at = std::time::SystemTime::now();
    store.save_session(entity.clone()).await?;
    info!(session = %key, side = side.key(), op, turn = doc.current_turn, "action applied");

    let view = shape_with_preset(&store, &entity).await?;
    state.hub().publish_update(key, view.clone()).await;
    Ok(view)
}

/// Per-session write budget keyed by the player token when present, the
/// client address otherwise. Tokens are opaque and never logged.
fn ensure_action_budget(
    state: &SharedState,
    key: &str,
    token: &str,
    client_addr: Option<SocketAddr>,
) -> Result<(), ServiceError> {
    let requester = if token.is_empty() {
        client_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_owned())
    } else {
        token.to_owned()
    };
    if state.action_limiter().check(&format!("{key}:{requester}")) {
        Ok(())
    } else {
        Err(ServiceError::RateLimited)
    }
}
