use std::net::SocketAddr;

use axum::{
    Extension, Json, Router,
    extract::{ConnectInfo, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};

use crate::{
    dao::models::OwnerIdentity,
    dto::{
        action::ActionRequest,
        session::{
            CreateSessionRequest, LiveQuery, RecentQuery, ResolveTokenResponse,
            SessionCreatedResponse, SessionView, UpdateSessionRequest,
        },
    },
    error::AppError,
    services::{action_service, session_service},
    state::SharedState,
};

/// Public session endpoints: reads, listings, token resolution, and player
/// actions (authorized by side token, not by login).
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/recent", get(list_recent))
        .route("/sessions/live", get(list_live))
        .route("/sessions/{key}", get(get_session))
        .route("/sessions/{key}/actions", post(apply_action))
        .route("/player-tokens/{token}", get(resolve_player_token))
}

/// Owner-authenticated session mutations.
pub fn owner_router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route(
            "/sessions/{key}",
            put(update_session).delete(delete_session),
        )
        .route_layer(middleware::from_fn_with_state(state, require_owner))
}

/// Resolve the bearer credential into an [`OwnerIdentity`] request
/// extension, or refuse the request outright.
pub(crate) async fn require_owner(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".into()))?
        .to_owned();

    let store = state.require_draft_store().await.map_err(AppError::from)?;
    let identity = store
        .resolve_identity(bearer)
        .await
        .map_err(|err| AppError::from(crate::error::ServiceError::from(err)))?
        .ok_or_else(|| AppError::Unauthorized("unknown bearer credential".into()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    params(("Authorization" = String, Header, description = "Owner bearer credential")),
    responses(
        (status = 200, description = "Session created (or the owner's open session returned)", body = SessionCreatedResponse),
        (status = 400, description = "Invalid mode, state shape, or featured rules"),
        (status = 401, description = "Missing or unknown bearer credential")
    )
)]
/// Create a draft session and mint its side tokens.
pub async fn create_session(
    State(state): State<SharedState>,
    Extension(owner): Extension<OwnerIdentity>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    let response = session_service::create_session(&state, &owner, request).await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/sessions/{key}",
    tag = "sessions",
    request_body = UpdateSessionRequest,
    params(
        ("Authorization" = String, Header, description = "Owner bearer credential"),
        ("key" = String, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Updated shaped session", body = SessionView),
        (status = 403, description = "Session belongs to another owner"),
        (status = 409, description = "Session already complete")
    )
)]
/// Apply a partial owner update (administrative snapshot; no clock burn).
pub async fn update_session(
    State(state): State<SharedState>,
    Extension(owner): Extension<OwnerIdentity>,
    Path(key): Path<String>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = session_service::update_session(&state, &owner, &key, request).await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/sessions/{key}",
    tag = "sessions",
    params(
        ("Authorization" = String, Header, description = "Owner bearer credential"),
        ("key" = String, Path, description = "Session identifier")
    ),
    responses(
        (status = 204, description = "Session deleted; streams closed"),
        (status = 409, description = "Completed sessions cannot be deleted")
    )
)]
/// Delete an unfinished session, emitting a terminal `deleted` event.
pub async fn delete_session(
    State(state): State<SharedState>,
    Extension(owner): Extension<OwnerIdentity>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    session_service::delete_session(&state, &owner, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/sessions/{key}",
    tag = "sessions",
    params(("key" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Shaped session row", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
/// Fetch one shaped session row.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let view = session_service::get_session(&state, &key).await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/sessions/recent",
    tag = "sessions",
    responses((status = 200, description = "Completed sessions, newest first", body = [SessionView]))
)]
/// List completed sessions ordered by completion time.
pub async fn list_recent(
    State(state): State<SharedState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<SessionView>>, AppError> {
    let sessions = session_service::list_recent(&state, query).await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    get,
    path = "/sessions/live",
    tag = "sessions",
    responses((status = 200, description = "Active unfinished sessions, most recent first", body = [SessionView]))
)]
/// List unfinished sessions with activity inside the requested window.
pub async fn list_live(
    State(state): State<SharedState>,
    Query(query): Query<LiveQuery>,
) -> Result<Json<Vec<SessionView>>, AppError> {
    let sessions = session_service::list_live(&state, query).await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/actions",
    tag = "sessions",
    request_body = ActionRequest,
    params(("key" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Action applied; shaped session returned", body = SessionView),
        (status = 401, description = "Invalid player token"),
        (status = 409, description = "Action violates draft rules"),
        (status = 429, description = "Action budget exhausted")
    )
)]
/// Apply one player action, authorized by possession of a side token.
pub async fn apply_action(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(key): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = action_service::apply_action(&state, &key, request, Some(addr)).await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/player-tokens/{token}",
    tag = "sessions",
    params(("token" = String, Path, description = "Player side token")),
    responses(
        (status = 200, description = "Side the token authorizes", body = ResolveTokenResponse),
        (status = 403, description = "Unknown player token")
    )
)]
/// Resolve a player token to the side it authorizes.
pub async fn resolve_player_token(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<ResolveTokenResponse>, AppError> {
    let response = session_service::resolve_player_token(&state, &token).await?;
    Ok(Json(response))
}
