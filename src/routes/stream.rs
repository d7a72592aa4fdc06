use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderName, header},
    response::IntoResponse,
    routing::get,
};
use tracing::info;

use crate::{error::AppError, services::stream_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sessions/{key}/stream",
    tag = "stream",
    params(("key" = String, Path, description = "Session identifier")),
    responses((
        status = 200,
        description = "Spectator event stream: snapshot, update, timer, deleted, not_found",
        content_type = "text/event-stream",
        body = String
    ))
)]
/// Stream realtime draft events for one session to a spectator.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let sse = stream_service::open_stream(&state, &key).await?;
    info!(session = %key, "new spectator stream");

    // Proxy-friendly stream headers; Sse itself sets the content type.
    let headers = [
        (header::CACHE_CONTROL, "no-cache"),
        (header::CONNECTION, "keep-alive"),
        (HeaderName::from_static("x-accel-buffering"), "no"),
    ];
    Ok((headers, sse))
}

/// Configure the spectator stream endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sessions/{key}/stream", get(session_stream))
}
