use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dao::models::OwnerIdentity,
    dto::preset::{CreatePresetRequest, PresetView},
    error::AppError,
    routes::sessions::require_owner,
    services::preset_service,
    state::SharedState,
};

/// Owner-authenticated cost preset endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/presets", get(list_presets).post(create_preset))
        .route("/presets/{id}", delete(delete_preset))
        .route_layer(middleware::from_fn_with_state(state, require_owner))
}

#[utoipa::path(
    get,
    path = "/presets",
    tag = "presets",
    params(("Authorization" = String, Header, description = "Owner bearer credential")),
    responses((status = 200, description = "Presets owned by the caller", body = [PresetView]))
)]
/// List the caller's cost presets.
pub async fn list_presets(
    State(state): State<SharedState>,
    Extension(owner): Extension<OwnerIdentity>,
) -> Result<Json<Vec<PresetView>>, AppError> {
    Ok(Json(preset_service::list_presets(&state, &owner).await?))
}

#[utoipa::path(
    post,
    path = "/presets",
    tag = "presets",
    request_body = CreatePresetRequest,
    params(("Authorization" = String, Header, description = "Owner bearer credential")),
    responses(
        (status = 200, description = "Created preset", body = PresetView),
        (status = 409, description = "Per-owner preset cap reached")
    )
)]
/// Create a cost preset (at most two per owner).
pub async fn create_preset(
    State(state): State<SharedState>,
    Extension(owner): Extension<OwnerIdentity>,
    Json(request): Json<CreatePresetRequest>,
) -> Result<Json<PresetView>, AppError> {
    let preset = preset_service::create_preset(&state, &owner, request).await?;
    Ok(Json(preset))
}

#[utoipa::path(
    delete,
    path = "/presets/{id}",
    tag = "presets",
    params(
        ("Authorization" = String, Header, description = "Owner bearer credential"),
        ("id" = Uuid, Path, description = "Preset identifier")
    ),
    responses(
        (status = 204, description = "Preset deleted; referencing sessions cleared"),
        (status = 404, description = "Unknown preset")
    )
)]
/// Delete a preset, clearing references on sessions that used it.
pub async fn delete_preset(
    State(state): State<SharedState>,
    Extension(owner): Extension<OwnerIdentity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    preset_service::delete_preset(&state, &owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
