use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the draft backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sessions::create_session,
        crate::routes::sessions::update_session,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::list_recent,
        crate::routes::sessions::list_live,
        crate::routes::sessions::apply_action,
        crate::routes::sessions::resolve_player_token,
        crate::routes::stream::session_stream,
        crate::routes::presets::list_presets,
        crate::routes::presets::create_preset,
        crate::routes::presets::delete_preset,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::action::ActionRequest,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::UpdateSessionRequest,
            crate::dto::session::SessionCreatedResponse,
            crate::dto::session::SessionView,
            crate::dto::session::ResolveTokenResponse,
            crate::dto::preset::CreatePresetRequest,
            crate::dto::preset::PresetView,
            crate::dto::sse::TimerEvent,
            crate::dto::sse::SessionDeletedEvent,
            crate::dto::sse::SessionNotFoundEvent,
            crate::dao::models::Mode,
            crate::draft::document::Side,
            crate::draft::featured::FeaturedRule,
            crate::draft::featured::FeaturedRuleKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Draft session lifecycle and player actions"),
        (name = "stream", description = "Server-sent spectator streams"),
        (name = "presets", description = "Per-owner cost presets"),
    )
)]
pub struct ApiDoc;
