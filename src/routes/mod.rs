use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod presets;
pub mod sessions;
pub mod stream;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sessions::public_router())
        .merge(sessions::owner_router(state.clone()))
        .merge(stream::router())
        .merge(presets::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
