//! Cost preset management: bounded per-owner creation and reference-safe
//! deletion.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{CostPresetEntity, OwnerIdentity},
    dto::preset::{CreatePresetRequest, PresetView},
    dto::validation::validate_preset_name,
    error::ServiceError,
    services::session_service::ensure_owner_budget,
    state::SharedState,
};

/// Most presets one owner may keep.
const MAX_PRESETS_PER_OWNER: usize = 2;
const CHAR_COST_VECTOR_LEN: usize = 7;
const ACCESSORY_COST_VECTOR_LEN: usize = 5;

/// Create a preset for `owner`, enforcing the per-owner cap.
pub async fn create_preset(
    state: &SharedState,
    owner: &OwnerIdentity,
    request: CreatePresetRequest,
) -> Result<PresetView, ServiceError> {
    ensure_owner_budget(state, owner)?;
    let store = state.require_draft_store().await?;

    validate_preset_name(&request.name)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    validate_cost_vectors(&request)?;

    let existing = store.list_presets_for_owner(owner.user_id.clone()).await?;
    if existing.len() >= MAX_PRESETS_PER_OWNER {
        return Err(ServiceError::InvalidState(format!(
            "at most {MAX_PRESETS_PER_OWNER} cost presets per owner"
        )));
    }

    let now = SystemTime::now();
    let entity = CostPresetEntity {
        id: Uuid::new_v4(),
        owner_user_id: owner.user_id.clone(),
        name: request.name,
        char_cost: request.char_cost,
        accessory_cost: request.accessory_cost,
        created_at: now,
        updated_at: now,
    };
    store.save_preset(entity.clone()).await?;
    info!(preset = %entity.id, "cost preset created");
    Ok(PresetView::from(&entity))
}

/// List the presets owned by `owner`, oldest first.
pub async fn list_presets(
    state: &SharedState,
    owner: &OwnerIdentity,
) -> Result<Vec<PresetView>, ServiceError> {
    let store = state.require_draft_store().await?;
    let presets = store.list_presets_for_owner(owner.user_id.clone()).await?;
    Ok(presets.iter().map(PresetView::from).collect())
}

/// Delete a preset, clearing the reference on any session that points at it
/// first so those sessions stay valid.
pub async fn delete_preset(
    state: &SharedState,
    owner: &OwnerIdentity,
    preset_id: Uuid,
) -> Result<(), ServiceError> {
    ensure_owner_budget(state, owner)?;
    let store = state.require_draft_store().await?;

    let preset = store
        .find_preset(preset_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("cost preset `{preset_id}` not found")))?;
    if preset.owner_user_id != owner.user_id {
        return Err(ServiceError::Forbidden(
            "cost preset belongs to another owner".into(),
        ));
    }

    let cleared = store.clear_preset_references(preset_id).await?;
    store.delete_preset(preset_id).await?;
    info!(preset = %preset_id, cleared, "cost preset deleted");
    Ok(())
}

fn validate_cost_vectors(request: &CreatePresetRequest) -> Result<(), ServiceError> {
    for (code, costs) in &request.char_cost {
        if costs.len() != CHAR_COST_VECTOR_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "character cost for `{code}` must have {CHAR_COST_VECTOR_LEN} entries"
            )));
        }
    }
    for (id, costs) in &request.accessory_cost {
        if costs.len() != ACCESSORY_COST_VECTOR_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "accessory cost for `{id}` must have {ACCESSORY_COST_VECTOR_LEN} entries"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn cost_vector_lengths_are_enforced() {
        let good = CreatePresetRequest {
            name: "Season costs".into(),
            char_cost: IndexMap::from([("c1".to_owned(), vec![0.5; 7])]),
            accessory_cost: IndexMap::from([("a1".to_owned(), vec![0.25; 5])]),
        };
        assert!(validate_cost_vectors(&good).is_ok());

        let short_char = CreatePresetRequest {
            name: "bad".into(),
            char_cost: IndexMap::from([("c1".to_owned(), vec![0.5; 6])]),
            accessory_cost: IndexMap::new(),
        };
        assert!(matches!(
            validate_cost_vectors(&short_char),
            Err(ServiceError::InvalidInput(_))
        ));

        let long_accessory = CreatePresetRequest {
            name: "bad".into(),
            char_cost: IndexMap::new(),
            accessory_cost: IndexMap::from([("a1".to_owned(), vec![0.25; 6])]),
        };
        assert!(matches!(
            validate_cost_vectors(&long_accessory),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
