//! Cost preset data structures.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::CostPresetEntity;
use crate::dto::format_system_time;

/// Request body for creating a cost preset.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresetRequest {
    pub name: String,
    /// Character code to 7-entry cost vector (base plus six eidolons).
    #[serde(default)]
    pub char_cost: IndexMap<String, Vec<f64>>,
    /// Accessory id to 5-entry cost vector (one per superimpose level).
    #[serde(default)]
    pub accessory_cost: IndexMap<String, Vec<f64>>,
}

/// Cost preset as embedded in shaped session payloads and preset listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresetView {
    pub id: Uuid,
    pub name: String,
    pub char_cost: IndexMap<String, Vec<f64>>,
    pub accessory_cost: IndexMap<String, Vec<f64>>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CostPresetEntity> for PresetView {
    fn from(entity: &CostPresetEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            char_cost: entity.char_cost.clone(),
            accessory_cost: entity.accessory_cost.clone(),
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}
