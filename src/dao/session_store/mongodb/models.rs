use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{CostPresetEntity, Mode, SessionEntity};
use crate::draft::featured::FeaturedRule;

/// Session row as stored in the `sessions` collection. Uuids are stored in
/// their hyphenated string form; `state` and `featured` are embedded
/// documents persisted verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    session_key: String,
    owner_user_id: String,
    mode: Mode,
    team1: String,
    team2: String,
    state: Value,
    featured: Vec<FeaturedRule>,
    is_complete: bool,
    completed_at: Option<DateTime>,
    last_activity_at: DateTime,
    blue_token: String,
    red_token: String,
    cost_profile_id: Option<String>,
    cost_limit: f64,
    penalty_per_point: i64,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            session_key: value.session_key,
            owner_user_id: value.owner_user_id,
            mode: value.mode,
            team1: value.team1,
            team2: value.team2,
            state: value.state,
            featured: value.featured,
            is_complete: value.is_complete,
            completed_at: value.completed_at.map(DateTime::from_system_time),
            last_activity_at: DateTime::from_system_time(value.last_activity_at),
            blue_token: value.blue_token,
            red_token: value.red_token,
            cost_profile_id: value.cost_profile_id.map(|id| id.to_string()),
            cost_limit: value.cost_limit,
            penalty_per_point: value.penalty_per_point,
        }
    }
}

impl From<MongoSessionDocument> for SessionEntity {
    fn from(value: MongoSessionDocument) -> Self {
        // A preset reference that no longer parses behaves like a cleared one.
        let cost_profile_id = value
            .cost_profile_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok());
        Self {
            session_key: value.session_key,
            owner_user_id: value.owner_user_id,
            mode: value.mode,
            team1: value.team1,
            team2: value.team2,
            state: value.state,
            featured: value.featured,
            is_complete: value.is_complete,
            completed_at: value.completed_at.map(DateTime::to_system_time),
            last_activity_at: value.last_activity_at.to_system_time(),
            blue_token: value.blue_token,
            red_token: value.red_token,
            cost_profile_id,
            cost_limit: value.cost_limit,
            penalty_per_point: value.penalty_per_point,
        }
    }
}

/// Cost preset row. The cost maps keep their historical column names
/// (`char_ms`, `we_phase`) so existing data keeps loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPresetDocument {
    #[serde(rename = "_id")]
    id: String,
    owner_user_id: String,
    name: String,
    char_ms: IndexMap<String, Vec<f64>>,
    we_phase: IndexMap<String, Vec<f64>>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<CostPresetEntity> for MongoPresetDocument {
    fn from(value: CostPresetEntity) -> Self {
        Self {
            id: value.id.to_string(),
            owner_user_id: value.owner_user_id,
            name: value.name,
            char_ms: value.char_cost,
            we_phase: value.accessory_cost,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoPresetDocument> for CostPresetEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPresetDocument) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id).map_err(|source| MongoDaoError::DecodePreset {
            id: value.id.clone(),
            source,
        })?;
        Ok(Self {
            id,
            owner_user_id: value.owner_user_id,
            name: value.name,
            char_cost: value.char_ms,
            accessory_cost: value.we_phase,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

/// Bearer-credential row maintained by the identity service; this backend
/// only ever reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoIdentityDocument {
    #[serde(rename = "_id")]
    pub bearer: String,
    pub user_id: String,
}

pub fn session_doc_id(key: &str) -> Document {
    doc! {"_id": key}
}

pub fn preset_doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
