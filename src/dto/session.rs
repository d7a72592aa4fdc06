//! Session request/response data structures and the shaped session view.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::Mode;
use crate::dto::preset::PresetView;
use crate::draft::document::Side;
use crate::draft::featured::FeaturedRule;

/// Request body for creating a draft session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub mode: Mode,
    pub team1: String,
    pub team2: String,
    /// Seed state document; must pass shape validation. Timer fields left
    /// out are materialized as a disabled timer.
    #[schema(value_type = Object)]
    pub state: Value,
    /// Raw featured rules, coerced server-side.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub featured: Vec<Value>,
    #[serde(default)]
    pub cost_profile_id: Option<Uuid>,
    #[serde(default)]
    pub cost_limit: Option<f64>,
    #[serde(default)]
    pub penalty_per_point: Option<i64>,
}

/// Partial owner update. Absent fields keep their current values;
/// `costProfileId` distinguishes "absent" from an explicit `null` clear.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub state: Option<Value>,
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub featured: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub cost_profile_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub cost_limit: Option<f64>,
    #[serde(default)]
    pub penalty_per_point: Option<i64>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// Session row shaped for transport. Player tokens never appear here; the
/// create response carries them separately, once, to the owner.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub owner_id: String,
    pub mode: Mode,
    pub team1: String,
    pub team2: String,
    /// Normalized state document (legacy slot aliases included).
    #[schema(value_type = Object)]
    pub state: Value,
    pub featured: Vec<FeaturedRule>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub last_activity_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_profile_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_profile: Option<PresetView>,
    pub cost_limit: f64,
    pub penalty_per_point: i64,
}

/// Response to a session create, including the one-time token handout.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    pub session: SessionView,
    pub blue_token: String,
    pub red_token: String,
    pub stream_url: String,
    /// False when an existing open session was handed back instead.
    pub created: bool,
}

/// Response for player-token resolution.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveTokenResponse {
    pub side: Side,
}

/// Pagination for the recent (completed) listing.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct RecentQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Pagination plus activity window for the live listing.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct LiveQuery {
    #[serde(default)]
    pub minutes: Option<u64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_distinguishes_absent_and_null_preset() {
        let absent: UpdateSessionRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.cost_profile_id, None);

        let cleared: UpdateSessionRequest =
            serde_json::from_value(json!({"costProfileId": null})).unwrap();
        assert_eq!(cleared.cost_profile_id, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateSessionRequest =
            serde_json::from_value(json!({"costProfileId": id})).unwrap();
        assert_eq!(set.cost_profile_id, Some(Some(id)));
    }

    #[test]
    fn view_omits_empty_optionals() {
        let view = SessionView {
            id: "k".into(),
            owner_id: "o".into(),
            mode: Mode::TwoBan,
            team1: "a".into(),
            team2: "b".into(),
            state: json!({}),
            featured: Vec::new(),
            is_complete: false,
            completed_at: None,
            last_activity_at: "now".into(),
            cost_profile_id: None,
            cost_profile: None,
            cost_limit: 6.0,
            penalty_per_point: 2500,
        };
        let encoded = serde_json::to_value(&view).unwrap();
        assert!(encoded.get("completedAt").is_none());
        assert!(encoded.get("costProfile").is_none());
        assert_eq!(encoded.get("penaltyPerPoint"), Some(&json!(2500)));
        // tokens must never leak through the shaped view
        assert!(encoded.get("blueToken").is_none());
        assert!(encoded.get("redToken").is_none());
    }
}
