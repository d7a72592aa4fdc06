//! Database model definitions.

use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::draft::document::Side;
use crate::draft::featured::FeaturedRule;

/// Draft mode selected at session creation. The two families share the
/// engine; they differ in sequence templates and default cost limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Mode {
    #[serde(rename = "2v2")]
    TwoVTwo,
    #[serde(rename = "3v3")]
    ThreeVThree,
    #[serde(rename = "2ban")]
    TwoBan,
    #[serde(rename = "3ban")]
    ThreeBan,
    #[serde(rename = "6ban")]
    SixBan,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::TwoVTwo => "2v2",
            Mode::ThreeVThree => "3v3",
            Mode::TwoBan => "2ban",
            Mode::ThreeBan => "3ban",
            Mode::SixBan => "6ban",
        }
    }

    /// Default cost limit for sessions created without an explicit one.
    pub fn default_cost_limit(self) -> f64 {
        match self {
            Mode::TwoVTwo | Mode::TwoBan => 6.0,
            Mode::ThreeVThree | Mode::ThreeBan | Mode::SixBan => 9.0,
        }
    }
}

/// One persisted draft session, the aggregate root of the engine.
#[derive(Debug, Clone)]
pub struct SessionEntity {
    pub session_key: String,
    pub owner_user_id: String,
    pub mode: Mode,
    pub team1: String,
    pub team2: String,
    /// Opaque state document; the reducer parses and rewrites it, unknown
    /// fields included.
    pub state: Value,
    pub featured: Vec<FeaturedRule>,
    pub is_complete: bool,
    pub completed_at: Option<SystemTime>,
    pub last_activity_at: SystemTime,
    pub blue_token: String,
    pub red_token: String,
    pub cost_profile_id: Option<Uuid>,
    pub cost_limit: f64,
    pub penalty_per_point: i64,
}

impl SessionEntity {
    /// Side authorized by a player token, if the token belongs to this
    /// session.
    pub fn side_for_token(&self, token: &str) -> Option<Side> {
        if token.is_empty() {
            return None;
        }
        if token == self.blue_token {
            Some(Side::Blue)
        } else if token == self.red_token {
            Some(Side::Red)
        } else {
            None
        }
    }
}

/// Named per-owner cost preset joined into session payloads at read time.
#[derive(Debug, Clone)]
pub struct CostPresetEntity {
    pub id: Uuid,
    pub owner_user_id: String,
    pub name: String,
    /// Character code to cost-per-eidolon vector (7 entries).
    pub char_cost: IndexMap<String, Vec<f64>>,
    /// Accessory id to cost-per-superimpose vector (5 entries).
    pub accessory_cost: IndexMap<String, Vec<f64>>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Resolved owner identity for a bearer credential.
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity() -> SessionEntity {
        SessionEntity {
            session_key: "k".repeat(22),
            owner_user_id: "owner-1".into(),
            mode: Mode::TwoBan,
            team1: "Alpha".into(),
            team2: "Omega".into(),
            state: json!({}),
            featured: Vec::new(),
            is_complete: false,
            completed_at: None,
            last_activity_at: SystemTime::UNIX_EPOCH,
            blue_token: "b".repeat(20),
            red_token: "r".repeat(20),
            cost_profile_id: None,
            cost_limit: 6.0,
            penalty_per_point: 2500,
        }
    }

    #[test]
    fn token_resolution() {
        let session = entity();
        assert_eq!(session.side_for_token(&"b".repeat(20)), Some(Side::Blue));
        assert_eq!(session.side_for_token(&"r".repeat(20)), Some(Side::Red));
        assert_eq!(session.side_for_token("nope"), None);
        assert_eq!(session.side_for_token(""), None);
    }

    #[test]
    fn mode_wire_names_and_defaults() {
        assert_eq!(serde_json::to_value(Mode::TwoBan).unwrap(), json!("2ban"));
        assert_eq!(
            serde_json::from_value::<Mode>(json!("3v3")).unwrap(),
            Mode::ThreeVThree
        );
        assert!(serde_json::from_value::<Mode>(json!("4ban")).is_err());
        assert_eq!(Mode::TwoVTwo.default_cost_limit(), 6.0);
        assert_eq!(Mode::SixBan.default_cost_limit(), 9.0);
    }
}
