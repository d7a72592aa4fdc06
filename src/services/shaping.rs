//! Row shaping: the one place a session row turns into its transport form.
//!
//! Shaping renames columns to their wire keys, formats timestamps, embeds
//! the joined cost preset, and normalizes the state document so every
//! filled slot carries both the current and the legacy field spellings.
//! Player tokens never pass through here.

use serde_json::Value;

use crate::dao::models::{CostPresetEntity, SessionEntity};
use crate::dto::format_system_time;
use crate::dto::preset::PresetView;
use crate::dto::session::SessionView;

/// Slot alias pairs exposed on shaped payloads: canonical name first,
/// legacy spelling second.
const SLOT_ALIASES: [(&str, &str); 3] = [
    ("accessoryId", "wengineId"),
    ("superimpose", "phase"),
    ("eidolon", "mindscape"),
];

/// Shape a session row for transport, embedding `preset` when the row
/// references one.
pub fn shape_session(entity: &SessionEntity, preset: Option<&CostPresetEntity>) -> SessionView {
    SessionView {
        id: entity.session_key.clone(),
        owner_id: entity.owner_user_id.clone(),
        mode: entity.mode,
        team1: entity.team1.clone(),
        team2: entity.team2.clone(),
        state: normalize_state(&entity.state),
        featured: entity.featured.clone(),
        is_complete: entity.is_complete,
        completed_at: entity.completed_at.map(format_system_time),
        last_activity_at: format_system_time(entity.last_activity_at),
        cost_profile_id: entity.cost_profile_id,
        cost_profile: preset.map(PresetView::from),
        cost_limit: entity.cost_limit,
        penalty_per_point: entity.penalty_per_point,
    }
}

/// Expose both current and legacy field names on every filled slot. When a
/// slot carries only one spelling, the other is filled in from it; when
/// both are present, the canonical one wins. Applying this twice changes
/// nothing.
pub fn normalize_state(raw: &Value) -> Value {
    let mut value = raw.clone();
    let Some(picks) = value.get_mut("picks").and_then(Value::as_array_mut) else {
        return value;
    };
    for slot in picks.iter_mut() {
        let Some(fields) = slot.as_object_mut() else {
            continue;
        };
        for (canonical, legacy) in SLOT_ALIASES {
            match fields.get(canonical).cloned() {
                Some(current) => {
                    fields.insert(legacy.to_owned(), current);
                }
                None => {
                    if let Some(old) = fields.get(legacy).cloned() {
                        fields.insert(canonical.to_owned(), old);
                    }
                }
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::Mode;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::time::{Duration, SystemTime};
    use uuid::Uuid;

    fn entity() -> SessionEntity {
        SessionEntity {
            session_key: "k".repeat(22),
            owner_user_id: "owner-1".into(),
            mode: Mode::ThreeBan,
            team1: "Alpha".into(),
            team2: "Omega".into(),
            state: json!({
                "draftSequence": ["BB", "RR"],
                "currentTurn": 1,
                "picks": [{"characterCode": "c1", "accessoryId": "a1", "superimpose": 2}, null],
            }),
            featured: Vec::new(),
            is_complete: true,
            completed_at: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(86_400)),
            last_activity_at: SystemTime::UNIX_EPOCH + Duration::from_secs(86_400),
            blue_token: "b".repeat(20),
            red_token: "r".repeat(20),
            cost_profile_id: Some(Uuid::nil()),
            cost_limit: 9.0,
            penalty_per_point: 2500,
        }
    }

    #[test]
    fn shaped_row_uses_wire_keys_and_formats_timestamps() {
        let view = shape_session(&entity(), None);
        let encoded = serde_json::to_value(&view).unwrap();
        assert_eq!(encoded.get("id"), Some(&json!("k".repeat(22))));
        assert_eq!(encoded.get("mode"), Some(&json!("3ban")));
        assert_eq!(encoded.get("costLimit"), Some(&json!(9.0)));
        assert_eq!(
            encoded.get("completedAt"),
            Some(&json!("1970-01-02T00:00:00Z"))
        );
        assert!(encoded.get("blueToken").is_none());
    }

    #[test]
    fn shaped_row_embeds_the_joined_preset() {
        let preset = CostPresetEntity {
            id: Uuid::nil(),
            owner_user_id: "owner-1".into(),
            name: "Season costs".into(),
            char_cost: IndexMap::from([("c1".to_owned(), vec![1.0; 7])]),
            accessory_cost: IndexMap::new(),
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        };
        let view = shape_session(&entity(), Some(&preset));
        let embedded = view.cost_profile.expect("preset should be embedded");
        assert_eq!(embedded.name, "Season costs");
        assert_eq!(embedded.char_cost.get("c1"), Some(&vec![1.0; 7]));
    }

    #[test]
    fn normalization_adds_legacy_aliases() {
        let normalized = normalize_state(&entity().state);
        let slot = &normalized["picks"][0];
        assert_eq!(slot.get("accessoryId"), Some(&json!("a1")));
        assert_eq!(slot.get("wengineId"), Some(&json!("a1")));
        assert_eq!(slot.get("superimpose"), Some(&json!(2)));
        assert_eq!(slot.get("phase"), Some(&json!(2)));
        assert_eq!(normalized["picks"][1], Value::Null);
    }

    #[test]
    fn normalization_promotes_legacy_only_fields() {
        let raw = json!({
            "picks": [{"characterCode": "c1", "wengineId": "w1", "mindscape": 3}],
        });
        let normalized = normalize_state(&raw);
        let slot = &normalized["picks"][0];
        assert_eq!(slot.get("accessoryId"), Some(&json!("w1")));
        assert_eq!(slot.get("eidolon"), Some(&json!(3)));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_state(&entity().state);
        let twice = normalize_state(&once);
        assert_eq!(once, twice);
    }
}
