//! The state document reduced by the draft engine.
//!
//! The document is stored as opaque JSON on the session row. Fields the
//! engine does not know about (display-only scores, client hints) ride along
//! in `extra` maps and survive every load/store round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use utoipa::ToSchema;

/// Turn token marking a Blue ban slot.
pub const BLUE_BAN_TOKEN: &str = "BB";
/// Turn token marking a Red ban slot.
pub const RED_BAN_TOKEN: &str = "RR";

/// Slot field names that older clients wrote under different keys. Canonical
/// name first, legacy alias second.
const SLOT_FIELD_ALIASES: [(&str, &str); 3] = [
    ("accessoryId", "wengineId"),
    ("superimpose", "phase"),
    ("eidolon", "mindscape"),
];

/// One of the two competing sides of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Side {
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "R")]
    Red,
}

impl Side {
    /// Single-letter key used in wire payloads and turn tokens.
    pub fn key(self) -> &'static str {
        match self {
            Side::Blue => "B",
            Side::Red => "R",
        }
    }
}

/// Side encoded in the first character of a turn token, if any.
pub fn side_of_token(token: &str) -> Option<Side> {
    match token.as_bytes().first() {
        Some(b'B') => Some(Side::Blue),
        Some(b'R') => Some(Side::Red),
        _ => None,
    }
}

/// Whether a turn token denotes a ban slot.
pub fn is_ban_token(token: &str) -> bool {
    token == BLUE_BAN_TOKEN || token == RED_BAN_TOKEN
}

/// Whether `index` is the first ban slot belonging to its side. The first
/// ban of each side runs without a clock.
pub fn is_first_ban_for_side(sequence: &[String], index: usize) -> bool {
    let Some(token) = sequence.get(index) else {
        return false;
    };
    is_ban_token(token) && !sequence[..index].iter().any(|earlier| earlier == token)
}

/// Pair of per-side values, keyed `B` / `R` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidePair<T> {
    #[serde(rename = "B")]
    pub blue: T,
    #[serde(rename = "R")]
    pub red: T,
}

impl<T: Clone> SidePair<T> {
    /// Both sides initialized to the same value.
    pub fn uniform(value: T) -> Self {
        Self {
            blue: value.clone(),
            red: value,
        }
    }
}

impl<T> SidePair<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Blue => &mut self.blue,
            Side::Red => &mut self.red,
        }
    }
}

fn default_superimpose() -> u8 {
    1
}

/// Value written into `picks[i]`: a character plus its upgrades for pick
/// slots, the same shape with placeholder upgrades for ban slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub character_code: String,
    #[serde(default)]
    pub eidolon: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory_id: Option<String>,
    #[serde(default = "default_superimpose")]
    pub superimpose: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Slot {
    /// Fresh slot as written by a `pick` or `ban` action.
    pub fn filled(character_code: String) -> Self {
        Self {
            character_code,
            eidolon: 0,
            accessory_id: None,
            superimpose: 1,
            extra: Map::new(),
        }
    }
}

/// Reasons a state document fails shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("state document is not a draft state object: {0}")]
    Malformed(String),
    #[error("draftSequence must not be empty")]
    EmptySequence,
    #[error("picks length {picks} does not match draftSequence length {sequence}")]
    LengthMismatch { picks: usize, sequence: usize },
    #[error("currentTurn {current_turn} outside [0, {len}]")]
    TurnOutOfRange { current_turn: usize, len: usize },
    #[error("picks[{index}] must be filled (before currentTurn)")]
    EmptyBeforeTurn { index: usize },
    #[error("picks[{index}] must be empty (at or past currentTurn)")]
    FilledPastTurn { index: usize },
}

/// The structure the reducer and timer operate on.
///
/// `blue_scores` / `red_scores` are display data the engine never interprets;
/// every field it does not name ends up in `extra` and is persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDoc {
    pub draft_sequence: Vec<String>,
    pub current_turn: usize,
    pub picks: Vec<Option<Slot>>,
    #[serde(default)]
    pub blue_scores: Vec<Value>,
    #[serde(default)]
    pub red_scores: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_left: Option<SidePair<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<SidePair<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StateDoc {
    /// Parse a raw state value, folding legacy slot aliases into their
    /// canonical fields, and check the structural invariants.
    pub fn parse(raw: &Value) -> Result<Self, ShapeError> {
        let canonical = canonicalize_state(raw);
        let doc: StateDoc = serde_json::from_value(canonical)
            .map_err(|err| ShapeError::Malformed(err.to_string()))?;
        doc.validate_shape()?;
        Ok(doc)
    }

    /// Serialize back to the persisted JSON representation.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Structural invariants: non-empty sequence, aligned `picks`, turn in
    /// range, and a filled prefix / empty suffix around `currentTurn`.
    pub fn validate_shape(&self) -> Result<(), ShapeError> {
        let len = self.draft_sequence.len();
        if len == 0 {
            return Err(ShapeError::EmptySequence);
        }
        if self.picks.len() != len {
            return Err(ShapeError::LengthMismatch {
                picks: self.picks.len(),
                sequence: len,
            });
        }
        if self.current_turn > len {
            return Err(ShapeError::TurnOutOfRange {
                current_turn: self.current_turn,
                len,
            });
        }
        for (index, slot) in self.picks.iter().enumerate() {
            if index < self.current_turn && slot.is_none() {
                return Err(ShapeError::EmptyBeforeTurn { index });
            }
            if index >= self.current_turn && slot.is_some() {
                return Err(ShapeError::FilledPastTurn { index });
            }
        }
        Ok(())
    }

    /// Draft sequence exhausted; only side locks remain.
    pub fn is_pick_complete(&self) -> bool {
        self.current_turn >= self.draft_sequence.len()
    }

    pub fn side_locked(&self, side: Side) -> bool {
        match side {
            Side::Blue => self.blue_locked.unwrap_or(false),
            Side::Red => self.red_locked.unwrap_or(false),
        }
    }

    /// Lock a side. Locking is monotonic; there is no inverse.
    pub fn lock_side(&mut self, side: Side) {
        match side {
            Side::Blue => self.blue_locked = Some(true),
            Side::Red => self.red_locked = Some(true),
        }
    }
}

/// Rewrite legacy slot field names to their canonical equivalents, dropping
/// the legacy keys so they cannot go stale next to an updated canonical one.
pub fn canonicalize_state(raw: &Value) -> Value {
    let mut value = raw.clone();
    let Some(picks) = value.get_mut("picks").and_then(Value::as_array_mut) else {
        return value;
    };
    for slot in picks.iter_mut() {
        let Some(fields) = slot.as_object_mut() else {
            continue;
        };
        for (canonical, legacy) in SLOT_FIELD_ALIASES {
            if let Some(old) = fields.remove(legacy) {
                fields.entry(canonical.to_owned()).or_insert(old);
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sequence() -> Vec<String> {
        ["BB", "RR", "B", "R", "B", "R"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn token_sides() {
        assert_eq!(side_of_token("BB"), Some(Side::Blue));
        assert_eq!(side_of_token("R"), Some(Side::Red));
        assert_eq!(side_of_token("R2"), Some(Side::Red));
        assert_eq!(side_of_token("X"), None);
        assert_eq!(side_of_token(""), None);
        // case-sensitive on purpose
        assert_eq!(side_of_token("b"), None);
    }

    #[test]
    fn ban_tokens() {
        assert!(is_ban_token("BB"));
        assert!(is_ban_token("RR"));
        assert!(!is_ban_token("B"));
        assert!(!is_ban_token("BR"));
    }

    #[test]
    fn first_ban_detection() {
        let seq: Vec<String> = ["BB", "RR", "B", "BB", "R"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        assert!(is_first_ban_for_side(&seq, 0));
        assert!(is_first_ban_for_side(&seq, 1));
        assert!(!is_first_ban_for_side(&seq, 3)); // second Blue ban runs on the clock
        assert!(!is_first_ban_for_side(&seq, 2)); // not a ban at all
        assert!(!is_first_ban_for_side(&seq, 9)); // out of range
    }

    #[test]
    fn parse_preserves_unknown_fields() {
        let raw = json!({
            "draftSequence": sequence(),
            "currentTurn": 1,
            "picks": [
                {"characterCode": "c1", "highlight": true},
                null, null, null, null, null
            ],
            "clientHint": "keep-me",
        });
        let doc = StateDoc::parse(&raw).unwrap();
        assert_eq!(doc.extra.get("clientHint"), Some(&json!("keep-me")));
        let slot = doc.picks[0].as_ref().unwrap();
        assert_eq!(slot.extra.get("highlight"), Some(&json!(true)));
        let round_tripped = doc.to_value();
        assert_eq!(round_tripped.get("clientHint"), Some(&json!("keep-me")));
    }

    #[test]
    fn parse_folds_legacy_slot_aliases() {
        let raw = json!({
            "draftSequence": sequence(),
            "currentTurn": 1,
            "picks": [
                {"characterCode": "c1", "wengineId": "w9", "phase": 3, "mindscape": 2},
                null, null, null, null, null
            ],
        });
        let doc = StateDoc::parse(&raw).unwrap();
        let slot = doc.picks[0].as_ref().unwrap();
        assert_eq!(slot.accessory_id.as_deref(), Some("w9"));
        assert_eq!(slot.superimpose, 3);
        assert_eq!(slot.eidolon, 2);
        assert!(slot.extra.is_empty());
    }

    #[test]
    fn canonical_field_wins_over_alias() {
        let raw = json!({
            "draftSequence": sequence(),
            "currentTurn": 1,
            "picks": [
                {"characterCode": "c1", "accessoryId": "a1", "wengineId": "stale"},
                null, null, null, null, null
            ],
        });
        let doc = StateDoc::parse(&raw).unwrap();
        assert_eq!(
            doc.picks[0].as_ref().unwrap().accessory_id.as_deref(),
            Some("a1")
        );
    }

    #[test]
    fn shape_rejections() {
        let empty = json!({"draftSequence": [], "currentTurn": 0, "picks": []});
        assert_eq!(StateDoc::parse(&empty), Err(ShapeError::EmptySequence));

        let mismatch = json!({"draftSequence": ["B"], "currentTurn": 0, "picks": [null, null]});
        assert_eq!(
            StateDoc::parse(&mismatch),
            Err(ShapeError::LengthMismatch {
                picks: 2,
                sequence: 1
            })
        );

        let out_of_range = json!({"draftSequence": ["B"], "currentTurn": 2, "picks": [null]});
        assert_eq!(
            StateDoc::parse(&out_of_range),
            Err(ShapeError::TurnOutOfRange {
                current_turn: 2,
                len: 1
            })
        );

        let hole = json!({
            "draftSequence": ["B", "R"],
            "currentTurn": 2,
            "picks": [null, {"characterCode": "c1"}],
        });
        assert_eq!(
            StateDoc::parse(&hole),
            Err(ShapeError::EmptyBeforeTurn { index: 0 })
        );

        let early = json!({
            "draftSequence": ["B", "R"],
            "currentTurn": 0,
            "picks": [{"characterCode": "c1"}, null],
        });
        assert_eq!(
            StateDoc::parse(&early),
            Err(ShapeError::FilledPastTurn { index: 0 })
        );
    }

    #[test]
    fn pick_complete_accepts_full_turn() {
        let raw = json!({
            "draftSequence": ["B", "R"],
            "currentTurn": 2,
            "picks": [{"characterCode": "c1"}, {"characterCode": "c2"}],
        });
        let doc = StateDoc::parse(&raw).unwrap();
        assert!(doc.is_pick_complete());
    }
}
