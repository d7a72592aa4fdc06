//! The action envelope players post against a session.
//!
//! The wire shape is loose on purpose: one flat object discriminated by
//! `op`, with legacy operation names and field spellings still accepted.
//! [`ActionRequest::into_action`] tightens it into the reducer's closed
//! [`DraftAction`] set before any legality logic runs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::draft::reducer::{DraftAction, Rejection};

/// Raw envelope for `POST /sessions/{key}/actions`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    /// Operation discriminator; legacy names `setMindscape` and
    /// `setWengine` are honored.
    pub op: String,
    /// Player token authorizing one side of the session.
    pub pt: String,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub character_code: Option<String>,
    #[serde(default)]
    pub eidolon: Option<i64>,
    #[serde(default, alias = "phase")]
    pub superimpose: Option<i64>,
    #[serde(default, alias = "wengineId")]
    pub accessory_id: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
}

impl ActionRequest {
    /// Tighten the envelope into a [`DraftAction`]. Anything structurally
    /// off (unknown op, missing field, negative index) is
    /// `invalid-argument`; legality is the reducer's business.
    pub fn into_action(self) -> Result<DraftAction, Rejection> {
        match self.op.as_str() {
            "pick" => Ok(DraftAction::Pick {
                index: required_index(self.index)?,
                character_code: required_string(self.character_code)?,
            }),
            "ban" => Ok(DraftAction::Ban {
                index: required_index(self.index)?,
                character_code: required_string(self.character_code)?,
            }),
            "setEidolon" | "setMindscape" => Ok(DraftAction::SetEidolon {
                index: required_index(self.index)?,
                eidolon: self.eidolon.ok_or(Rejection::InvalidArgument)?,
            }),
            "setSuperimpose" => Ok(DraftAction::SetSuperimpose {
                index: required_index(self.index)?,
                superimpose: self.superimpose.ok_or(Rejection::InvalidArgument)?,
            }),
            "setAccessory" | "setWengine" => Ok(DraftAction::SetAccessory {
                index: required_index(self.index)?,
                accessory_id: self.accessory_id,
            }),
            "setLock" => match self.locked {
                Some(true) => Ok(DraftAction::SetLock),
                // Unlock is never accepted, nor is a lock without a value.
                _ => Err(Rejection::InvalidArgument),
            },
            "undoLast" => Ok(DraftAction::UndoLast {
                index: self.index.map(to_index).transpose()?,
            }),
            _ => Err(Rejection::InvalidArgument),
        }
    }
}

fn required_index(index: Option<i64>) -> Result<usize, Rejection> {
    index.ok_or(Rejection::InvalidArgument).and_then(to_index)
}

fn to_index(index: i64) -> Result<usize, Rejection> {
    usize::try_from(index).map_err(|_| Rejection::InvalidArgument)
}

fn required_string(value: Option<String>) -> Result<String, Rejection> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(Rejection::InvalidArgument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ActionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn pick_envelope_parses() {
        let request = parse(json!({
            "op": "pick",
            "pt": "t".repeat(20),
            "index": 2,
            "characterCode": "c3",
        }));
        assert_eq!(
            request.into_action().unwrap(),
            DraftAction::Pick {
                index: 2,
                character_code: "c3".into()
            }
        );
    }

    #[test]
    fn legacy_op_names_map_to_current_ones() {
        let mindscape = parse(json!({
            "op": "setMindscape", "pt": "x", "index": 2, "eidolon": 4,
        }));
        assert_eq!(
            mindscape.into_action().unwrap(),
            DraftAction::SetEidolon {
                index: 2,
                eidolon: 4
            }
        );

        let wengine = parse(json!({
            "op": "setWengine", "pt": "x", "index": 2, "wengineId": "a1",
        }));
        assert_eq!(
            wengine.into_action().unwrap(),
            DraftAction::SetAccessory {
                index: 2,
                accessory_id: Some("a1".into())
            }
        );
    }

    #[test]
    fn legacy_phase_field_feeds_superimpose() {
        let request = parse(json!({
            "op": "setSuperimpose", "pt": "x", "index": 2, "phase": 3,
        }));
        assert_eq!(
            request.into_action().unwrap(),
            DraftAction::SetSuperimpose {
                index: 2,
                superimpose: 3
            }
        );
    }

    #[test]
    fn accessory_clear_omits_the_id() {
        let request = parse(json!({"op": "setAccessory", "pt": "x", "index": 2}));
        assert_eq!(
            request.into_action().unwrap(),
            DraftAction::SetAccessory {
                index: 2,
                accessory_id: None
            }
        );
    }

    #[test]
    fn lock_requires_locked_true() {
        let lock = parse(json!({"op": "setLock", "pt": "x", "locked": true}));
        assert_eq!(lock.into_action().unwrap(), DraftAction::SetLock);

        let unlock = parse(json!({"op": "setLock", "pt": "x", "locked": false}));
        assert_eq!(unlock.into_action(), Err(Rejection::InvalidArgument));

        let missing = parse(json!({"op": "setLock", "pt": "x"}));
        assert_eq!(missing.into_action(), Err(Rejection::InvalidArgument));
    }

    #[test]
    fn undo_index_is_optional_but_must_be_unsigned() {
        let bare = parse(json!({"op": "undoLast", "pt": "x"}));
        assert_eq!(
            bare.into_action().unwrap(),
            DraftAction::UndoLast { index: None }
        );

        let with_index = parse(json!({"op": "undoLast", "pt": "x", "index": 4}));
        assert_eq!(
            with_index.into_action().unwrap(),
            DraftAction::UndoLast { index: Some(4) }
        );

        let negative = parse(json!({"op": "undoLast", "pt": "x", "index": -1}));
        assert_eq!(negative.into_action(), Err(Rejection::InvalidArgument));
    }

    #[test]
    fn unknown_op_and_missing_fields_are_invalid() {
        let unknown = parse(json!({"op": "dance", "pt": "x"}));
        assert_eq!(unknown.into_action(), Err(Rejection::InvalidArgument));

        let no_code = parse(json!({"op": "pick", "pt": "x", "index": 2}));
        assert_eq!(no_code.into_action(), Err(Rejection::InvalidArgument));

        let empty_code = parse(json!({"op": "ban", "pt": "x", "index": 0, "characterCode": ""}));
        assert_eq!(empty_code.into_action(), Err(Rejection::InvalidArgument));
    }
}
