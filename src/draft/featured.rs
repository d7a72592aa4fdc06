//! Featured rules: per-session overrides that globally ban a character or
//! accessory, or force a character into the pool of every draft.
//!
//! Rules arrive from owners as loosely-shaped JSON. Coercion is deliberately
//! forgiving about vocabulary drift (unknown `rule` values collapse to
//! `none`, unknown fields are dropped) and strict about the one combination
//! that has no meaning: a `globalPick` on an accessory.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Effect a featured rule applies at action time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum FeaturedRuleKind {
    #[default]
    None,
    GlobalBan,
    GlobalPick,
}

/// A validated featured rule as persisted on the session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeaturedRule {
    #[serde(rename = "character", rename_all = "camelCase")]
    Character {
        code: String,
        rule: FeaturedRuleKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_cost: Option<f64>,
    },
    #[serde(rename = "accessory", rename_all = "camelCase")]
    Accessory {
        id: String,
        rule: FeaturedRuleKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_cost: Option<f64>,
    },
}

/// Why a submitted featured list was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeaturedError {
    #[error("featured rule {index} is not an object")]
    NotAnObject { index: usize },
    #[error("featured rule {index} has unknown kind `{kind}`")]
    UnknownKind { index: usize, kind: String },
    #[error("featured rule {index} is missing its `{field}` field")]
    MissingField { index: usize, field: &'static str },
    #[error("featured rule {index}: accessories cannot be globalPick")]
    AccessoryGlobalPick { index: usize },
}

/// Coerce a raw featured list into validated rules.
pub fn coerce_featured(raw: &[Value]) -> Result<Vec<FeaturedRule>, FeaturedError> {
    raw.iter()
        .enumerate()
        .map(|(index, entry)| coerce_rule(index, entry))
        .collect()
}

fn coerce_rule(index: usize, entry: &Value) -> Result<FeaturedRule, FeaturedError> {
    let fields = entry
        .as_object()
        .ok_or(FeaturedError::NotAnObject { index })?;
    let kind = fields.get("kind").and_then(Value::as_str).unwrap_or("");
    let rule = coerce_rule_kind(fields.get("rule"));
    let custom_cost = fields.get("customCost").and_then(Value::as_f64);

    match kind {
        "character" => {
            let code = required_str(fields, index, "code")?;
            Ok(FeaturedRule::Character {
                code,
                rule,
                custom_cost,
            })
        }
        "accessory" => {
            let id = required_str(fields, index, "id")?;
            if rule == FeaturedRuleKind::GlobalPick {
                return Err(FeaturedError::AccessoryGlobalPick { index });
            }
            Ok(FeaturedRule::Accessory {
                id,
                rule,
                custom_cost,
            })
        }
        other => Err(FeaturedError::UnknownKind {
            index,
            kind: other.to_owned(),
        }),
    }
}

fn coerce_rule_kind(raw: Option<&Value>) -> FeaturedRuleKind {
    match raw.and_then(Value::as_str) {
        Some("globalBan") => FeaturedRuleKind::GlobalBan,
        Some("globalPick") => FeaturedRuleKind::GlobalPick,
        _ => FeaturedRuleKind::None,
    }
}

fn required_str(
    fields: &serde_json::Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, FeaturedError> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(FeaturedError::MissingField { index, field })
}

/// Fast lookup of the global overrides a reducer run consults.
#[derive(Debug, Default)]
pub struct FeaturedIndex {
    character_global_ban: HashSet<String>,
    character_global_pick: HashSet<String>,
    accessory_global_ban: HashSet<String>,
}

impl FeaturedIndex {
    pub fn build(rules: &[FeaturedRule]) -> Self {
        let mut index = Self::default();
        for rule in rules {
            match rule {
                FeaturedRule::Character {
                    code,
                    rule: FeaturedRuleKind::GlobalBan,
                    ..
                } => {
                    index.character_global_ban.insert(code.clone());
                }
                FeaturedRule::Character {
                    code,
                    rule: FeaturedRuleKind::GlobalPick,
                    ..
                } => {
                    index.character_global_pick.insert(code.clone());
                }
                FeaturedRule::Accessory {
                    id,
                    rule: FeaturedRuleKind::GlobalBan,
                    ..
                } => {
                    index.accessory_global_ban.insert(id.clone());
                }
                _ => {}
            }
        }
        index
    }

    pub fn character_banned(&self, code: &str) -> bool {
        self.character_global_ban.contains(code)
    }

    pub fn character_pick_locked(&self, code: &str) -> bool {
        self.character_global_pick.contains(code)
    }

    pub fn accessory_banned(&self, id: &str) -> bool {
        self.accessory_global_ban.contains(id)
    }
}
