//! Pure reduction of player actions over the draft state document.
//!
//! Every legality rule lives here. The reducer mutates the document only
//! after the full precondition chain for an operation has passed, so a
//! rejection always leaves the input untouched, and it never panics: illegal
//! requests come back as a [`Rejection`] for the transport to surface.

use thiserror::Error;

use crate::draft::document::{Side, Slot, StateDoc, is_ban_token, side_of_token};
use crate::draft::featured::FeaturedIndex;
use crate::draft::timer;

const EIDOLON_MIN: i64 = 0;
const EIDOLON_MAX: i64 = 6;
const SUPERIMPOSE_MIN: i64 = 1;
const SUPERIMPOSE_MAX: i64 = 5;

/// A player operation after payload parsing. The transport layer maps the
/// loose wire envelope (including legacy op names) into this closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftAction {
    Pick { index: usize, character_code: String },
    Ban { index: usize, character_code: String },
    SetEidolon { index: usize, eidolon: i64 },
    SetSuperimpose { index: usize, superimpose: i64 },
    SetAccessory { index: usize, accessory_id: Option<String> },
    SetLock,
    UndoLast { index: Option<usize> },
}

/// Closed taxonomy of reducer refusals. The display form is the stable
/// short string surfaced over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid-argument")]
    InvalidArgument,
    #[error("wrong-turn")]
    WrongTurn,
    #[error("wrong-side")]
    WrongSide,
    #[error("side-locked")]
    SideLocked,
    #[error("globally-banned")]
    GloballyBanned,
    #[error("globally-pick-locked")]
    GloballyPickLocked,
    #[error("already-picked-this-side")]
    AlreadyPickedThisSide,
    #[error("not-a-ban-slot")]
    NotABanSlot,
    #[error("is-a-ban-slot")]
    IsABanSlot,
    #[error("empty-slot")]
    EmptySlot,
    #[error("nothing-to-undo")]
    NothingToUndo,
    #[error("draft-complete")]
    DraftComplete,
    #[error("draft-already-completed")]
    DraftAlreadyCompleted,
}

impl Rejection {
    /// Stable short code for transports and logs.
    pub fn code(self) -> &'static str {
        match self {
            Rejection::InvalidArgument => "invalid-argument",
            Rejection::WrongTurn => "wrong-turn",
            Rejection::WrongSide => "wrong-side",
            Rejection::SideLocked => "side-locked",
            Rejection::GloballyBanned => "globally-banned",
            Rejection::GloballyPickLocked => "globally-pick-locked",
            Rejection::AlreadyPickedThisSide => "already-picked-this-side",
            Rejection::NotABanSlot => "not-a-ban-slot",
            Rejection::IsABanSlot => "is-a-ban-slot",
            Rejection::EmptySlot => "empty-slot",
            Rejection::NothingToUndo => "nothing-to-undo",
            Rejection::DraftComplete => "draft-complete",
            Rejection::DraftAlreadyCompleted => "draft-already-completed",
        }
    }
}

/// Apply one action for `side`, mutating `state` on success.
///
/// The caller has already burned elapsed time into the document; actions
/// that move `currentTurn` re-arm the grace window afterwards via `now_ms`.
pub fn reduce(
    state: &mut StateDoc,
    side: Side,
    action: &DraftAction,
    featured: &FeaturedIndex,
    now_ms: i64,
) -> Result<(), Rejection> {
    match action {
        DraftAction::Pick {
            index,
            character_code,
        } => pick(state, side, *index, character_code, featured, now_ms),
        DraftAction::Ban {
            index,
            character_code,
        } => ban(state, side, *index, character_code, featured, now_ms),
        DraftAction::SetEidolon { index, eidolon } => {
            let slot = editable_slot(state, side, *index)?;
            slot.eidolon = (*eidolon).clamp(EIDOLON_MIN, EIDOLON_MAX) as u8;
            Ok(())
        }
        DraftAction::SetSuperimpose { index, superimpose } => {
            let slot = editable_slot(state, side, *index)?;
            slot.superimpose = (*superimpose).clamp(SUPERIMPOSE_MIN, SUPERIMPOSE_MAX) as u8;
            Ok(())
        }
        DraftAction::SetAccessory {
            index,
            accessory_id,
        } => set_accessory(state, side, *index, accessory_id.as_deref(), featured),
        DraftAction::SetLock => set_lock(state, side),
        DraftAction::UndoLast { index } => undo_last(state, side, *index, now_ms),
    }
}

fn pick(
    state: &mut StateDoc,
    side: Side,
    index: usize,
    character_code: &str,
    featured: &FeaturedIndex,
    now_ms: i64,
) -> Result<(), Rejection> {
    if state.side_locked(side) {
        return Err(Rejection::SideLocked);
    }
    if state.is_pick_complete() {
        return Err(Rejection::DraftComplete);
    }
    if index != state.current_turn {
        return Err(Rejection::WrongTurn);
    }
    let token = &state.draft_sequence[index];
    if is_ban_token(token) {
        return Err(Rejection::IsABanSlot);
    }
    if side_of_token(token) != Some(side) {
        return Err(Rejection::WrongSide);
    }
    if featured.character_banned(character_code) {
        return Err(Rejection::GloballyBanned);
    }
    if side_already_picked(state, side, character_code) {
        return Err(Rejection::AlreadyPickedThisSide);
    }

    state.picks[index] = Some(Slot::filled(character_code.to_owned()));
    state.current_turn += 1;
    timer::reset_turn_clock(state, now_ms);
    Ok(())
}

fn ban(
    state: &mut StateDoc,
    side: Side,
    index: usize,
    character_code: &str,
    featured: &FeaturedIndex,
    now_ms: i64,
) -> Result<(), Rejection> {
    if state.side_locked(side) {
        return Err(Rejection::SideLocked);
    }
    if state.is_pick_complete() {
        return Err(Rejection::DraftComplete);
    }
    if index != state.current_turn {
        return Err(Rejection::WrongTurn);
    }
    let token = &state.draft_sequence[index];
    if !is_ban_token(token) {
        return Err(Rejection::NotABanSlot);
    }
    if side_of_token(token) != Some(side) {
        return Err(Rejection::WrongSide);
    }
    if featured.character_pick_locked(character_code) {
        return Err(Rejection::GloballyPickLocked);
    }

    // Bans reuse the slot shape with placeholder upgrades.
    state.picks[index] = Some(Slot::filled(character_code.to_owned()));
    state.current_turn += 1;
    timer::reset_turn_clock(state, now_ms);
    Ok(())
}

fn set_accessory(
    state: &mut StateDoc,
    side: Side,
    index: usize,
    accessory_id: Option<&str>,
    featured: &FeaturedIndex,
) -> Result<(), Rejection> {
    let requested = accessory_id.filter(|id| !id.is_empty());
    if let Some(id) = requested
        && featured.accessory_banned(id)
    {
        return Err(Rejection::GloballyBanned);
    }
    let slot = editable_slot(state, side, index)?;
    slot.accessory_id = requested.map(str::to_owned);
    Ok(())
}

fn set_lock(state: &mut StateDoc, side: Side) -> Result<(), Rejection> {
    if !state.is_pick_complete() {
        return Err(Rejection::WrongTurn);
    }
    // Re-locking an already locked side is an idempotent success.
    state.lock_side(side);
    Ok(())
}

fn undo_last(
    state: &mut StateDoc,
    side: Side,
    index: Option<usize>,
    now_ms: i64,
) -> Result<(), Rejection> {
    if state.side_locked(side) {
        return Err(Rejection::SideLocked);
    }
    if state.current_turn == 0 {
        return Err(Rejection::NothingToUndo);
    }
    let last = state.current_turn - 1;
    if let Some(requested) = index
        && requested != last
    {
        return Err(Rejection::WrongTurn);
    }
    if side_of_token(&state.draft_sequence[last]) != Some(side) {
        return Err(Rejection::WrongSide);
    }
    if state.picks[last].is_none() {
        return Err(Rejection::EmptySlot);
    }

    state.picks[last] = None;
    state.current_turn = last;
    timer::reset_turn_clock(state, now_ms);
    Ok(())
}

/// Mutable access to a slot the requester may edit in place: any filled
/// non-ban slot on their own side, as long as the side is not locked.
fn editable_slot<'doc>(
    state: &'doc mut StateDoc,
    side: Side,
    index: usize,
) -> Result<&'doc mut Slot, Rejection> {
    if state.side_locked(side) {
        return Err(Rejection::SideLocked);
    }
    let token = state
        .draft_sequence
        .get(index)
        .ok_or(Rejection::InvalidArgument)?;
    match state.picks.get(index) {
        None => return Err(Rejection::InvalidArgument),
        Some(None) => return Err(Rejection::EmptySlot),
        Some(Some(_)) => {}
    }
    if side_of_token(token) != Some(side) {
        return Err(Rejection::WrongSide);
    }
    if is_ban_token(token) {
        return Err(Rejection::IsABanSlot);
    }
    match state.picks[index].as_mut() {
        Some(slot) => Ok(slot),
        None => Err(Rejection::EmptySlot),
    }
}

/// Duplicate detection considers only the requester's filled pick slots;
/// bans never count.
fn side_already_picked(state: &StateDoc, side: Side, character_code: &str) -> bool {
    state
        .draft_sequence
        .iter()
        .zip(state.picks.iter())
        .filter(|(token, _)| !is_ban_token(token) && side_of_token(token) == Some(side))
        .any(|(_, slot)| {
            slot.as_ref()
                .is_some_and(|slot| slot.character_code == character_code)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::document::SidePair;
    use crate::draft::featured::{FeaturedRule, FeaturedRuleKind};
    use crate::draft::timer::GRACE_SECONDS;
    use serde_json::Map;

    fn sequence() -> Vec<String> {
        ["BB", "RR", "B", "R", "B", "R"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    fn fresh_state() -> StateDoc {
        let sequence = sequence();
        let picks = vec![None; sequence.len()];
        StateDoc {
            draft_sequence: sequence,
            current_turn: 0,
            picks,
            blue_scores: Vec::new(),
            red_scores: Vec::new(),
            blue_locked: None,
            red_locked: None,
            timer_enabled: Some(true),
            reserve_seconds: Some(180.0),
            reserve_left: Some(SidePair::uniform(180.0)),
            grace_left: Some(GRACE_SECONDS),
            paused: Some(SidePair::uniform(false)),
            timer_updated_at: Some(0),
            extra: Map::new(),
        }
    }

    fn no_rules() -> FeaturedIndex {
        FeaturedIndex::default()
    }

    fn pick(state: &mut StateDoc, side: Side, index: usize, code: &str) -> Result<(), Rejection> {
        reduce(
            state,
            side,
            &DraftAction::Pick {
                index,
                character_code: code.into(),
            },
            &no_rules(),
            0,
        )
    }

    fn ban(state: &mut StateDoc, side: Side, index: usize, code: &str) -> Result<(), Rejection> {
        reduce(
            state,
            side,
            &DraftAction::Ban {
                index,
                character_code: code.into(),
            },
            &no_rules(),
            0,
        )
    }

    #[test]
    fn happy_path_to_completion() {
        let mut state = fresh_state();

        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        pick(&mut state, Side::Red, 3, "c4").unwrap();
        pick(&mut state, Side::Blue, 4, "c5").unwrap();
        pick(&mut state, Side::Red, 5, "c6").unwrap();

        assert_eq!(state.current_turn, 6);
        assert!(state.picks.iter().all(Option::is_some));
        assert!(state.validate_shape().is_ok());

        reduce(&mut state, Side::Blue, &DraftAction::SetLock, &no_rules(), 0).unwrap();
        reduce(&mut state, Side::Red, &DraftAction::SetLock, &no_rules(), 0).unwrap();
        assert_eq!(state.blue_locked, Some(true));
        assert_eq!(state.red_locked, Some(true));
    }

    #[test]
    fn red_cannot_take_blues_ban_turn() {
        let mut state = fresh_state();
        let before = state.clone();

        assert_eq!(ban(&mut state, Side::Red, 0, "c1"), Err(Rejection::WrongSide));
        assert_eq!(state, before);
    }

    #[test]
    fn duplicate_pick_on_one_side_is_rejected() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "x1").unwrap();
        ban(&mut state, Side::Red, 1, "x2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        pick(&mut state, Side::Red, 3, "c4").unwrap();

        assert_eq!(
            pick(&mut state, Side::Blue, 4, "c3"),
            Err(Rejection::AlreadyPickedThisSide)
        );
        // The other side is free to take the same character.
        pick(&mut state, Side::Blue, 4, "c5").unwrap();
        pick(&mut state, Side::Red, 5, "c3").unwrap();
    }

    #[test]
    fn banned_character_does_not_block_duplicates() {
        // A ban of c3 by Blue must not count as Blue "having picked" c3.
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c3").unwrap();
        ban(&mut state, Side::Red, 1, "x").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
    }

    #[test]
    fn globally_banned_character_is_rejected() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "x1").unwrap();
        ban(&mut state, Side::Red, 1, "x2").unwrap();

        let featured = FeaturedIndex::build(&[FeaturedRule::Character {
            code: "c3".into(),
            rule: FeaturedRuleKind::GlobalBan,
            custom_cost: None,
        }]);
        let result = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::Pick {
                index: 2,
                character_code: "c3".into(),
            },
            &featured,
            0,
        );
        assert_eq!(result, Err(Rejection::GloballyBanned));
    }

    #[test]
    fn global_ban_outranks_duplicate_check() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "x1").unwrap();
        ban(&mut state, Side::Red, 1, "x2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        pick(&mut state, Side::Red, 3, "c4").unwrap();

        let featured = FeaturedIndex::build(&[FeaturedRule::Character {
            code: "c3".into(),
            rule: FeaturedRuleKind::GlobalBan,
            custom_cost: None,
        }]);
        let result = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::Pick {
                index: 4,
                character_code: "c3".into(),
            },
            &featured,
            0,
        );
        assert_eq!(result, Err(Rejection::GloballyBanned));
    }

    #[test]
    fn pick_locked_character_cannot_be_banned() {
        let mut state = fresh_state();
        let featured = FeaturedIndex::build(&[FeaturedRule::Character {
            code: "c1".into(),
            rule: FeaturedRuleKind::GlobalPick,
            custom_cost: None,
        }]);
        let result = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::Ban {
                index: 0,
                character_code: "c1".into(),
            },
            &featured,
            0,
        );
        assert_eq!(result, Err(Rejection::GloballyPickLocked));
    }

    #[test]
    fn pick_on_ban_slot_and_ban_on_pick_slot() {
        let mut state = fresh_state();
        assert_eq!(pick(&mut state, Side::Blue, 0, "c1"), Err(Rejection::IsABanSlot));

        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        assert_eq!(ban(&mut state, Side::Blue, 2, "c3"), Err(Rejection::NotABanSlot));
    }

    #[test]
    fn pick_and_ban_on_same_index_cannot_both_succeed() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        // The turn advanced; a competing ban for the now-stale index loses.
        assert_eq!(ban(&mut state, Side::Blue, 0, "c9"), Err(Rejection::WrongTurn));
    }

    #[test]
    fn exhausted_sequence_rejects_picks_but_accepts_locks() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        pick(&mut state, Side::Red, 3, "c4").unwrap();
        pick(&mut state, Side::Blue, 4, "c5").unwrap();
        pick(&mut state, Side::Red, 5, "c6").unwrap();

        assert_eq!(pick(&mut state, Side::Blue, 6, "c7"), Err(Rejection::DraftComplete));
        assert_eq!(ban(&mut state, Side::Red, 6, "c7"), Err(Rejection::DraftComplete));
        reduce(&mut state, Side::Blue, &DraftAction::SetLock, &no_rules(), 0).unwrap();
    }

    #[test]
    fn lock_is_idempotent_and_blocks_edits() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        pick(&mut state, Side::Red, 3, "c4").unwrap();
        pick(&mut state, Side::Blue, 4, "c5").unwrap();
        pick(&mut state, Side::Red, 5, "c6").unwrap();

        reduce(&mut state, Side::Blue, &DraftAction::SetLock, &no_rules(), 0).unwrap();
        reduce(&mut state, Side::Blue, &DraftAction::SetLock, &no_rules(), 0).unwrap();
        assert_eq!(state.blue_locked, Some(true));

        let edit = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 2,
                eidolon: 3,
            },
            &no_rules(),
            0,
        );
        assert_eq!(edit, Err(Rejection::SideLocked));

        let undo = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::UndoLast { index: None },
            &no_rules(),
            0,
        );
        assert_eq!(undo, Err(Rejection::SideLocked));
    }

    #[test]
    fn lock_before_sequence_end_is_rejected() {
        let mut state = fresh_state();
        assert_eq!(
            reduce(&mut state, Side::Blue, &DraftAction::SetLock, &no_rules(), 0),
            Err(Rejection::WrongTurn)
        );
    }

    #[test]
    fn upgrade_values_clamp_to_their_ranges() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();

        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 2,
                eidolon: 7,
            },
            &no_rules(),
            0,
        )
        .unwrap();
        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetSuperimpose {
                index: 2,
                superimpose: 0,
            },
            &no_rules(),
            0,
        )
        .unwrap();

        let slot = state.picks[2].as_ref().unwrap();
        assert_eq!(slot.eidolon, 6);
        assert_eq!(slot.superimpose, 1);
        // In-place edits never advance the turn.
        assert_eq!(state.current_turn, 3);
    }

    #[test]
    fn accessory_set_clear_and_global_ban() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();

        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetAccessory {
                index: 2,
                accessory_id: Some("a1".into()),
            },
            &no_rules(),
            0,
        )
        .unwrap();
        assert_eq!(
            state.picks[2].as_ref().unwrap().accessory_id.as_deref(),
            Some("a1")
        );

        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetAccessory {
                index: 2,
                accessory_id: None,
            },
            &no_rules(),
            0,
        )
        .unwrap();
        assert_eq!(state.picks[2].as_ref().unwrap().accessory_id, None);

        let featured = FeaturedIndex::build(&[FeaturedRule::Accessory {
            id: "a1".into(),
            rule: FeaturedRuleKind::GlobalBan,
            custom_cost: None,
        }]);
        let result = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetAccessory {
                index: 2,
                accessory_id: Some("a1".into()),
            },
            &featured,
            0,
        );
        assert_eq!(result, Err(Rejection::GloballyBanned));
    }

    #[test]
    fn edits_apply_to_earlier_slots_but_not_bans_or_enemy_slots() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        pick(&mut state, Side::Red, 3, "c4").unwrap();

        // Editing a slot behind currentTurn is allowed for its owner.
        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 2,
                eidolon: 2,
            },
            &no_rules(),
            0,
        )
        .unwrap();

        let enemy = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 3,
                eidolon: 2,
            },
            &no_rules(),
            0,
        );
        assert_eq!(enemy, Err(Rejection::WrongSide));

        let on_ban = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 0,
                eidolon: 2,
            },
            &no_rules(),
            0,
        );
        assert_eq!(on_ban, Err(Rejection::IsABanSlot));

        let empty = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 4,
                eidolon: 2,
            },
            &no_rules(),
            0,
        );
        assert_eq!(empty, Err(Rejection::EmptySlot));

        let out_of_range = reduce(
            &mut state,
            Side::Blue,
            &DraftAction::SetEidolon {
                index: 42,
                eidolon: 2,
            },
            &no_rules(),
            0,
        );
        assert_eq!(out_of_range, Err(Rejection::InvalidArgument));
    }

    #[test]
    fn undo_rewinds_exactly_one_turn() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        let before = state.clone();

        pick(&mut state, Side::Blue, 2, "c3").unwrap();
        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::UndoLast { index: None },
            &no_rules(),
            0,
        )
        .unwrap();

        assert_eq!(state.current_turn, 2);
        assert_eq!(state.picks, before.picks);
        assert_eq!(state.grace_left, Some(GRACE_SECONDS));
    }

    #[test]
    fn undo_guards() {
        let mut state = fresh_state();
        assert_eq!(
            reduce(
                &mut state,
                Side::Blue,
                &DraftAction::UndoLast { index: None },
                &no_rules(),
                0
            ),
            Err(Rejection::NothingToUndo)
        );

        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        // Red cannot undo Blue's ban.
        assert_eq!(
            reduce(
                &mut state,
                Side::Red,
                &DraftAction::UndoLast { index: None },
                &no_rules(),
                0
            ),
            Err(Rejection::WrongSide)
        );
        // An explicit index must name the last applied slot.
        assert_eq!(
            reduce(
                &mut state,
                Side::Blue,
                &DraftAction::UndoLast { index: Some(3) },
                &no_rules(),
                0
            ),
            Err(Rejection::WrongTurn)
        );
        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::UndoLast { index: Some(0) },
            &no_rules(),
            0,
        )
        .unwrap();
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn sideless_token_rejects_side_dependent_actions() {
        let mut state = fresh_state();
        state.draft_sequence[0] = "X".into();

        assert_eq!(ban(&mut state, Side::Blue, 0, "c1"), Err(Rejection::NotABanSlot));
        assert_eq!(ban(&mut state, Side::Red, 0, "c1"), Err(Rejection::NotABanSlot));
        assert_eq!(pick(&mut state, Side::Blue, 0, "c1"), Err(Rejection::WrongSide));
        assert_eq!(pick(&mut state, Side::Red, 0, "c1"), Err(Rejection::WrongSide));
    }

    #[test]
    fn undo_timing_spends_grace_before_reserve() {
        use crate::draft::timer::burn;

        // Two frozen bans already applied; Blue is on the clock at turn 2
        // with a fresh grace window and checkpoint at t = 0.
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "x1").unwrap();
        ban(&mut state, Side::Red, 1, "x2").unwrap();

        // Blue picks ten seconds in: grace absorbs all of it.
        burn(&mut state, 10_000);
        assert_eq!(state.grace_left, Some(GRACE_SECONDS - 10.0));
        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::Pick {
                index: 2,
                character_code: "c3".into(),
            },
            &no_rules(),
            10_000,
        )
        .unwrap();
        assert_eq!(state.reserve_left.unwrap().blue, 180.0);
        assert_eq!(state.grace_left, Some(GRACE_SECONDS));

        // 35 s pass on Red's turn before Blue undoes their own pick. The
        // elapsed time debits the side on the clock: one grace window plus
        // five reserve seconds, leaving 175.
        burn(&mut state, 45_000);
        assert_eq!(state.reserve_left.unwrap().red, 175.0);
        assert_eq!(state.reserve_left.unwrap().blue, 180.0);

        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::UndoLast { index: None },
            &no_rules(),
            45_000,
        )
        .unwrap();
        assert_eq!(state.current_turn, 2);
        assert!(state.picks[2].is_none());
        assert_eq!(state.grace_left, Some(GRACE_SECONDS));
        assert_eq!(state.timer_updated_at, Some(45_000));
    }

    #[test]
    fn undo_after_pick_restores_prior_state_modulo_clock() {
        let mut state = fresh_state();
        ban(&mut state, Side::Blue, 0, "c1").unwrap();
        ban(&mut state, Side::Red, 1, "c2").unwrap();
        let before = state.clone();

        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::Pick {
                index: 2,
                character_code: "c3".into(),
            },
            &no_rules(),
            10_000,
        )
        .unwrap();
        reduce(
            &mut state,
            Side::Blue,
            &DraftAction::UndoLast { index: None },
            &no_rules(),
            45_000,
        )
        .unwrap();

        let mut normalized = state.clone();
        normalized.grace_left = before.grace_left;
        normalized.timer_updated_at = before.timer_updated_at;
        assert_eq!(normalized, before);
    }
}
