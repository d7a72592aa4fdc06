//! Countdown accounting for the draft clock.
//!
//! The clock is authoritative on the server: rather than trusting client
//! ticks, every touch of a session computes the wall-clock time elapsed
//! since the last checkpoint (`timerUpdatedAt`) and debits it from the
//! active side, grace window first, then reserve. The math therefore holds
//! no matter how rarely the state is touched, including across process
//! suspension and reconnects.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::draft::document::{SidePair, StateDoc, is_first_ban_for_side, side_of_token};

/// Free seconds granted at the start of every turn before reserve burns.
pub const GRACE_SECONDS: f64 = 30.0;

/// Milliseconds since the Unix epoch, the unit of `timerUpdatedAt`.
pub fn epoch_ms(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        Err(_) => 0,
    }
}

pub fn now_ms() -> i64 {
    epoch_ms(SystemTime::now())
}

/// Materialize defaults on documents that predate the timer fields.
///
/// Missing fields mean a legacy or timer-less session; they become an
/// explicit disabled timer so downstream code never branches on absence.
pub fn ensure_timer_fields(state: &mut StateDoc, now_ms: i64) {
    if state.timer_enabled.is_none() {
        state.timer_enabled = Some(false);
    }
    if state.reserve_seconds.is_none() {
        state.reserve_seconds = Some(0.0);
    }
    if state.reserve_left.is_none() {
        let seconds = state.reserve_seconds.unwrap_or(0.0);
        state.reserve_left = Some(SidePair::uniform(seconds));
    }
    if state.grace_left.is_none() {
        state.grace_left = Some(GRACE_SECONDS);
    }
    if state.paused.is_none() {
        state.paused = Some(SidePair::uniform(false));
    }
    if state.timer_updated_at.is_none() {
        state.timer_updated_at = Some(now_ms);
    }
}

/// Debit elapsed wall-clock time into the active side's buckets and move the
/// checkpoint to `now_ms`.
///
/// No time accrues while the sequence is exhausted, the active token is
/// sideless, the active side is paused, or the slot is a side's first ban.
pub fn burn(state: &mut StateDoc, now_ms: i64) {
    ensure_timer_fields(state, now_ms);
    if state.timer_enabled != Some(true) {
        return;
    }

    let last = state.timer_updated_at.unwrap_or(now_ms);
    let dt = ((now_ms - last).max(0) as f64) / 1000.0;

    let side = state
        .draft_sequence
        .get(state.current_turn)
        .and_then(|token| side_of_token(token));
    let frozen = is_first_ban_for_side(&state.draft_sequence, state.current_turn);
    let paused = match (side, state.paused.as_ref()) {
        (Some(side), Some(paused)) => *paused.get(side),
        _ => false,
    };

    let Some(side) = side else {
        state.timer_updated_at = Some(now_ms);
        return;
    };
    if paused || frozen {
        state.timer_updated_at = Some(now_ms);
        return;
    }

    let grace = state.grace_left.unwrap_or(GRACE_SECONDS);
    let from_grace = grace.min(dt);
    state.grace_left = Some(grace - from_grace);

    let remainder = dt - from_grace;
    if remainder > 0.0
        && let Some(reserve) = state.reserve_left.as_mut()
    {
        let left = reserve.get_mut(side);
        *left = (*left - remainder).max(0.0);
    }

    state.timer_updated_at = Some(now_ms);
}

/// Re-arm the per-turn window after `currentTurn` moved in either direction.
/// Callers apply this after the burn for the turn just concluded.
pub fn reset_turn_clock(state: &mut StateDoc, now_ms: i64) {
    state.grace_left = Some(GRACE_SECONDS);
    state.timer_updated_at = Some(now_ms);
}
