//! Server-Sent Events data structures.

use serde::Serialize;
use utoipa::ToSchema;

use crate::draft::document::{SidePair, StateDoc};
use crate::draft::timer::GRACE_SECONDS;

/// Event emitted once to every new subscriber with the full shaped payload.
pub const EVENT_SNAPSHOT: &str = "snapshot";
/// Event emitted after every persisted state change.
pub const EVENT_UPDATE: &str = "update";
/// Low-cardinality timer delta emitted by the per-session ticker.
pub const EVENT_TIMER: &str = "timer";
/// Terminal event when the owner removes an unfinished session.
pub const EVENT_DELETED: &str = "deleted";
/// Terminal event when a stream is opened on an unknown session.
pub const EVENT_NOT_FOUND: &str = "not_found";

/// Dispatched payload carried across session broadcast channels.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// Event type name for the SSE message.
    pub event: String,
    /// The serialized JSON data for the event.
    pub data: String,
    /// Terminal events close the stream right after delivery.
    pub terminal: bool,
}

impl ServerEvent {
    /// Serialize `payload` into the SSE data field.
    pub fn json<T: Serialize>(event: &str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            event: event.to_owned(),
            data: serde_json::to_string(payload)?,
            terminal: false,
        })
    }

    /// Terminal variant of [`ServerEvent::json`].
    pub fn terminal_json<T: Serialize>(event: &str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            terminal: true,
            ..Self::json(event, payload)?
        })
    }
}

/// Minimal timer fields broadcast on every ticker pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerEvent {
    pub timer_enabled: bool,
    #[schema(value_type = Object)]
    pub paused: SidePair<bool>,
    #[schema(value_type = Object)]
    pub reserve_left: SidePair<f64>,
    pub grace_left: f64,
    pub timer_updated_at: i64,
    pub current_turn: usize,
}

impl TimerEvent {
    /// Project the timer fields out of a burned state document.
    pub fn from_state(state: &StateDoc) -> Self {
        Self {
            timer_enabled: state.timer_enabled.unwrap_or(false),
            paused: state.paused.unwrap_or(SidePair::uniform(false)),
            reserve_left: state.reserve_left.unwrap_or(SidePair::uniform(0.0)),
            grace_left: state.grace_left.unwrap_or(GRACE_SECONDS),
            timer_updated_at: state.timer_updated_at.unwrap_or(0),
            current_turn: state.current_turn,
        }
    }
}

/// Payload of the terminal `deleted` event.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDeletedEvent {
    /// Identifier of the removed session.
    pub id: String,
}

/// Payload of the terminal `not_found` event.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionNotFoundEvent {
    /// Identifier the stream was opened with.
    pub id: String,
}
