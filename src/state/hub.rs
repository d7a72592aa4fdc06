//! Per-session fan-out of draft events to spectator streams.
//!
//! Each session with at least one open stream owns a broadcast channel, the
//! last shaped snapshot, and a 250 ms ticker that burns the snapshot's clock
//! forward and emits a minimal `timer` event. All three exist only while
//! someone is watching: the first subscriber creates them, the last one out
//! tears them down.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::{
    sync::{RwLock, broadcast},
    task::JoinHandle,
    time::{Duration, MissedTickBehavior, interval},
};
use tracing::warn;

use crate::dto::session::SessionView;
use crate::dto::sse::{
    EVENT_DELETED, EVENT_TIMER, EVENT_UPDATE, ServerEvent, SessionDeletedEvent, TimerEvent,
};
use crate::draft::document::StateDoc;
use crate::draft::timer;

/// Cadence of the per-session timer ticker.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);
/// Broadcast capacity per session; laggards skip ahead to fresh events.
const CHANNEL_CAPACITY: usize = 32;

/// Process-wide registry of live session channels.
#[derive(Default)]
pub struct StreamHub {
    sessions: DashMap<String, Arc<SessionChannel>>,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, creating the channel and starting the ticker
    /// when it is the first one in. Returns the receiver plus the snapshot
    /// the subscriber should be served first.
    pub async fn subscribe(
        &self,
        key: &str,
        latest: SessionView,
    ) -> (broadcast::Receiver<ServerEvent>, SessionView) {
        let channel = self
            .sessions
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(SessionChannel::new(latest.clone())))
            .clone();
        if channel.subscribers.fetch_add(1, Ordering::SeqCst) == 0 {
            channel.clone().start_ticker();
        }
        let snapshot = channel.snapshot.read().await.clone();
        (channel.sender.subscribe(), snapshot)
    }

    /// Subscribe against an already-live channel, if any. Lets streams keep
    /// serving cached sessions while storage is degraded.
    pub async fn subscribe_existing(
        &self,
        key: &str,
    ) -> Option<(broadcast::Receiver<ServerEvent>, SessionView)> {
        let channel = self.sessions.get(key).map(|entry| entry.value().clone())?;
        if channel.subscribers.fetch_add(1, Ordering::SeqCst) == 0 {
            channel.clone().start_ticker();
        }
        let snapshot = channel.snapshot.read().await.clone();
        Some((channel.sender.subscribe(), snapshot))
    }

    /// Deregister one subscriber; the last one out stops the ticker and
    /// drops the channel entry.
    pub fn unsubscribe(&self, key: &str) {
        let Some(channel) = self.sessions.get(key).map(|entry| entry.value().clone()) else {
            return;
        };
        if channel.subscribers.fetch_sub(1, Ordering::SeqCst) == 1
            && let Some((_, removed)) = self
                .sessions
                .remove_if(key, |_, entry| entry.subscribers.load(Ordering::SeqCst) == 0)
        {
            removed.stop_ticker();
        }
    }

    /// Replace the snapshot and fan the shaped row out as an `update`.
    pub async fn publish_update(&self, key: &str, view: SessionView) {
        let Some(channel) = self.sessions.get(key).map(|entry| entry.value().clone()) else {
            return;
        };
        {
            let mut snapshot = channel.snapshot.write().await;
            *snapshot = view.clone();
        }
        channel.send_json(EVENT_UPDATE, &view, false);
    }

    /// Terminal `deleted` fan-out; the channel is gone once this returns.
    pub async fn publish_deleted(&self, key: &str) {
        let Some((_, channel)) = self.sessions.remove(key) else {
            return;
        };
        channel.send_json(
            EVENT_DELETED,
            &SessionDeletedEvent { id: key.to_owned() },
            true,
        );
        channel.stop_ticker();
    }

    /// Number of sessions with at least one live stream.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }
}

/// Channel, snapshot, and ticker for a single session.
pub struct SessionChannel {
    sender: broadcast::Sender<ServerEvent>,
    snapshot: RwLock<SessionView>,
    subscribers: AtomicUsize,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionChannel {
    fn new(snapshot: SessionView) -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            snapshot: RwLock::new(snapshot),
            subscribers: AtomicUsize::new(0),
            ticker: Mutex::new(None),
        }
    }

    /// Spawn the periodic timer task, replacing any previous one.
    fn start_ticker(self: Arc<Self>) {
        let channel = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval(TICK_INTERVAL);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                channel.tick_once(timer::now_ms()).await;
            }
        });
        let mut slot = self.ticker.lock().expect("ticker mutex poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn stop_ticker(&self) {
        let mut slot = self.ticker.lock().expect("ticker mutex poisoned");
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Burn the snapshot's clock to `now_ms` and emit a `timer` event, so
    /// spectators see reserve drain between state changes.
    async fn tick_once(&self, now_ms: i64) {
        let event = {
            let mut snapshot = self.snapshot.write().await;
            let mut state = match StateDoc::parse(&snapshot.state) {
                Ok(state) => state,
                Err(err) => {
                    warn!(session = %snapshot.id, error = %err, "snapshot state unparsable; skipping tick");
                    return;
                }
            };
            timer::burn(&mut state, now_ms);
            patch_timer_fields(&mut snapshot.state, &state);
            TimerEvent::from_state(&state)
        };
        self.send_json(EVENT_TIMER, &event, false);
    }

    fn send_json<T: Serialize>(&self, event: &str, payload: &T, terminal: bool) {
        let built = if terminal {
            ServerEvent::terminal_json(event, payload)
        } else {
            ServerEvent::json(event, payload)
        };
        match built {
            // Delivery is best-effort; a send error only means nobody is
            // listening right now.
            Ok(event) => {
                let _ = self.sender.send(event);
            }
            Err(err) => warn!(event, error = %err, "failed to serialize session event"),
        }
    }
}

/// Write the burned timer fields back into the shaped state value without
/// disturbing anything else in it.
fn patch_timer_fields(shaped: &mut Value, state: &StateDoc) {
    let Some(fields) = shaped.as_object_mut() else {
        return;
    };
    let patches = [
        ("timerEnabled", serde_json::to_value(state.timer_enabled)),
        ("reserveSeconds", serde_json::to_value(state.reserve_seconds)),
        ("reserveLeft", serde_json::to_value(state.reserve_left)),
        ("graceLeft", serde_json::to_value(state.grace_left)),
        ("paused", serde_json::to_value(state.paused)),
        ("timerUpdatedAt", serde_json::to_value(state.timer_updated_at)),
    ];
    for (name, value) in patches {
        if let Ok(value) = value {
            fields.insert(name.to_owned(), value);
        }
    }
}
