//! Spectator stream wiring: subscription, forwarding, and teardown.
//!
//! Each open stream gets a forwarder task bridging the session's broadcast
//! channel into the SSE response body. The forwarder sends the snapshot
//! first, so a subscriber always sees `snapshot` before any `update` or
//! `timer`, and deregisters from the hub when the client goes away or a
//! terminal event lands.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use tokio::sync::{broadcast, broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::session::SessionView,
    dto::sse::{EVENT_NOT_FOUND, EVENT_SNAPSHOT, ServerEvent, SessionNotFoundEvent},
    error::ServiceError,
    state::SharedState,
};

/// Keep-alive comment cadence; generous but under common idle-reap cutoffs.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(25);
/// Bounded buffer between the forwarder and the response body.
const FORWARD_BUFFER: usize = 8;

type EventStream = Sse<KeepAliveStream<ReceiverStream<Result<Event, Infallible>>>>;

/// Open a spectator stream for `key`.
///
/// An unknown session yields a one-event `not_found` stream. While storage
/// is degraded, sessions that already have a live channel keep streaming
/// from the cached snapshot; everything else surfaces the degraded failure.
pub async fn open_stream(state: &SharedState, key: &str) -> Result<EventStream, ServiceError> {
    match state.draft_store().await {
        Some(store) => match store.find_session(key.to_owned()).await {
            Ok(Some(entity)) => {
                let view =
                    crate::services::session_service::shape_with_preset(&store, &entity).await?;
                let (receiver, snapshot) = state.hub().subscribe(key, view).await;
                Ok(subscriber_stream(state.clone(), key, receiver, snapshot))
            }
            Ok(None) => Ok(not_found_stream(key)),
            Err(_) => attach_to_live_channel(state, key).await,
        },
        None => attach_to_live_channel(state, key).await,
    }
}

async fn attach_to_live_channel(
    state: &SharedState,
    key: &str,
) -> Result<EventStream, ServiceError> {
    match state.hub().subscribe_existing(key).await {
        Some((receiver, snapshot)) => {
            Ok(subscriber_stream(state.clone(), key, receiver, snapshot))
        }
        None => Err(ServiceError::Degraded),
    }
}

/// Bridge a broadcast receiver into an SSE response, cleaning up once the
/// client disconnects or a terminal event is delivered.
fn subscriber_stream(
    state: SharedState,
    key: &str,
    mut receiver: broadcast::Receiver<ServerEvent>,
    snapshot: SessionView,
) -> EventStream {
    let key = key.to_owned();
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(FORWARD_BUFFER);

    tokio::spawn(async move {
        if let Ok(first) = ServerEvent::json(EVENT_SNAPSHOT, &snapshot)
            && !forward(first, &tx).await
        {
            state.hub().unsubscribe(&key);
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = receiver.recv() => match received {
                    Ok(event) => {
                        let terminal = event.terminal;
                        if !forward(event, &tx).await || terminal {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                    // Laggards skip ahead; the next update or tick resyncs them.
                    Err(RecvError::Lagged(_)) => continue,
                },
            }
        }

        state.hub().unsubscribe(&key);
        info!(session = %key, "spectator stream closed");
    });

    to_sse(rx)
}

/// One-event stream for an unknown session id.
fn not_found_stream(key: &str) -> EventStream {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(1);
    if let Ok(event) = ServerEvent::terminal_json(
        EVENT_NOT_FOUND,
        &SessionNotFoundEvent { id: key.to_owned() },
    ) {
        let _ = tx.try_send(Ok(to_axum_event(event)));
    }
    to_sse(rx)
}

/// Push one event into the response channel; `false` when the client side
/// is gone.
async fn forward(event: ServerEvent, tx: &mpsc::Sender<Result<Event, Infallible>>) -> bool {
    tx.send(Ok(to_axum_event(event))).await.is_ok()
}

fn to_axum_event(event: ServerEvent) -> Event {
    Event::default().event(event.event).data(event.data)
}

fn to_sse(rx: mpsc::Receiver<Result<Event, Infallible>>) -> EventStream {
    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
