//! WebSocket and HTTP connection handlers.

use std::time::Duration;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::{HistoryEntry, cards};

use super::{
    events::ClientEvent,
    state::{CooldownTick, SharedState},
};

/// Fatal per-connection faults. Anything returning this gets the
/// triggering connection closed.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("missing or empty room reference")]
    MissingRoom,
}

/// Resolve the room key carried by an event. An absent or blank reference
/// is a protocol violation, not a recoverable error.
fn room_key(raw: &str) -> Result<String, ProtocolError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ProtocolError::MissingRoom);
    }
    Ok(key.to_string())
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

pub async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // Channel through which broadcasts reach this connection.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let participant_id = { state.lock().await.connect(tx) };
    tracing::info!("Participant '{}' connected", participant_id);

    // Forward queued broadcasts to the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_id = participant_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error for '{}': {}", recv_id, e);
                    break;
                }
            };
            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            // Duck-typed payloads are rejected at the
                            // boundary; the connection is dropped.
                            tracing::warn!("Malformed frame from '{}': {}", recv_id, e);
                            break;
                        }
                    };
                    if let Err(e) = handle_event(&recv_state, &recv_id, event).await {
                        tracing::warn!("Protocol violation from '{}': {}", recv_id, e);
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Participant '{}' requested close", recv_id);
                    break;
                }
                // Ping/pong is handled by the protocol layer.
                _ => {}
            }
        }
    });

    // If either direction ends, tear the other one down.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    {
        let mut session = state.lock().await;
        let deliveries = session.disconnect(&participant_id);
        session.dispatch(&deliveries);
    }
    tracing::info!("Participant '{}' disconnected", participant_id);
}

async fn handle_event(
    state: &SharedState,
    pid: &str,
    event: ClientEvent,
) -> Result<(), ProtocolError> {
    let key = room_key(event.room())?;
    let mut session = state.lock().await;
    match event {
        ClientEvent::Join { name, watch, .. } => {
            let deliveries = session.join(pid, &key, name, watch);
            session.dispatch(&deliveries);
        }
        ClientEvent::Rename { new_name, .. } => {
            let deliveries = session.rename(pid, &key, new_name);
            session.dispatch(&deliveries);
        }
        ClientEvent::Kick { participant, .. } => {
            let deliveries = session.kick(pid, &key, &participant);
            session.dispatch(&deliveries);
        }
        ClientEvent::SelectCard { card, watch, .. } => {
            let deliveries = session.select_card(pid, &key, card, watch);
            session.dispatch(&deliveries);
        }
        ClientEvent::SetTopic { topic, .. } => {
            let deliveries = session.set_topic(pid, &key, topic);
            session.dispatch(&deliveries);
        }
        ClientEvent::Reveal { .. } => {
            let (deliveries, started) = session.reveal(pid, &key);
            session.dispatch(&deliveries);
            if started {
                // Registered while the lock is still held, so the new task
                // replaces any stale countdown before another event runs.
                let handle = tokio::spawn(run_cooldown(state.clone(), key.clone()));
                session.register_cooldown(&key, handle);
            }
        }
        ClientEvent::PlayAgain { .. } => {
            let deliveries = session.play_again(pid, &key);
            session.dispatch(&deliveries);
        }
    }
    Ok(())
}

/// Per-room cool-down countdown: one tick per second until the counter
/// clears. Re-enters the coordinator through the shared lock on each tick.
async fn run_cooldown(state: SharedState, key: String) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let mut session = state.lock().await;
        match session.cooldown_tick(&key) {
            CooldownTick::Continue(deliveries) => session.dispatch(&deliveries),
            CooldownTick::Finished(deliveries) => {
                session.dispatch(&deliveries);
                break;
            }
            CooldownTick::Stopped => break,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// The canonical card set, served so clients render exactly what the
/// server validates.
pub async fn get_cards() -> Json<Vec<&'static str>> {
    Json(cards::deck())
}

/// Bounded reveal history of a room, newest first. Unknown rooms yield an
/// empty list rather than an error.
pub async fn get_room_history(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Json<Vec<HistoryEntry>> {
    let session = state.lock().await;
    Json(session.history(&room_id))
}
