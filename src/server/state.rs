//! Shared session state and the coordinator driving all transitions.
//!
//! `SessionState` owns the participant registry, the room store, the
//! per-connection sender channels and the per-room cool-down task handles.
//! Every inbound event and every timer tick mutates it under one lock
//! acquisition, so coordinator operations are atomic with respect to each
//! other. Operations are synchronous and return the broadcast plan as a
//! list of [`Delivery`] values, which keeps the session rules testable
//! without sockets.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::domain::{
    CardState, Cooldown, HistoryEntry, Participant, ParticipantView, Room,
    cards::CardChoice,
    names,
    participant::ParticipantId,
    projection::project_participants,
    room::{COOLDOWN_SECONDS, roll_sfx},
    sanitize::{sanitize_name, sanitize_topic},
};

use super::events::{ParticipantsPayload, ServerEvent};

pub type SharedState = Arc<Mutex<SessionState>>;

/// One planned outbound message. The dispatch step resolves room
/// membership against the registry at send time.
#[derive(Debug, Clone)]
pub enum Delivery {
    ToOne(ParticipantId, ServerEvent),
    ToRoom(String, ServerEvent),
    /// Room broadcast excluding the originating connection, used when the
    /// originator already received a tailored private payload.
    ToRoomExcept(String, ParticipantId, ServerEvent),
}

/// Outcome of one cool-down timer tick.
#[derive(Debug)]
pub enum CooldownTick {
    /// Counter decremented; keep ticking.
    Continue(Vec<Delivery>),
    /// Counter cleared; final broadcast, then stop.
    Finished(Vec<Delivery>),
    /// The countdown was superseded or the room vanished; stop silently.
    Stopped,
}

pub struct SessionState {
    participants: HashMap<ParticipantId, Participant>,
    rooms: HashMap<String, Room>,
    senders: HashMap<ParticipantId, mpsc::UnboundedSender<String>>,
    cooldown_tasks: HashMap<String, JoinHandle<()>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
            rooms: HashMap::new(),
            senders: HashMap::new(),
            cooldown_tasks: HashMap::new(),
        }
    }

    /// Register a fresh connection: generates its id and a placeholder
    /// display name not currently in use.
    pub fn connect(&mut self, sender: mpsc::UnboundedSender<String>) -> ParticipantId {
        let id = uuid::Uuid::new_v4().to_string();
        let name =
            names::placeholder(|candidate| self.participants.values().any(|p| p.name == candidate));
        self.participants
            .insert(id.clone(), Participant::new(id.clone(), name));
        self.senders.insert(id.clone(), sender);
        id
    }

    /// Join a room, creating it lazily. The joiner receives the current
    /// topic (if any) and a private snapshot with its own id; the rest of
    /// the room gets a broadcast annotated with a "joined" notice.
    pub fn join(
        &mut self,
        pid: &str,
        key: &str,
        name: Option<String>,
        watch: Option<bool>,
    ) -> Vec<Delivery> {
        let room = self.rooms.entry(key.to_string()).or_insert_with(Room::new);
        room.sfx_index = roll_sfx();
        let sfx_index = room.sfx_index;
        let topic = room.topic.clone();
        // A joiner must not silently pick a card mid-reveal or mid-cool-down.
        let force_spectator = room.revealed || room.cooldown.remaining().is_some();

        let Some(participant) = self.participants.get_mut(pid) else {
            tracing::warn!("Join from unknown participant '{}'", pid);
            return Vec::new();
        };
        if let Some(raw) = name {
            let sanitized = sanitize_name(&raw);
            if !sanitized.is_empty() {
                participant.name = sanitized;
            }
        }
        if watch.unwrap_or(false) || force_spectator {
            participant.is_spectator = true;
        }
        participant.room = Some(key.to_string());
        let own_name = participant.name.clone();
        tracing::info!("Participant '{}' ({}) joined room '{}'", pid, own_name, key);

        let mut deliveries = Vec::new();
        if let Some(topic) = topic {
            deliveries.push(Delivery::ToOne(
                pid.to_string(),
                ServerEvent::NewUserStory { topic, sfx_index },
            ));
        }
        let Some(mut private) = self.base_payload(key) else {
            return deliveries;
        };
        private.myid = Some(pid.to_string());
        private.name = Some(own_name.clone());
        deliveries.push(Delivery::ToOne(
            pid.to_string(),
            ServerEvent::Participants(private),
        ));

        if let Some(mut public) = self.base_payload(key) {
            public.connect = Some(own_name);
            deliveries.push(Delivery::ToRoomExcept(
                key.to_string(),
                pid.to_string(),
                ServerEvent::Participants(public),
            ));
        }
        deliveries
    }

    /// Change a participant's display name. Ignored when the sanitized
    /// result is empty; on success the whole room is re-broadcast.
    pub fn rename(&mut self, pid: &str, key: &str, new_name: Option<String>) -> Vec<Delivery> {
        if !self.rooms.contains_key(key) {
            tracing::warn!("Rename in unknown room '{}'", key);
            return Vec::new();
        }
        let sanitized = new_name.map(|n| sanitize_name(&n)).unwrap_or_default();
        if sanitized.is_empty() {
            tracing::debug!("Ignoring empty rename from '{}'", pid);
            return Vec::new();
        }
        let Some(participant) = self.participants.get_mut(pid) else {
            return Vec::new();
        };
        participant.name = sanitized;
        if let Some(room) = self.rooms.get_mut(key) {
            room.sfx_index = roll_sfx();
        }
        self.room_broadcast(key)
    }

    /// Demote another participant to spectator and clear its card. A target
    /// holding a committed-but-hidden card is left unchanged: the kick side
    /// effect would otherwise leak that a selection exists.
    pub fn kick(&mut self, pid: &str, key: &str, target: &str) -> Vec<Delivery> {
        let Some(room) = self.rooms.get(key) else {
            tracing::warn!("Kick in unknown room '{}'", key);
            return Vec::new();
        };
        let revealed = room.revealed;
        let Some(target_participant) = self.participants.get(target) else {
            tracing::debug!("Kick target '{}' not found", target);
            return Vec::new();
        };
        if target_participant.card.is_committed() && !revealed {
            tracing::debug!("Kick target '{}' holds a hidden card; ignoring", target);
            return Vec::new();
        }
        let target_name = target_participant.name.clone();
        let origin_name = self
            .participants
            .get(pid)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        if let Some(target_participant) = self.participants.get_mut(target) {
            target_participant.is_spectator = true;
            target_participant.card = CardState::Unset;
        }
        if let Some(room) = self.rooms.get_mut(key) {
            room.sfx_index = roll_sfx();
        }
        tracing::info!("'{}' kicked '{}' in room '{}'", origin_name, target_name, key);

        let Some(mut payload) = self.base_payload(key) else {
            return Vec::new();
        };
        payload.kicked_player = Some(target_name);
        payload.kicked_origin = Some(origin_name);
        vec![Delivery::ToRoom(
            key.to_string(),
            ServerEvent::Participants(payload),
        )]
    }

    /// Commit a card selection, or toggle the spectator flag when `watch`
    /// is explicitly provided. Late selections after a reveal are discarded
    /// to prevent result tampering.
    pub fn select_card(
        &mut self,
        pid: &str,
        key: &str,
        card: Option<String>,
        watch: Option<bool>,
    ) -> Vec<Delivery> {
        let Some(room) = self.rooms.get_mut(key) else {
            tracing::warn!("Card selection in unknown room '{}'", key);
            return Vec::new();
        };
        if room.revealed {
            tracing::debug!("Discarding selection from '{}': round already revealed", pid);
            return Vec::new();
        }
        room.sfx_index = roll_sfx();

        let Some(participant) = self.participants.get_mut(pid) else {
            return Vec::new();
        };
        if let Some(watch) = watch {
            participant.card = CardState::Unset;
            participant.is_spectator = watch;
        } else if let Some(raw) = card.filter(|c| !c.is_empty()) {
            participant.card = CardState::Chosen(CardChoice::parse(&raw));
            participant.is_spectator = false;
        }
        self.room_broadcast(key)
    }

    /// Set the room's estimation topic. Blank input falls back to the
    /// default placeholder; the new topic is announced to the whole room.
    pub fn set_topic(&mut self, pid: &str, key: &str, topic: String) -> Vec<Delivery> {
        let Some(room) = self.rooms.get_mut(key) else {
            tracing::warn!("Topic change in unknown room '{}'", key);
            return Vec::new();
        };
        let topic = sanitize_topic(&topic);
        room.topic = Some(topic.clone());
        room.sfx_index = roll_sfx();
        let sfx_index = room.sfx_index;
        tracing::debug!("Participant '{}' set topic of room '{}'", pid, key);
        vec![Delivery::ToRoom(
            key.to_string(),
            ServerEvent::NewUserStory { topic, sfx_index },
        )]
    }

    /// Reveal all cards. Succeeds only when every participant either holds
    /// a committed card or spectates; otherwise state is unchanged and no
    /// broadcast occurs. Returns whether a cool-down countdown must start.
    pub fn reveal(&mut self, pid: &str, key: &str) -> (Vec<Delivery>, bool) {
        if !self.rooms.contains_key(key) {
            tracing::warn!("Reveal in unknown room '{}'", key);
            return (Vec::new(), false);
        }
        if !self.all_ready(key) {
            tracing::debug!(
                "Reveal by '{}' in room '{}' refused: not all participants committed",
                pid,
                key
            );
            return (Vec::new(), false);
        }
        if let Some(room) = self.rooms.get_mut(key) {
            room.revealed = true;
            room.cooldown = Cooldown::Active(COOLDOWN_SECONDS);
            room.sfx_index = roll_sfx();
        }
        // Snapshot with the reveal applied, so history records the values.
        let clients = self.project(key);
        let topic = self.rooms.get(key).and_then(|r| r.topic.clone());
        if let Some(room) = self.rooms.get_mut(key) {
            room.push_history(HistoryEntry {
                topic,
                clients,
                recorded_at: Utc::now(),
            });
        }
        tracing::info!("Room '{}' revealed cards", key);
        (self.room_broadcast(key), true)
    }

    /// Start a new round. A no-op while the cool-down is still counting
    /// down, or when the previous round was not a fully-committed reveal.
    pub fn play_again(&mut self, pid: &str, key: &str) -> Vec<Delivery> {
        let Some(room) = self.rooms.get(key) else {
            tracing::warn!("Play-again in unknown room '{}'", key);
            return Vec::new();
        };
        if room.cooldown.is_blocking() {
            tracing::debug!("Play-again by '{}' refused: cool-down active", pid);
            return Vec::new();
        }
        if !room.revealed || !self.all_ready(key) {
            tracing::debug!("Play-again by '{}' refused: round not fully revealed", pid);
            return Vec::new();
        }
        self.cancel_cooldown(key);
        for id in self.member_ids(key) {
            if let Some(member) = self.participants.get_mut(&id) {
                member.card = CardState::Unset;
            }
        }
        if let Some(room) = self.rooms.get_mut(key) {
            room.revealed = false;
            room.cooldown = Cooldown::Inactive;
            room.sfx_index = roll_sfx();
        }
        tracing::info!("Room '{}' started a new round", key);

        let Some(mut payload) = self.base_payload(key) else {
            return Vec::new();
        };
        payload.play_again = Some(true);
        vec![Delivery::ToRoom(
            key.to_string(),
            ServerEvent::Participants(payload),
        )]
    }

    /// Remove a participant on connection close and notify the rest of its
    /// room.
    pub fn disconnect(&mut self, pid: &str) -> Vec<Delivery> {
        self.senders.remove(pid);
        let Some(participant) = self.participants.remove(pid) else {
            return Vec::new();
        };
        let Some(key) = participant.room else {
            return Vec::new();
        };
        if !self.rooms.contains_key(&key) {
            // Rooms are never destroyed, so this indicates a lifecycle bug.
            tracing::error!(
                "Room '{}' missing while disconnecting participant '{}'",
                key,
                pid
            );
            return Vec::new();
        }
        if let Some(room) = self.rooms.get_mut(&key) {
            room.sfx_index = roll_sfx();
        }
        let Some(mut payload) = self.base_payload(&key) else {
            return Vec::new();
        };
        payload.disconnect = Some(participant.name);
        vec![Delivery::ToRoom(key, ServerEvent::Participants(payload))]
    }

    /// Advance a room's cool-down by one second.
    pub fn cooldown_tick(&mut self, key: &str) -> CooldownTick {
        let finished = match self.rooms.get_mut(key) {
            None => return CooldownTick::Stopped,
            Some(room) => match room.cooldown {
                Cooldown::Active(seconds) if seconds > 0 => {
                    room.cooldown = Cooldown::Active(seconds - 1);
                    false
                }
                Cooldown::Active(_) => {
                    room.cooldown = Cooldown::Inactive;
                    true
                }
                Cooldown::Inactive => return CooldownTick::Stopped,
            },
        };
        if finished {
            CooldownTick::Finished(self.room_broadcast(key))
        } else {
            CooldownTick::Continue(self.room_broadcast(key))
        }
    }

    /// Store the countdown task for a room, aborting any previous one so a
    /// stale timer cannot leak into the new round.
    pub fn register_cooldown(&mut self, key: &str, handle: JoinHandle<()>) {
        if let Some(previous) = self.cooldown_tasks.insert(key.to_string(), handle) {
            previous.abort();
        }
    }

    fn cancel_cooldown(&mut self, key: &str) {
        if let Some(task) = self.cooldown_tasks.remove(key) {
            task.abort();
        }
    }

    /// Bounded reveal history of a room, newest first. Unknown rooms yield
    /// an empty list.
    pub fn history(&self, key: &str) -> Vec<HistoryEntry> {
        self.rooms
            .get(key)
            .map(|room| room.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Send every planned delivery through the registered sender channels.
    pub fn dispatch(&self, deliveries: &[Delivery]) {
        for delivery in deliveries {
            match delivery {
                Delivery::ToOne(pid, event) => {
                    let Ok(json) = serde_json::to_string(event) else {
                        tracing::warn!("Failed to serialize event for '{}'", pid);
                        continue;
                    };
                    self.send_to(pid, json);
                }
                Delivery::ToRoom(key, event) => {
                    let Ok(json) = serde_json::to_string(event) else {
                        tracing::warn!("Failed to serialize broadcast for room '{}'", key);
                        continue;
                    };
                    for pid in self.member_ids(key) {
                        self.send_to(&pid, json.clone());
                    }
                }
                Delivery::ToRoomExcept(key, origin, event) => {
                    let Ok(json) = serde_json::to_string(event) else {
                        tracing::warn!("Failed to serialize broadcast for room '{}'", key);
                        continue;
                    };
                    for pid in self.member_ids(key) {
                        if pid != *origin {
                            self.send_to(&pid, json.clone());
                        }
                    }
                }
            }
        }
    }

    fn send_to(&self, pid: &str, json: String) {
        if let Some(sender) = self.senders.get(pid) {
            if sender.send(json).is_err() {
                tracing::warn!("Failed to deliver message to '{}'", pid);
            }
        }
    }

    // Membership is derived from the registry; rooms keep no back-references.
    fn members_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Participant> + 'a {
        self.participants
            .values()
            .filter(move |p| p.room.as_deref() == Some(key))
    }

    fn member_ids(&self, key: &str) -> Vec<ParticipantId> {
        self.members_of(key).map(|p| p.id.clone()).collect()
    }

    fn all_ready(&self, key: &str) -> bool {
        self.members_of(key).all(|p| p.is_ready())
    }

    fn project(&self, key: &str) -> Vec<ParticipantView> {
        let revealed = self.rooms.get(key).map(|r| r.revealed).unwrap_or(false);
        project_participants(revealed, self.members_of(key))
    }

    fn base_payload(&self, key: &str) -> Option<ParticipantsPayload> {
        let room = self.rooms.get(key)?;
        Some(ParticipantsPayload {
            clients: project_participants(room.revealed, self.members_of(key)),
            myid: None,
            name: None,
            connect: None,
            kicked_player: None,
            kicked_origin: None,
            disconnect: None,
            play_again: None,
            cards_revealed: room.revealed,
            pause_remaining: room.cooldown.remaining(),
            sfx_index: room.sfx_index,
        })
    }

    fn room_broadcast(&self, key: &str) -> Vec<Delivery> {
        self.base_payload(key)
            .map(|payload| {
                vec![Delivery::ToRoom(
                    key.to_string(),
                    ServerEvent::Participants(payload),
                )]
            })
            .unwrap_or_default()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
