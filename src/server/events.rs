//! Wire messages exchanged over the WebSocket, strongly typed at the
//! boundary. Malformed frames are rejected by serde before any handler
//! sees them.

use serde::{Deserialize, Serialize};

use crate::domain::ParticipantView;

/// Inbound client events, internally tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join a room, optionally with a display name and spectator flag.
    Join {
        room: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        watch: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    Rename {
        room: String,
        #[serde(default)]
        new_name: Option<String>,
    },
    /// Demote another participant to spectator.
    Kick { room: String, participant: String },
    SelectCard {
        room: String,
        #[serde(default)]
        card: Option<String>,
        #[serde(default)]
        watch: Option<bool>,
    },
    SetTopic { room: String, topic: String },
    Reveal { room: String },
    PlayAgain { room: String },
}

impl ClientEvent {
    /// The raw room reference carried by this event.
    pub fn room(&self) -> &str {
        match self {
            ClientEvent::Join { room, .. }
            | ClientEvent::Rename { room, .. }
            | ClientEvent::Kick { room, .. }
            | ClientEvent::SelectCard { room, .. }
            | ClientEvent::SetTopic { room, .. }
            | ClientEvent::Reveal { room }
            | ClientEvent::PlayAgain { room } => room,
        }
    }
}

/// Outbound server events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Room snapshot, optionally annotated with a notice about what changed.
    Participants(ParticipantsPayload),
    #[serde(rename_all = "camelCase")]
    NewUserStory { topic: String, sfx_index: u8 },
}

/// The room snapshot broadcast on every state change. Optional fields are
/// notices: at most one of them is set per broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsPayload {
    pub clients: Vec<ParticipantView>,
    /// Own connection id, only in the private payload sent to a joiner.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub myid: Option<String>,
    /// Own (possibly placeholder) name, only in the private join payload.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Name of a participant that just joined.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub connect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kicked_player: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kicked_origin: Option<String>,
    /// Name of a participant that just left.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub disconnect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub play_again: Option<bool>,
    pub cards_revealed: bool,
    /// Cool-down seconds left; `null` when inactive.
    pub pause_remaining: Option<u8>,
    pub sfx_index: u8,
}
