//! Participant registry entries.

use crate::domain::cards::CardChoice;

/// Opaque connection identifier, unique per live connection.
pub type ParticipantId = String;

/// What a participant currently holds in hand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardState {
    /// No selection this round.
    #[default]
    Unset,
    /// A committed selection. Whether its value is visible on the wire is
    /// decided by the projection, never stored here.
    Chosen(CardChoice),
}

impl CardState {
    pub fn is_committed(&self) -> bool {
        matches!(self, CardState::Chosen(_))
    }
}

/// One connected actor. Exists exactly as long as its connection is live.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    /// Key of the room currently joined; `None` until the first join event.
    pub room: Option<String>,
    /// Display name, never empty once set (placeholder assigned at connect).
    pub name: String,
    pub card: CardState,
    /// Spectators never contribute a card and are excluded from
    /// reveal-readiness checks.
    pub is_spectator: bool,
}

impl Participant {
    pub fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            room: None,
            name,
            card: CardState::Unset,
            is_spectator: false,
        }
    }

    /// Whether this participant blocks a reveal: estimators without a
    /// committed card are not ready.
    pub fn is_ready(&self) -> bool {
        self.is_spectator || self.card.is_committed()
    }
}
