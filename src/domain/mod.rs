//! Session domain model.
//!
//! Pure, synchronous types and functions for rooms, participants, card
//! validation, input sanitization and snapshot projection. Nothing in this
//! module touches the transport layer, which keeps the estimation rules
//! easy to test in isolation.

pub mod cards;
pub mod names;
pub mod participant;
pub mod projection;
pub mod room;
pub mod sanitize;

pub use cards::{CardChoice, SELECTED_MARKER};
pub use participant::{CardState, Participant};
pub use projection::{ParticipantView, project_participants};
pub use room::{Cooldown, HistoryEntry, Room};
