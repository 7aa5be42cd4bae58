//! Room store entries: per-room shared state.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::projection::ParticipantView;

/// Upper bound on retained reveal history entries per room.
pub const HISTORY_LIMIT: usize = 20;

/// Cool-down seconds started by a successful reveal.
pub const COOLDOWN_SECONDS: u8 = 3;

/// Countdown gating the next round after a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cooldown {
    #[default]
    Inactive,
    Active(u8),
}

impl Cooldown {
    /// Seconds left, or `None` when no cool-down is running. This is also
    /// the wire representation (`pauseRemaining`).
    pub fn remaining(&self) -> Option<u8> {
        match self {
            Cooldown::Inactive => None,
            Cooldown::Active(seconds) => Some(*seconds),
        }
    }

    /// Whether a new round is still blocked.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Cooldown::Active(seconds) if *seconds > 0)
    }
}

/// One past round: the topic and the projected participant snapshot taken
/// at reveal time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub topic: Option<String>,
    pub clients: Vec<ParticipantView>,
    pub recorded_at: DateTime<Utc>,
}

/// Shared state of one estimation session, keyed by a client-supplied
/// string. Created lazily on first join and never destroyed; rooms are not
/// garbage-collected.
#[derive(Debug, Clone)]
pub struct Room {
    /// Current estimation subject, if one was set.
    pub topic: Option<String>,
    /// Whether the current round's cards are visible.
    pub revealed: bool,
    pub cooldown: Cooldown,
    /// Past rounds, newest first, bounded to [`HISTORY_LIMIT`].
    pub history: VecDeque<HistoryEntry>,
    /// Ephemeral per-broadcast audio cue selector, re-rolled on every
    /// state-changing event. Clients must not infer game state from it.
    pub sfx_index: u8,
}

impl Room {
    pub fn new() -> Self {
        Self {
            topic: None,
            revealed: false,
            cooldown: Cooldown::Inactive,
            history: VecDeque::new(),
            sfx_index: roll_sfx(),
        }
    }

    /// Prepend a history entry, evicting the oldest beyond the cap.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_front(entry);
        self.history.truncate(HISTORY_LIMIT);
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

/// Roll a fresh sound-cue index (1..=60).
pub fn roll_sfx() -> u8 {
    rand::rng().random_range(1..=60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(topic: &str) -> HistoryEntry {
        HistoryEntry {
            topic: Some(topic.to_string()),
            clients: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_room_has_no_round_in_progress() {
        let room = Room::new();

        assert!(!room.revealed);
        assert_eq!(room.cooldown, Cooldown::Inactive);
        assert!(room.topic.is_none());
        assert!(room.history.is_empty());
        assert!((1..=60).contains(&room.sfx_index));
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut room = Room::new();
        room.push_history(entry("first"));
        room.push_history(entry("second"));

        assert_eq!(room.history[0].topic.as_deref(), Some("second"));
        assert_eq!(room.history[1].topic.as_deref(), Some("first"));
    }

    #[test]
    fn test_history_never_exceeds_limit_and_evicts_oldest() {
        let mut room = Room::new();
        for i in 0..25 {
            room.push_history(entry(&format!("round-{i}")));
        }

        assert_eq!(room.history.len(), HISTORY_LIMIT);
        // newest kept at the front, oldest five evicted
        assert_eq!(room.history[0].topic.as_deref(), Some("round-24"));
        assert_eq!(
            room.history[HISTORY_LIMIT - 1].topic.as_deref(),
            Some("round-5")
        );
    }

    #[test]
    fn test_cooldown_remaining_maps_to_wire_value() {
        assert_eq!(Cooldown::Inactive.remaining(), None);
        assert_eq!(Cooldown::Active(3).remaining(), Some(3));
    }

    #[test]
    fn test_cooldown_blocks_only_while_counting_down() {
        assert!(Cooldown::Active(3).is_blocking());
        assert!(Cooldown::Active(1).is_blocking());
        assert!(!Cooldown::Active(0).is_blocking());
        assert!(!Cooldown::Inactive.is_blocking());
    }

    #[test]
    fn test_roll_sfx_stays_in_cue_range() {
        for _ in 0..100 {
            assert!((1..=60).contains(&roll_sfx()));
        }
    }
}
