//! Canonical card set and selection parsing.
//!
//! The deck is shared between server-side validation and client rendering
//! (`GET /api/cards`), so the two can never drift apart.

/// Ordered value labels of the estimation deck.
pub const VALUES: [&str; 10] = ["0", "½", "1", "2", "3", "5", "8", "13", "20", "40"];

/// Icon-only special choice: take a break.
pub const COFFEE: &str = "coffee";

/// Icon-only special choice: no idea.
pub const QUESTION: &str = "question";

/// Label substituted for an unrecognized selection. The choice still counts
/// toward reveal readiness.
pub const INVALID_CHOICE: &str = "🤦";

/// Opaque marker shown for a committed card while the round is unrevealed.
pub const SELECTED_MARKER: &str = "^";

/// The full deck as sent to clients: value labels followed by the two
/// icon-only specials.
pub fn deck() -> Vec<&'static str> {
    let mut cards: Vec<&'static str> = VALUES.to_vec();
    cards.push(COFFEE);
    cards.push(QUESTION);
    cards
}

/// A validated card selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardChoice {
    /// One of the canonical value labels.
    Value(&'static str),
    Coffee,
    Question,
    /// Anything that is not part of the deck.
    Invalid,
}

impl CardChoice {
    /// Parse a raw client-supplied card value against the canonical set.
    /// Unrecognized non-empty values become [`CardChoice::Invalid`] rather
    /// than being rejected.
    pub fn parse(raw: &str) -> Self {
        if let Some(value) = VALUES.iter().find(|v| **v == raw) {
            return CardChoice::Value(value);
        }
        match raw {
            COFFEE => CardChoice::Coffee,
            QUESTION => CardChoice::Question,
            _ => CardChoice::Invalid,
        }
    }

    /// The label revealed to clients once the round is visible.
    pub fn label(&self) -> &'static str {
        match self {
            CardChoice::Value(value) => value,
            CardChoice::Coffee => COFFEE,
            CardChoice::Question => QUESTION,
            CardChoice::Invalid => INVALID_CHOICE,
        }
    }
}
