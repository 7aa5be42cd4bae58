//! Visibility projection: the client-safe view of a room's participants.
//!
//! Raw card values must never reach other clients' transport layer before a
//! reveal; a committed card in an unrevealed round is replaced by the opaque
//! [`SELECTED_MARKER`]. This view is what gets serialized into every
//! broadcast payload.

use serde::{Deserialize, Serialize};

use crate::domain::cards::SELECTED_MARKER;
use crate::domain::participant::{CardState, Participant};

/// Broadcast-safe participant snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
    /// `None` when no card is committed; the masked marker while the round
    /// is unrevealed; the actual label once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    pub is_spectator: bool,
}

/// Project a room's participants into their masked wire representation,
/// sorted by participant id for deterministic output.
pub fn project_participants<'a>(
    revealed: bool,
    members: impl Iterator<Item = &'a Participant>,
) -> Vec<ParticipantView> {
    let mut views: Vec<ParticipantView> = members
        .map(|p| ParticipantView {
            id: p.id.clone(),
            name: p.name.clone(),
            card: match (&p.card, revealed) {
                (CardState::Unset, _) => None,
                (CardState::Chosen(choice), true) => Some(choice.label().to_string()),
                (CardState::Chosen(_), false) => Some(SELECTED_MARKER.to_string()),
            },
            is_spectator: p.is_spectator,
        })
        .collect();
    views.sort_by(|a, b| a.id.cmp(&b.id));
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::{CardChoice, INVALID_CHOICE};

    fn estimator(id: &str, card: CardState) -> Participant {
        let mut p = Participant::new(id.to_string(), format!("name-{id}"));
        p.card = card;
        p
    }

    #[test]
    fn test_committed_cards_are_masked_while_unrevealed() {
        let members = vec![
            estimator("a", CardState::Chosen(CardChoice::parse("5"))),
            estimator("b", CardState::Unset),
        ];

        let views = project_participants(false, members.iter());

        assert_eq!(views[0].card.as_deref(), Some(SELECTED_MARKER));
        assert_eq!(views[1].card, None);
    }

    #[test]
    fn test_revealed_round_shows_actual_labels() {
        let members = vec![
            estimator("a", CardState::Chosen(CardChoice::parse("13"))),
            estimator("b", CardState::Chosen(CardChoice::parse("coffee"))),
            estimator("c", CardState::Chosen(CardChoice::parse("not-a-card"))),
        ];

        let views = project_participants(true, members.iter());

        assert_eq!(views[0].card.as_deref(), Some("13"));
        assert_eq!(views[1].card.as_deref(), Some("coffee"));
        assert_eq!(views[2].card.as_deref(), Some(INVALID_CHOICE));
    }

    #[test]
    fn test_spectator_without_card_shows_no_card_either_way() {
        let mut spectator = estimator("s", CardState::Unset);
        spectator.is_spectator = true;
        let members = vec![spectator];

        for revealed in [false, true] {
            let views = project_participants(revealed, members.iter());
            assert_eq!(views[0].card, None);
            assert!(views[0].is_spectator);
        }
    }

    #[test]
    fn test_projection_is_sorted_by_id() {
        let members = vec![
            estimator("zz", CardState::Unset),
            estimator("aa", CardState::Unset),
            estimator("mm", CardState::Unset),
        ];

        let views = project_participants(false, members.iter());

        let ids: Vec<&str> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["aa", "mm", "zz"]);
    }

    #[test]
    fn test_view_serializes_with_camel_case_fields() {
        let views = project_participants(
            false,
            vec![estimator("a", CardState::Chosen(CardChoice::parse("5")))].iter(),
        );

        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["card"], "^");
        assert_eq!(json["isSpectator"], false);
        assert_eq!(json["name"], "name-a");
    }
}
