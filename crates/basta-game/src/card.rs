//! Cards and the validity rule used by verification.

use basta_protocol::{CardView, InvalidReason, Section, WheelSelection};

/// Stable catalog identifier of a card.
pub type CardId = u32;

/// One of the 17 numbered goals on the inner ring (1..=17).
pub type Goal = u8;

/// What a card can match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardKind {
    /// Belongs to exactly one section and lists the goals it supports.
    Standard { section: Section, goals: Vec<Goal> },
    /// Matches any selection on either ring.
    Wildcard,
}

/// An immutable card. Only its location (deck, hand, played list) changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub kind: CardKind,
    /// Opaque artwork key, passed through to clients.
    pub image: String,
}

/// Display colour for wildcard cards.
pub const WILDCARD_COLOR: &str = "#FFD700";

impl Card {
    pub fn standard(id: CardId, section: Section, goals: &[Goal], image: String) -> Self {
        Self {
            id,
            kind: CardKind::Standard {
                section,
                goals: goals.to_vec(),
            },
            image,
        }
    }

    pub fn wildcard(id: CardId, image: String) -> Self {
        Self {
            id,
            kind: CardKind::Wildcard,
            image,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, CardKind::Wildcard)
    }

    pub fn section(&self) -> Option<Section> {
        match &self.kind {
            CardKind::Standard { section, .. } => Some(*section),
            CardKind::Wildcard => None,
        }
    }

    /// Checks this card against a wheel selection.
    ///
    /// Returns `None` when the card is valid, or the reason it is not.
    pub fn check(&self, selection: &WheelSelection) -> Option<InvalidReason> {
        match (&self.kind, selection) {
            (CardKind::Wildcard, _) => None,
            (CardKind::Standard { section, .. }, WheelSelection::Outer { section: target, .. }) => {
                (section != target).then_some(InvalidReason::WrongSection)
            }
            (CardKind::Standard { goals, .. }, WheelSelection::Inner { number }) => {
                (!goals.contains(number)).then_some(InvalidReason::WrongNumber)
            }
        }
    }

    pub fn view(&self) -> CardView {
        match &self.kind {
            CardKind::Standard { section, goals } => CardView {
                id: self.id,
                section: Some(*section),
                goals: goals.clone(),
                wildcard: false,
                image: self.image.clone(),
                color: section_color(*section).to_string(),
            },
            CardKind::Wildcard => CardView {
                id: self.id,
                section: None,
                goals: (1..=17).collect(),
                wildcard: true,
                image: self.image.clone(),
                color: WILDCARD_COLOR.to_string(),
            },
        }
    }
}

/// Display colour of a section's cards.
pub fn section_color(section: Section) -> &'static str {
    match section {
        Section::Poverty => "#CC5555",
        Section::Hunger => "#CC9955",
        Section::Health => "#99CC55",
        Section::Education => "#55CC99",
        Section::Gender => "#55CCCC",
        Section::Environment => "#5599CC",
        Section::Consumption => "#9955CC",
        Section::Institutions => "#CC5599",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunger_card() -> Card {
        Card::standard(10, Section::Hunger, &[2, 3, 4, 12, 13, 15], "HFAA_1.png".into())
    }

    #[test]
    fn test_check_outer_matching_section_is_valid() {
        let sel = WheelSelection::Outer {
            index: 1,
            section: Section::Hunger,
        };
        assert_eq!(hunger_card().check(&sel), None);
    }

    #[test]
    fn test_check_outer_other_section_is_wrong_section() {
        let sel = WheelSelection::Outer {
            index: 0,
            section: Section::Poverty,
        };
        assert_eq!(hunger_card().check(&sel), Some(InvalidReason::WrongSection));
    }

    #[test]
    fn test_check_inner_listed_goal_is_valid() {
        assert_eq!(hunger_card().check(&WheelSelection::Inner { number: 13 }), None);
    }

    #[test]
    fn test_check_inner_missing_goal_is_wrong_number() {
        assert_eq!(
            hunger_card().check(&WheelSelection::Inner { number: 1 }),
            Some(InvalidReason::WrongNumber)
        );
    }

    #[test]
    fn test_check_wildcard_matches_every_selection() {
        let wild = Card::wildcard(69, "wildcard_1.png".into());
        for section in Section::ALL {
            let sel = WheelSelection::Outer {
                index: section.index(),
                section,
            };
            assert_eq!(wild.check(&sel), None);
        }
        for number in 1..=17 {
            assert_eq!(wild.check(&WheelSelection::Inner { number }), None);
        }
    }

    #[test]
    fn test_view_standard_carries_section_and_color() {
        let view = hunger_card().view();
        assert_eq!(view.section, Some(Section::Hunger));
        assert!(!view.wildcard);
        assert_eq!(view.color, "#CC9955");
        assert_eq!(view.goals, vec![2, 3, 4, 12, 13, 15]);
    }

    #[test]
    fn test_view_wildcard_lists_all_goals() {
        let view = Card::wildcard(70, "wildcard_2.png".into()).view();
        assert!(view.wildcard);
        assert_eq!(view.section, None);
        assert_eq!(view.goals.len(), 17);
    }
}
