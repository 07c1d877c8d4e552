//! The static card catalog and deck production.
//!
//! 68 standard cards (ids 1–68, grouped by section) plus 8 wildcards
//! (ids 69–76).

use std::collections::HashSet;

use basta_protocol::Section;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Card, CardId, CatalogError, Goal};

/// Number of cards in a full deck.
pub const CATALOG_SIZE: usize = 76;

/// Number of wildcard cards.
pub const WILDCARD_COUNT: usize = 8;

/// `(section, artwork prefix, goal sets)`; ids are assigned in table order.
const STANDARD_CARDS: &[(Section, &str, &[&[Goal]])] = &[
    (
        Section::Poverty,
        "PDS",
        &[
            &[1, 5, 8, 10, 16, 17],
            &[1, 5, 8, 10, 16],
            &[1, 3, 5, 8, 9, 13, 16, 17],
            &[5, 8, 9, 10, 12, 16, 17],
            &[1, 5, 8, 16, 10],
            &[1, 4, 5, 8, 16, 17],
            &[1, 10, 5, 16, 17],
            &[1, 3, 5, 8, 9, 10, 12],
            &[1, 4, 5, 8, 10, 16, 17],
        ],
    ),
    (
        Section::Hunger,
        "HFAA",
        &[
            &[2, 3, 4, 12, 13, 15],
            &[2, 3, 4, 6, 9, 10, 12, 13, 16],
            &[2, 3, 6, 9, 11, 12, 13, 17],
            &[2, 3, 6, 12, 13, 15],
            &[2, 3, 4, 12, 13, 15],
            &[2, 3, 6, 10, 12, 13],
            &[2, 3, 4, 7, 11, 13, 16],
            &[2, 3, 6, 12, 13, 15],
        ],
    ),
    (
        Section::Health,
        "SBI",
        &[
            &[2, 3, 4, 6, 12, 13, 16, 17],
            &[2, 3, 11, 13, 15],
            &[3, 6, 7, 11, 13, 15],
            &[3, 4, 7, 11, 12, 13, 16],
            &[2, 3, 6, 7, 9, 11, 12, 13],
            &[2, 3, 6, 11, 12, 13, 15],
            &[3, 4, 5, 9, 12, 13, 16, 17],
            &[3, 4, 7, 11, 13, 15],
            &[2, 3, 6, 10, 13],
        ],
    ),
    (
        Section::Education,
        "EDL",
        &[
            &[4, 5, 8, 10, 16, 17],
            &[4, 5, 8, 10],
            &[4, 5, 10, 16, 17],
            &[4, 5, 9, 10, 13, 17],
            &[4, 5, 8, 9, 10, 13, 17],
            &[4, 5, 7, 8, 10, 16, 17],
            &[4, 5, 10, 13, 16, 17],
            &[4, 5, 9, 10, 13, 16, 17],
        ],
    ),
    (
        Section::Gender,
        "DGD",
        &[
            &[5, 8, 10, 16, 17],
            &[1, 4, 5, 8, 10],
            &[5, 8, 10, 13, 16, 17],
            &[1, 5, 8, 10, 16],
            &[4, 5, 8, 10, 16, 17],
            &[4, 5, 10, 16, 17],
            &[5, 8, 9, 10, 16, 17],
            &[1, 4, 5, 8, 10, 16],
        ],
    ),
    (
        Section::Environment,
        "DACC",
        &[
            &[6, 7, 11, 12, 13, 15],
            &[6, 7, 11, 13],
            &[7, 9, 12, 13, 14, 15],
            &[9, 11, 13, 14, 15],
            &[6, 7, 9, 12, 13, 14],
            &[7, 11, 12, 13, 14, 15],
            &[4, 7, 9, 12, 13],
            &[7, 11, 13, 14, 15],
            &[7, 11, 12, 13, 14, 15],
        ],
    ),
    (
        Section::Consumption,
        "CPNS",
        &[
            &[6, 9, 12, 13],
            &[7, 8, 9, 12, 17],
            &[4, 7, 8, 9, 12, 13],
            &[6, 7, 9, 12, 13],
            &[4, 7, 8, 9, 12, 13, 17],
            &[6, 7, 9, 12, 13],
            &[7, 9, 11, 12, 13, 15],
            &[6, 7, 12, 13],
            &[6, 7, 9, 12, 13],
        ],
    ),
    (
        Section::Institutions,
        "FPJIS",
        &[
            &[5, 10, 13, 16, 17],
            &[5, 8, 9, 12, 13, 16, 17],
            &[5, 10, 16, 17],
            &[4, 9, 12, 13, 16, 17],
            &[5, 10, 13, 16, 17],
            &[8, 9, 10, 12, 16, 17],
            &[5, 9, 13, 16, 17],
            &[5, 10, 13, 16, 17],
        ],
    ),
];

/// The immutable set of cards a game is played with.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Catalog {
    /// The standard 76-card BASTA catalog.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(CATALOG_SIZE);
        let mut next_id: CardId = 1;
        for (section, prefix, goal_sets) in STANDARD_CARDS {
            for (n, goals) in goal_sets.iter().enumerate() {
                let image = format!("{prefix}_{}.png", n + 1);
                cards.push(Card::standard(next_id, *section, goals, image));
                next_id += 1;
            }
        }
        for n in 1..=WILDCARD_COUNT {
            cards.push(Card::wildcard(next_id, format!("wildcard_{n}.png")));
            next_id += 1;
        }
        Self { cards }
    }

    /// Builds a catalog from arbitrary cards after validating them.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, CatalogError> {
        let catalog = Self { cards };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks id uniqueness and that every standard card carries goals
    /// within 1..=17.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.cards.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(self.cards.len());
        for card in &self.cards {
            if !seen.insert(card.id) {
                return Err(CatalogError::DuplicateId(card.id));
            }
            if let crate::CardKind::Standard { goals, .. } = &card.kind {
                if goals.is_empty() {
                    return Err(CatalogError::NoGoals(card.id));
                }
                if let Some(bad) = goals.iter().find(|g| !(1..=17).contains(*g)) {
                    return Err(CatalogError::GoalOutOfRange(card.id, *bad));
                }
            }
        }
        Ok(())
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// A fresh, uniformly shuffled copy of the catalog.
    pub fn shuffled_deck<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Card> {
        let mut deck = self.cards.clone();
        deck.shuffle(rng);
        deck
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_standard_has_76_cards_and_validates() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.len(), CATALOG_SIZE);
        catalog.validate().unwrap();
    }

    #[test]
    fn test_standard_section_counts() {
        let catalog = Catalog::standard();
        let count = |s: Section| {
            catalog
                .cards()
                .iter()
                .filter(|c| c.section() == Some(s))
                .count()
        };
        assert_eq!(count(Section::Poverty), 9);
        assert_eq!(count(Section::Hunger), 8);
        assert_eq!(count(Section::Health), 9);
        assert_eq!(count(Section::Environment), 9);
        assert_eq!(count(Section::Institutions), 8);
        assert_eq!(catalog.cards().iter().filter(|c| c.is_wildcard()).count(), 8);
    }

    #[test]
    fn test_standard_ids_and_images_follow_table_order() {
        let catalog = Catalog::standard();
        let first_hunger = catalog.get(10).unwrap();
        assert_eq!(first_hunger.section(), Some(Section::Hunger));
        assert_eq!(first_hunger.image, "HFAA_1.png");
        assert_eq!(catalog.get(68).unwrap().image, "FPJIS_8.png");
        let wild = catalog.get(69).unwrap();
        assert!(wild.is_wildcard());
        assert_eq!(wild.image, "wildcard_1.png");
        assert!(catalog.get(77).is_none());
    }

    #[test]
    fn test_from_cards_duplicate_id_returns_error() {
        let cards = vec![
            Card::wildcard(1, "a".into()),
            Card::wildcard(1, "b".into()),
        ];
        assert!(matches!(
            Catalog::from_cards(cards),
            Err(CatalogError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_from_cards_goal_out_of_range_returns_error() {
        let cards = vec![Card::standard(5, Section::Health, &[3, 18], "x".into())];
        assert!(matches!(
            Catalog::from_cards(cards),
            Err(CatalogError::GoalOutOfRange(5, 18))
        ));
    }

    #[test]
    fn test_from_cards_empty_goals_returns_error() {
        let cards = vec![Card::standard(5, Section::Health, &[], "x".into())];
        assert!(matches!(
            Catalog::from_cards(cards),
            Err(CatalogError::NoGoals(5))
        ));
    }

    #[test]
    fn test_shuffled_deck_is_permutation_of_catalog() {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let deck = catalog.shuffled_deck(&mut rng);
        assert_eq!(deck.len(), CATALOG_SIZE);
        let mut ids: Vec<CardId> = deck.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=76).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffled_deck_same_seed_same_order() {
        let catalog = Catalog::standard();
        let a = catalog.shuffled_deck(&mut StdRng::seed_from_u64(99));
        let b = catalog.shuffled_deck(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
