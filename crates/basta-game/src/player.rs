//! Seated players.

use basta_protocol::{CardView, PlayerId, PlayerSummary, RosterEntry};

use crate::{Card, CardId};

/// Longest display name kept, in characters.
pub const MAX_NAME_CHARS: usize = 18;

/// Name used when a client joins with a blank one.
pub const DEFAULT_NAME: &str = "Player";

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub ready: bool,
    pub has_drawn: bool,
    pub has_skipped: bool,
    /// Set by a penalty the deck could not pay; cleared on the next turn.
    pub blocked: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: sanitize_name(name),
            hand: Vec::new(),
            ready: false,
            has_drawn: false,
            has_skipped: false,
            blocked: false,
        }
    }

    /// Removes a card from the hand by id.
    pub fn take_card(&mut self, card_id: CardId) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.id == card_id)?;
        Some(self.hand.remove(idx))
    }

    pub fn hand_view(&self) -> Vec<CardView> {
        self.hand.iter().map(Card::view).collect()
    }

    pub fn reset_cycle_flags(&mut self) {
        self.has_drawn = false;
        self.has_skipped = false;
    }

    /// Clears everything a finished game leaves behind.
    pub fn reset_for_lobby(&mut self) {
        self.hand.clear();
        self.ready = false;
        self.blocked = false;
        self.reset_cycle_flags();
    }

    pub fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            id: self.id,
            name: self.name.clone(),
            ready: self.ready,
        }
    }

    pub fn summary(&self, is_active: bool) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            card_count: self.hand.len(),
            is_active,
            blocked: self.blocked,
        }
    }
}

/// Trims and truncates a requested display name.
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    let name = name.trim_end();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name.to_string()
    }
}
