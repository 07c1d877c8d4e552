//! Turn play: dice, wheel, and the simultaneous play phase.

use basta_protocol::{Phase, PlayerId, ServerMessage, WheelSelection};
use rand::Rng;

use crate::wheel::{display_name, resolve_sector, ring_for_roll, sector_count, selection_for, spin_rotation};
use crate::{ActionError, CardId, Lobby, Outbox, PlayedCard, Timer};

impl Lobby {
    /// Rolls the die for the current-turn player and picks the ring.
    pub fn roll_dice(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        self.require_phase(Phase::AwaitRoll)?;
        self.require_turn(idx)?;

        let value: u8 = self.rng.random_range(1..=6);
        let ring = ring_for_roll(value);
        self.dice_value = Some(value);
        self.ring = Some(ring);
        self.phase = Phase::AwaitSpin;
        tracing::debug!(lobby = %self.id, player = %id, value, ?ring, "dice rolled");

        let mut out = Outbox::new();
        out.broadcast(ServerMessage::DiceRolled {
            player_id: id,
            value,
            ring,
        });
        self.broadcast_state(&mut out);
        Ok(out)
    }

    /// Starts a spin. The result is only resolved once the settle timer
    /// fires, so every client sees the same animation first.
    pub fn spin_wheel(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        self.require_phase(Phase::AwaitSpin)?;
        self.require_turn(idx)?;
        if self.pending_spin.is_some() {
            return Err(ActionError::SpinInProgress);
        }

        let rotation = spin_rotation(&mut self.rng);
        self.pending_spin = Some(rotation);
        tracing::debug!(lobby = %self.id, player = %id, rotation, "wheel spinning");

        let mut out = Outbox::new();
        out.broadcast(ServerMessage::WheelSpinning { rotation });
        out.arm(Timer::SpinSettle, self.config.spin_settle);
        Ok(out)
    }

    /// Resolves the pending spin.
    ///
    /// A selection already used in the current cycle is announced as a
    /// repeat and the turn stays in `AwaitSpin` for another spin.
    pub fn settle_spin(&mut self) -> Outbox {
        let mut out = Outbox::new();
        if self.require_phase(Phase::AwaitSpin).is_err() {
            return out;
        }
        let (Some(rotation), Some(ring)) = (self.pending_spin.take(), self.ring) else {
            return out;
        };

        let wheel = self.config.wheel;
        let index = resolve_sector(
            f64::from(rotation),
            sector_count(ring),
            wheel.clockwise,
            wheel.pointer_offset_deg,
        );
        let selection = selection_for(ring, index);
        let name = display_name(&selection);

        let fresh = match selection {
            WheelSelection::Outer { section, .. } => self.used_outer.record(section),
            WheelSelection::Inner { number } => self.used_inner.record(number),
        };
        if !fresh {
            tracing::debug!(lobby = %self.id, selection = %name, "selection repeated");
            out.broadcast(ServerMessage::SelectionRepeated { display_name: name });
            self.broadcast_state(&mut out);
            return out;
        }

        tracing::debug!(lobby = %self.id, selection = %name, "wheel resolved");
        self.selection = Some(selection);
        self.phase = Phase::Play;
        for player in &mut self.players {
            player.reset_cycle_flags();
        }

        out.broadcast(ServerMessage::WheelResolved {
            selection,
            display_name: name,
        });
        self.broadcast_state(&mut out);
        out
    }

    /// Puts a card from the player's hand on the table.
    pub fn play_card(&mut self, id: PlayerId, card_id: CardId) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        self.require_phase(Phase::Play)?;
        if self.players[idx].blocked {
            return Err(ActionError::Blocked);
        }
        let card = self.players[idx]
            .take_card(card_id)
            .ok_or(ActionError::CardNotInHand(card_id))?;

        let view = card.view();
        self.played.push(PlayedCard { owner: id, card });
        let name = self.players[idx].name.clone();

        let mut out = Outbox::new();
        if self.players[idx].hand.is_empty() {
            tracing::debug!(lobby = %self.id, player = %id, "hand emptied");
            self.obligation = Some(id);
            out.broadcast(ServerMessage::PlayerEmptiedHand {
                player_id: id,
                player_name: name.clone(),
            });
        }
        out.broadcast(ServerMessage::CardPlayed {
            player_id: id,
            player_name: name,
            card: view,
        });
        self.send_hand(idx, &mut out);
        self.broadcast_state(&mut out);
        Ok(out)
    }

    /// Draws one card. Allowed once per cycle; with an empty deck nothing
    /// happens and the draw stays available.
    pub fn draw_card(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        self.require_phase(Phase::Play)?;
        if self.players[idx].blocked {
            return Err(ActionError::Blocked);
        }
        if self.players[idx].has_drawn {
            return Err(ActionError::AlreadyDrawn);
        }

        let mut out = Outbox::new();
        if self.deal(idx, 1) == 0 {
            tracing::debug!(lobby = %self.id, player = %id, "draw from empty deck ignored");
            return Ok(out);
        }
        let player = &mut self.players[idx];
        player.has_drawn = true;
        let name = player.name.clone();

        out.broadcast(ServerMessage::CardDrawn {
            player_id: id,
            player_name: name,
        });
        self.send_hand(idx, &mut out);
        self.broadcast_state(&mut out);
        Ok(out)
    }

    /// Passes for this cycle. When everyone has passed the turn moves on
    /// without a verification.
    pub fn skip_turn(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        self.require_phase(Phase::Play)?;
        if self.players[idx].has_skipped {
            return Err(ActionError::AlreadySkipped);
        }
        self.players[idx].has_skipped = true;

        let mut out = Outbox::new();
        out.broadcast(ServerMessage::PlayerSkipped {
            player_id: id,
            player_name: self.players[idx].name.clone(),
        });
        if self.players.iter().all(|p| p.has_skipped) {
            tracing::debug!(lobby = %self.id, "all players skipped");
            out.broadcast(ServerMessage::AllSkipped);
            self.next_turn(&mut out);
        } else {
            self.broadcast_state(&mut out);
        }
        Ok(out)
    }

    /// Hands the turn to the next seat.
    ///
    /// Cards still on the table go back to their owners, blocks are lifted
    /// and the dice and wheel are reset. A block set during verification
    /// lasts until exactly this advance.
    pub(crate) fn next_turn(&mut self, out: &mut Outbox) {
        let mut touched = Vec::new();
        for PlayedCard { owner, card } in std::mem::take(&mut self.played) {
            if let Ok(idx) = self.index_of(owner) {
                self.players[idx].hand.push(card);
                if !touched.contains(&idx) {
                    touched.push(idx);
                }
            }
        }
        for idx in touched {
            self.send_hand(idx, out);
        }
        if let Some(holder) = self.obligation {
            let still_empty = self.player(holder).is_some_and(|p| p.hand.is_empty());
            if !still_empty {
                self.obligation = None;
            }
        }

        self.clear_turn_fields();
        out.cancel(Timer::SpinSettle);
        if !self.players.is_empty() {
            self.turn_index = (self.turn_index + 1) % self.players.len();
        }

        let mut unblocked = Vec::new();
        for player in &mut self.players {
            player.reset_cycle_flags();
            if player.blocked {
                player.blocked = false;
                unblocked.push(player.name.clone());
            }
        }
        if !unblocked.is_empty() {
            let message = format!("{} can play again", unblocked.join(", "));
            out.broadcast(ServerMessage::PlayersUnblocked {
                names: unblocked,
                message,
            });
        }

        tracing::debug!(lobby = %self.id, turn = self.turn_index, "next turn");
        self.broadcast_state(out);
    }
}

#[cfg(test)]
mod tests {
    use basta_protocol::{Lifecycle, Ring, Section};

    use super::*;
    use crate::lobby::test_support::playing_lobby;
    use crate::{Card, Effect};

    /// Forces the wheel into `Play` with the given selection.
    fn open_play(lobby: &mut Lobby, selection: WheelSelection) {
        lobby.phase = Phase::Play;
        lobby.ring = Some(selection.ring());
        lobby.selection = Some(selection);
    }

    // =====================================================================
    // Roll
    // =====================================================================

    #[test]
    fn test_roll_dice_picks_ring_and_moves_to_spin() {
        let mut lobby = playing_lobby(2, 11);
        let out = lobby.roll_dice(PlayerId(1)).unwrap();

        let value = lobby.dice_value().unwrap();
        assert!((1..=6).contains(&value));
        let expected = if value <= 4 { Ring::Inner } else { Ring::Outer };
        assert_eq!(lobby.ring(), Some(expected));
        assert_eq!(lobby.phase(), Phase::AwaitSpin);
        assert!(matches!(
            out.broadcasts().next(),
            Some(ServerMessage::DiceRolled { .. })
        ));
    }

    #[test]
    fn test_roll_dice_not_your_turn_returns_error() {
        let mut lobby = playing_lobby(2, 11);
        assert_eq!(lobby.roll_dice(PlayerId(2)).unwrap_err(), ActionError::NotYourTurn);
        assert_eq!(lobby.phase(), Phase::AwaitRoll);
    }

    #[test]
    fn test_roll_dice_twice_returns_wrong_phase() {
        let mut lobby = playing_lobby(2, 11);
        lobby.roll_dice(PlayerId(1)).unwrap();
        assert_eq!(
            lobby.roll_dice(PlayerId(1)).unwrap_err(),
            ActionError::WrongPhase(Phase::AwaitSpin)
        );
    }

    // =====================================================================
    // Spin
    // =====================================================================

    #[test]
    fn test_spin_wheel_arms_settle_and_rejects_second_spin() {
        let mut lobby = playing_lobby(2, 11);
        lobby.roll_dice(PlayerId(1)).unwrap();

        let out = lobby.spin_wheel(PlayerId(1)).unwrap();
        assert!(matches!(
            out.broadcasts().next(),
            Some(ServerMessage::WheelSpinning { .. })
        ));
        assert_eq!(
            out.effects,
            vec![Effect::Arm(Timer::SpinSettle, lobby.config().spin_settle)]
        );
        assert_eq!(
            lobby.spin_wheel(PlayerId(1)).unwrap_err(),
            ActionError::SpinInProgress
        );
    }

    #[test]
    fn test_settle_spin_resolves_selection_and_opens_play() {
        let mut lobby = playing_lobby(2, 11);
        lobby.roll_dice(PlayerId(1)).unwrap();
        lobby.spin_wheel(PlayerId(1)).unwrap();

        let out = lobby.settle_spin();
        assert_eq!(lobby.phase(), Phase::Play);
        let selection = lobby.selection().unwrap();
        assert_eq!(Some(selection.ring()), lobby.ring());
        assert!(out.broadcasts().any(|m| matches!(m, ServerMessage::WheelResolved { .. })));
    }

    #[test]
    fn test_settle_spin_repeat_stays_in_await_spin() {
        let mut lobby = playing_lobby(2, 11);
        lobby.phase = Phase::AwaitSpin;
        lobby.ring = Some(Ring::Outer);
        // 100° lands in sector 2 on the default wheel.
        lobby.used_outer.record(Section::Health);
        lobby.pending_spin = Some(360 * 5 + 100);

        let out = lobby.settle_spin();
        assert_eq!(lobby.phase(), Phase::AwaitSpin);
        assert!(lobby.selection().is_none());
        assert!(lobby.pending_spin.is_none());
        assert!(out.broadcasts().any(|m| matches!(
            m,
            ServerMessage::SelectionRepeated { display_name: name } if name == Section::Health.display_name()
        )));
        // A fresh spin is allowed again.
        lobby.spin_wheel(PlayerId(1)).unwrap();
    }

    #[test]
    fn test_settle_spin_without_pending_is_noop() {
        let mut lobby = playing_lobby(2, 11);
        assert!(lobby.settle_spin().is_empty());
    }

    // =====================================================================
    // Play phase
    // =====================================================================

    #[test]
    fn test_play_card_moves_card_to_table() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        let card_id = lobby.players[1].hand[0].id;

        let out = lobby.play_card(PlayerId(2), card_id).unwrap();
        assert_eq!(lobby.players[1].hand.len(), 10);
        assert_eq!(lobby.played().len(), 1);
        assert_eq!(lobby.played()[0].owner, PlayerId(2));
        assert_eq!(out.sent_to(PlayerId(2)).count(), 1);
    }

    #[test]
    fn test_play_card_unknown_card_returns_error() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        assert_eq!(
            lobby.play_card(PlayerId(1), 9999).unwrap_err(),
            ActionError::CardNotInHand(9999)
        );
    }

    #[test]
    fn test_play_card_blocked_returns_error() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        lobby.players[0].blocked = true;
        let card_id = lobby.players[0].hand[0].id;
        assert_eq!(lobby.play_card(PlayerId(1), card_id).unwrap_err(), ActionError::Blocked);
    }

    #[test]
    fn test_play_card_last_card_sets_obligation() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        lobby.players[0].hand = vec![Card::wildcard(69, "w".into())];

        let out = lobby.play_card(PlayerId(1), 69).unwrap();
        assert_eq!(lobby.obligation(), Some(PlayerId(1)));
        assert!(out.broadcasts().any(|m| matches!(m, ServerMessage::PlayerEmptiedHand { .. })));
    }

    #[test]
    fn test_play_card_outside_play_returns_wrong_phase() {
        let mut lobby = playing_lobby(2, 4);
        let card_id = lobby.players[0].hand[0].id;
        assert_eq!(
            lobby.play_card(PlayerId(1), card_id).unwrap_err(),
            ActionError::WrongPhase(Phase::AwaitRoll)
        );
    }

    #[test]
    fn test_draw_card_once_per_cycle() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        let deck = lobby.deck_len();

        lobby.draw_card(PlayerId(2)).unwrap();
        assert_eq!(lobby.deck_len(), deck - 1);
        assert_eq!(lobby.players[1].hand.len(), 12);
        assert_eq!(lobby.draw_card(PlayerId(2)).unwrap_err(), ActionError::AlreadyDrawn);
    }

    #[test]
    fn test_draw_card_empty_deck_is_noop() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        lobby.deck.clear();

        let out = lobby.draw_card(PlayerId(1)).unwrap();
        assert!(out.is_empty());
        assert!(!lobby.players[0].has_drawn);
        assert_eq!(lobby.players[0].hand.len(), 11);
    }

    #[test]
    fn test_skip_turn_all_skipped_advances_and_returns_cards() {
        let mut lobby = playing_lobby(2, 4);
        open_play(&mut lobby, WheelSelection::Inner { number: 5 });
        let card_id = lobby.players[1].hand[0].id;
        lobby.play_card(PlayerId(2), card_id).unwrap();

        lobby.skip_turn(PlayerId(1)).unwrap();
        assert_eq!(lobby.skip_turn(PlayerId(1)).unwrap_err(), ActionError::AlreadySkipped);
        let out = lobby.skip_turn(PlayerId(2)).unwrap();

        assert!(out.broadcasts().any(|m| matches!(m, ServerMessage::AllSkipped)));
        assert_eq!(lobby.turn_index(), 1);
        assert_eq!(lobby.phase(), Phase::AwaitRoll);
        assert!(lobby.played().is_empty());
        assert_eq!(lobby.players[1].hand.len(), 11);
        assert!(lobby.selection().is_none());
    }

    // =====================================================================
    // Next turn
    // =====================================================================

    #[test]
    fn test_next_turn_cycles_through_every_seat() {
        let mut lobby = playing_lobby(4, 9);
        let mut seen = Vec::new();
        for _ in 0..4 {
            let mut out = Outbox::new();
            lobby.next_turn(&mut out);
            assert!(lobby.turn_index() < lobby.len());
            seen.push(lobby.turn_index());
        }
        assert_eq!(seen, vec![1, 2, 3, 0]);
        assert_eq!(lobby.lifecycle(), Lifecycle::Playing);
    }

    #[test]
    fn test_next_turn_lifts_blocks() {
        let mut lobby = playing_lobby(3, 9);
        lobby.players[2].blocked = true;
        let mut out = Outbox::new();
        lobby.next_turn(&mut out);

        assert!(lobby.players.iter().all(|p| !p.blocked));
        assert!(out.broadcasts().any(|m| matches!(
            m,
            ServerMessage::PlayersUnblocked { names, .. } if names == &vec!["P3".to_string()]
        )));
    }
}
