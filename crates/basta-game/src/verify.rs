//! Bell ringing: verification of played cards, penalties, the win check,
//! and the acknowledgement/timeout race that closes the verification window.

use basta_protocol::{
    EndReason, Lifecycle, PenaltySummary, Phase, PlayerId, ServerMessage, Verdict,
};
use rand::Rng;

use crate::{ActionError, Lobby, Outbox, PlayedCard, Timer};

/// Cards dealt to an obligation holder who was beaten to the bell.
pub const STALE_BELL_PENALTY: usize = 2;

/// Cards dealt to a player who played at least one invalid card.
pub const INVALID_PLAY_PENALTY: usize = 1;

impl Lobby {
    /// Rings the bell and verifies every card on the table.
    pub fn ring_bell(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        let ringer_idx = self.index_of(id)?;
        self.require_phase(Phase::Play)?;
        let ringer_name = self.players[ringer_idx].name.clone();
        tracing::debug!(lobby = %self.id, player = %id, "bell rang");

        let mut out = Outbox::new();
        self.bell_ringer = Some(id);

        if let Some(holder) = self.obligation {
            if holder != id {
                self.penalize_stale_obligation(holder, &ringer_name, &mut out);
            }
        }

        self.phase = Phase::Verifying;
        self.broadcast_state(&mut out);
        out.broadcast(ServerMessage::BellRang {
            player_id: id,
            player_name: ringer_name,
        });

        // -- Classification and effects --
        let mut verdicts = Vec::new();
        let mut offenders: Vec<usize> = Vec::new();
        let mut ringer_played = false;
        let mut ringer_invalid = false;

        for PlayedCard { owner, card } in std::mem::take(&mut self.played) {
            let Ok(idx) = self.index_of(owner) else {
                tracing::debug!(lobby = %self.id, card = card.id, "dropping card of departed player");
                continue;
            };
            let reason = self.selection.and_then(|selection| card.check(&selection));
            verdicts.push(Verdict {
                card: card.view(),
                player_id: owner,
                player_name: self.players[idx].name.clone(),
                valid: reason.is_none(),
                reason,
            });
            if owner == id {
                ringer_played = true;
                ringer_invalid |= reason.is_some();
            }
            match reason {
                None => self.discard_count += 1,
                Some(_) => {
                    self.players[idx].hand.push(card);
                    if !offenders.contains(&idx) {
                        offenders.push(idx);
                    }
                }
            }
        }

        let mut penalties = Vec::with_capacity(offenders.len());
        for idx in offenders {
            let dealt = self.deal(idx, INVALID_PLAY_PENALTY);
            let player = &mut self.players[idx];
            let blocked = dealt == 0;
            if blocked {
                player.blocked = true;
            }
            penalties.push(PenaltySummary {
                player_id: player.id,
                player_name: player.name.clone(),
                cards_drawn: dealt,
                blocked,
            });
        }

        for idx in 0..self.players.len() {
            self.send_hand(idx, &mut out);
        }
        self.broadcast_state(&mut out);

        let penalty_message = if penalties.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = penalties
                .iter()
                .filter(|p| p.cards_drawn > 0)
                .map(|p| p.player_name.clone())
                .collect();
            let blocked_names: Vec<String> = penalties
                .iter()
                .filter(|p| p.blocked)
                .map(|p| p.player_name.clone())
                .collect();
            let message = penalty_message(&names, &blocked_names, &mut self.rng);
            out.broadcast(ServerMessage::PenaltyAnnouncement {
                names,
                blocked_names,
                message: message.clone(),
            });
            message
        };

        tracing::debug!(
            lobby = %self.id,
            cards = verdicts.len(),
            penalized = penalties.len(),
            "verification complete"
        );
        out.broadcast(ServerMessage::VerifyResult {
            verdicts,
            penalties,
            penalty_message,
            selection: self.selection,
            deck_count: self.deck.len(),
        });

        // -- Win check --
        if self.obligation == Some(id) {
            self.obligation = None;
            let hand_empty = self.players[ringer_idx].hand.is_empty();
            if ringer_played && !ringer_invalid && hand_empty {
                self.end_game(id, EndReason::Basta, &mut out);
                return Ok(out);
            }
            if ringer_invalid {
                out.broadcast(ServerMessage::VictoryFailed {
                    player_name: self.players[ringer_idx].name.clone(),
                });
            }
        }

        self.verify_epoch += 1;
        out.arm(Timer::VerifyFallback(self.verify_epoch), self.config.verify_grace);
        Ok(out)
    }

    /// The obligation holder did not ring first: one of their played cards
    /// comes back and they draw up to two, blocked if the deck ran short.
    fn penalize_stale_obligation(&mut self, holder: PlayerId, ringer_name: &str, out: &mut Outbox) {
        self.obligation = None;
        let Ok(idx) = self.index_of(holder) else {
            return;
        };

        if let Some(pos) = self.played.iter().position(|p| p.owner == holder) {
            let returned = self.played.remove(pos);
            self.players[idx].hand.push(returned.card);
        }
        let dealt = self.deal(idx, STALE_BELL_PENALTY);
        let blocked = dealt < STALE_BELL_PENALTY;
        let player = &mut self.players[idx];
        if blocked {
            player.blocked = true;
        }
        tracing::debug!(
            lobby = %self.id,
            player = %holder,
            dealt,
            blocked,
            "obligation holder beaten to the bell"
        );

        out.broadcast(ServerMessage::BellPenalty {
            penalized: player.name.clone(),
            ringer: ringer_name.to_string(),
            penalty_cards: dealt,
            blocked,
        });
        self.send_hand(idx, out);
    }

    /// The bell ringer finished watching the verification.
    pub fn acknowledge_verification(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        self.index_of(id)?;
        self.require_phase(Phase::Verifying)?;
        if self.bell_ringer != Some(id) {
            return Err(ActionError::NotRinger);
        }

        let mut out = Outbox::new();
        out.cancel(Timer::VerifyFallback(self.verify_epoch));
        self.verify_epoch += 1;
        self.next_turn(&mut out);
        Ok(out)
    }

    /// The acknowledgement window for `epoch` ran out. Does nothing when the
    /// window was already closed by an acknowledgement or a newer bell.
    pub fn verification_timeout(&mut self, epoch: u64) -> Outbox {
        let mut out = Outbox::new();
        if self.lifecycle != Lifecycle::Playing
            || self.phase != Phase::Verifying
            || epoch != self.verify_epoch
        {
            return out;
        }
        tracing::debug!(lobby = %self.id, epoch, "verification window timed out");
        self.verify_epoch += 1;
        self.next_turn(&mut out);
        out
    }
}

/// Builds the announcement for players penalized for invalid cards.
///
/// `names` holds the players who actually drew a penalty card and
/// `blocked_names` those who could not draw because the deck ran out.
pub fn penalty_message<R: Rng + ?Sized>(
    names: &[String],
    blocked_names: &[String],
    rng: &mut R,
) -> String {
    let mut parts = Vec::with_capacity(2);
    if !names.is_empty() {
        let who = join_names(names);
        let (was, takes) = if names.len() > 1 {
            ("were", "take")
        } else {
            ("was", "takes")
        };
        parts.push(match rng.random_range(0..3) {
            0 => format!("{who} {was} penalized for playing a card that doesn't match"),
            1 => format!("{who} tried to sneak a card past the wheel and {takes} a penalty card"),
            _ => format!("{who} misread the wheel and {takes} a penalty card"),
        });
    }
    if !blocked_names.is_empty() {
        parts.push(format!(
            "{} can't play next turn (deck is empty)",
            join_names(blocked_names)
        ));
    }
    parts.join(". ")
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
