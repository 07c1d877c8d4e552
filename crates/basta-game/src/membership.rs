//! Players leaving a lobby, by choice or by dropping off.

use basta_protocol::{EndReason, Lifecycle, Phase, PlayerId, ServerMessage};

use crate::{ActionError, Lobby, Outbox, Timer};

/// Why a player is leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Backed out of the lobby before a game started.
    Cancelled,
    /// Left from the game screen and goes back to the lobby browser.
    Left,
    /// The connection went away.
    Disconnected,
}

impl Lobby {
    /// Removes a player.
    ///
    /// During a game the turn order is repaired so the next player is still
    /// well defined, and the game ends by forfeit when only one player is
    /// left. Otherwise the roster is updated and a countdown that no longer
    /// has everyone ready is cancelled.
    pub fn remove_player(
        &mut self,
        id: PlayerId,
        departure: Departure,
    ) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        let mut out = Outbox::new();
        let player = self.players.remove(idx);
        tracing::info!(lobby = %self.id, player = %id, ?departure, "player removed");

        if self.lifecycle == Lifecycle::Playing {
            out.broadcast(ServerMessage::PlayerLeft {
                player_id: id,
                player_name: player.name.clone(),
            });
            if self.obligation == Some(id) {
                self.obligation = None;
            }

            match self.players.len() {
                0 => {
                    self.lifecycle = Lifecycle::Ended;
                    self.clear_turn_fields();
                    self.deck.clear();
                    self.played.clear();
                }
                1 => {
                    let winner = self.players[0].id;
                    self.end_game(winner, EndReason::Forfeit, &mut out);
                }
                len => {
                    if idx < self.turn_index {
                        self.turn_index -= 1;
                    } else if idx == self.turn_index {
                        self.repair_vacated_turn(idx, len, &mut out);
                    }
                    if self.turn_index >= len {
                        self.turn_index = 0;
                    }
                    if self.phase == Phase::Play && self.players.iter().all(|p| p.has_skipped) {
                        out.broadcast(ServerMessage::AllSkipped);
                        self.next_turn(&mut out);
                    } else {
                        self.broadcast_state(&mut out);
                    }
                }
            }
        } else {
            if self.lifecycle == Lifecycle::Countdown && !self.all_ready() {
                self.cancel_countdown(&mut out);
            }
            let message = if self.players.is_empty() {
                "Waiting for players...".to_string()
            } else {
                format!("{} left", player.name)
            };
            self.broadcast_roster(&mut out, message);
        }

        if departure == Departure::Left {
            out.send(id, ServerMessage::ReturnedToLobby);
        }
        Ok(out)
    }

    /// The player holding the turn left; `idx` now points at the next seat.
    ///
    /// Before the roll that seat simply inherits the turn. A half-finished
    /// roll or spin is thrown away so the seat rolls from scratch. Once cards
    /// are on the table the index steps back one seat, so the advance that
    /// closes the play or verification lands on the inheriting seat.
    fn repair_vacated_turn(&mut self, idx: usize, len: usize, out: &mut Outbox) {
        match self.phase {
            Phase::AwaitRoll => {}
            Phase::AwaitSpin => {
                self.clear_turn_fields();
                out.cancel(Timer::SpinSettle);
            }
            Phase::Play | Phase::Verifying => {
                self.turn_index = (idx + len - 1) % len;
            }
        }
    }
}
