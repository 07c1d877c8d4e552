//! The per-lobby game state and its lifecycle operations.
//!
//! A `Lobby` is plain data plus synchronous rule handlers. Every handler
//! either rejects the action with an [`ActionError`] and leaves the state
//! untouched, or applies it completely and returns an [`Outbox`] of messages
//! and timer effects. Turn play, verification and membership changes live
//! in sibling modules as further `impl Lobby` blocks.

use basta_protocol::{
    ClientMessage, EndReason, GameStateView, Lifecycle, LobbyId, Phase, PlayerId, Ring,
    RosterEntry, Section, ServerMessage, WheelSelection,
};
use rand::rngs::StdRng;

use crate::wheel::{INNER_SECTORS, OUTER_SECTORS};
use crate::{ActionError, Card, Catalog, GameConfig, Goal, Outbox, Player, Timer, UsageCycle};

/// Longest chat message relayed, in characters.
pub const MAX_CHAT_CHARS: usize = 200;

/// A card on the table waiting for verification.
#[derive(Debug, Clone)]
pub struct PlayedCard {
    pub owner: PlayerId,
    pub card: Card,
}

/// One independent game instance.
#[derive(Debug)]
pub struct Lobby {
    pub(crate) id: LobbyId,
    pub(crate) config: GameConfig,
    pub(crate) catalog: Catalog,
    pub(crate) rng: StdRng,

    /// Seating order, which is also turn order.
    pub(crate) players: Vec<Player>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) countdown_remaining: u32,

    pub(crate) turn_index: usize,
    pub(crate) phase: Phase,
    pub(crate) dice_value: Option<u8>,
    pub(crate) ring: Option<Ring>,
    pub(crate) selection: Option<WheelSelection>,
    /// Rotation broadcast by `spin_wheel`, resolved by `settle_spin`.
    pub(crate) pending_spin: Option<u32>,

    pub(crate) deck: Vec<Card>,
    pub(crate) played: Vec<PlayedCard>,
    pub(crate) discard_count: usize,

    pub(crate) used_outer: UsageCycle<Section>,
    pub(crate) used_inner: UsageCycle<Goal>,

    /// Player whose hand emptied and who must ring the bell to win.
    pub(crate) obligation: Option<PlayerId>,
    pub(crate) bell_ringer: Option<PlayerId>,
    /// Bumped whenever a verification window opens or closes. A fallback
    /// timer only advances the turn if its epoch is still current.
    pub(crate) verify_epoch: u64,
}

impl Lobby {
    pub fn new(id: LobbyId, config: GameConfig, rng: StdRng) -> Self {
        Self::with_catalog(id, config, Catalog::standard(), rng)
    }

    pub fn with_catalog(id: LobbyId, config: GameConfig, catalog: Catalog, rng: StdRng) -> Self {
        Self {
            id,
            config,
            catalog,
            rng,
            players: Vec::new(),
            lifecycle: Lifecycle::Waiting,
            countdown_remaining: 0,
            turn_index: 0,
            phase: Phase::AwaitRoll,
            dice_value: None,
            ring: None,
            selection: None,
            pending_spin: None,
            deck: Vec::new(),
            played: Vec::new(),
            discard_count: 0,
            used_outer: UsageCycle::new(OUTER_SECTORS),
            used_inner: UsageCycle::new(INNER_SECTORS),
            obligation: None,
            bell_ringer: None,
            verify_epoch: 0,
        }
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// The player whose turn it is, while a game is running.
    pub fn current_player(&self) -> Option<&Player> {
        match self.lifecycle {
            Lifecycle::Playing => self.players.get(self.turn_index),
            _ => None,
        }
    }

    pub fn dice_value(&self) -> Option<u8> {
        self.dice_value
    }

    pub fn ring(&self) -> Option<Ring> {
        self.ring
    }

    pub fn selection(&self) -> Option<WheelSelection> {
        self.selection
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn played(&self) -> &[PlayedCard] {
        &self.played
    }

    pub fn discard_count(&self) -> usize {
        self.discard_count
    }

    pub fn obligation(&self) -> Option<PlayerId> {
        self.obligation
    }

    pub fn bell_ringer(&self) -> Option<PlayerId> {
        self.bell_ringer
    }

    pub fn verify_epoch(&self) -> u64 {
        self.verify_epoch
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    pub fn is_joinable(&self) -> bool {
        self.lifecycle == Lifecycle::Waiting && self.players.len() < self.config.max_players
    }

    /// Every seated player is ready and the seat count allows a game.
    pub fn all_ready(&self) -> bool {
        let n = self.players.len();
        n >= self.config.min_players
            && n <= self.config.max_players
            && self.players.iter().all(|p| p.ready)
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.players.iter().map(Player::roster_entry).collect()
    }

    /// Public state broadcast as `GameState`.
    pub fn snapshot(&self) -> GameStateView {
        let playing = self.lifecycle == Lifecycle::Playing;
        GameStateView {
            lifecycle: self.lifecycle,
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(i, p)| p.summary(playing && i == self.turn_index))
                .collect(),
            turn_index: self.turn_index,
            phase: self.phase,
            dice_value: self.dice_value,
            ring: self.ring,
            selection: self.selection,
            deck_count: self.deck.len(),
            discard_count: self.discard_count,
        }
    }

    // =====================================================================
    // Dispatch
    // =====================================================================

    /// Applies an in-lobby action from `sender`.
    ///
    /// Membership messages (`Join`, `CancelJoin`, `LeaveGame`) and
    /// `Heartbeat` belong to the registry and connection layers and are
    /// rejected here.
    pub fn handle(&mut self, sender: PlayerId, msg: ClientMessage) -> Result<Outbox, ActionError> {
        self.index_of(sender)?;
        match msg {
            ClientMessage::Ready => self.set_ready(sender, true),
            ClientMessage::Unready => self.set_ready(sender, false),
            ClientMessage::Chat { text } => self.chat(sender, &text),
            ClientMessage::RequestHand => self.request_hand(sender),
            ClientMessage::RollDice => self.roll_dice(sender),
            ClientMessage::SpinWheel => self.spin_wheel(sender),
            ClientMessage::PlayCard { card_id } => self.play_card(sender, card_id),
            ClientMessage::DrawCard => self.draw_card(sender),
            ClientMessage::SkipTurn => self.skip_turn(sender),
            ClientMessage::RingBell => self.ring_bell(sender),
            ClientMessage::VerifyAcknowledged => self.acknowledge_verification(sender),
            ClientMessage::Join { .. }
            | ClientMessage::CancelJoin
            | ClientMessage::LeaveGame
            | ClientMessage::Heartbeat { .. } => Err(ActionError::NotAnAction),
        }
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    /// Seats a new player. Only open lobbies accept players.
    pub fn join(&mut self, id: PlayerId, name: &str) -> Result<Outbox, ActionError> {
        if self.contains(id) {
            return Err(ActionError::AlreadyJoined(id));
        }
        if self.lifecycle != Lifecycle::Waiting {
            return Err(ActionError::NotJoinable);
        }
        if self.players.len() >= self.config.max_players {
            return Err(ActionError::LobbyFull);
        }

        let player = Player::new(id, name);
        tracing::info!(lobby = %self.id, player = %id, name = %player.name, "player joined");
        let message = format!("{} joined", player.name);
        self.players.push(player);

        let mut out = Outbox::new();
        self.broadcast_roster(&mut out, message);
        Ok(out)
    }

    /// Marks a player ready or not. Starts the countdown once everyone is
    /// ready and cancels it when someone backs out.
    pub fn set_ready(&mut self, id: PlayerId, ready: bool) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        if self.lifecycle == Lifecycle::Playing {
            return Err(ActionError::WrongLifecycle(self.lifecycle));
        }
        if self.lifecycle == Lifecycle::Ended {
            // Rematch: the finished lobby opens up again.
            self.lifecycle = Lifecycle::Waiting;
        }

        self.players[idx].ready = ready;
        let name = self.players[idx].name.clone();
        let mut out = Outbox::new();

        if ready && self.lifecycle == Lifecycle::Waiting && self.all_ready() {
            self.broadcast_roster(&mut out, "All players ready".to_string());
            self.start_countdown(&mut out);
        } else if !ready && self.lifecycle == Lifecycle::Countdown {
            self.cancel_countdown(&mut out);
            self.broadcast_roster(&mut out, format!("{name} is not ready"));
        } else {
            let message = if ready {
                format!("{name} is ready")
            } else {
                format!("{name} is not ready")
            };
            self.broadcast_roster(&mut out, message);
        }
        Ok(out)
    }

    /// One second of the countdown has passed.
    ///
    /// Stale ticks (after a cancel) produce nothing.
    pub fn countdown_tick(&mut self) -> Outbox {
        let mut out = Outbox::new();
        if self.lifecycle != Lifecycle::Countdown {
            return out;
        }
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        out.broadcast(ServerMessage::CountdownTick {
            seconds_remaining: self.countdown_remaining,
        });
        if self.countdown_remaining == 0 {
            self.start_game(&mut out);
        } else {
            out.arm(Timer::CountdownTick, GameConfig::COUNTDOWN_TICK);
        }
        out
    }

    fn start_countdown(&mut self, out: &mut Outbox) {
        self.lifecycle = Lifecycle::Countdown;
        self.countdown_remaining = self.config.countdown_seconds;
        tracing::debug!(lobby = %self.id, seconds = self.countdown_remaining, "countdown started");
        out.broadcast(ServerMessage::CountdownTick {
            seconds_remaining: self.countdown_remaining,
        });
        if self.countdown_remaining == 0 {
            self.start_game(out);
        } else {
            out.arm(Timer::CountdownTick, GameConfig::COUNTDOWN_TICK);
        }
    }

    pub(crate) fn cancel_countdown(&mut self, out: &mut Outbox) {
        tracing::debug!(lobby = %self.id, "countdown cancelled");
        self.lifecycle = Lifecycle::Waiting;
        self.countdown_remaining = 0;
        out.cancel(Timer::CountdownTick);
        out.broadcast(ServerMessage::CountdownCancelled);
    }

    /// Shuffles, deals and opens the first turn.
    pub(crate) fn start_game(&mut self, out: &mut Outbox) {
        if self.players.len() < self.config.min_players {
            self.lifecycle = Lifecycle::Waiting;
            self.broadcast_roster(out, "Not enough players to start".to_string());
            return;
        }

        self.deck = self.catalog.shuffled_deck(&mut self.rng);
        for player in &mut self.players {
            let at = self.deck.len().saturating_sub(self.config.initial_hand);
            player.hand = self.deck.split_off(at);
            player.blocked = false;
            player.reset_cycle_flags();
        }

        self.lifecycle = Lifecycle::Playing;
        self.clear_turn_fields();
        self.turn_index = 0;
        self.played.clear();
        self.discard_count = 0;
        self.used_outer.clear();
        self.used_inner.clear();
        self.obligation = None;

        tracing::info!(
            lobby = %self.id,
            players = self.players.len(),
            deck = self.deck.len(),
            "game started"
        );

        out.broadcast(ServerMessage::GameStarted);
        for player in &self.players {
            out.send(
                player.id,
                ServerMessage::HandUpdate {
                    cards: player.hand_view(),
                },
            );
        }
        self.broadcast_state(out);
    }

    /// Ends the running game. A lobby that is not playing is left alone, so
    /// a game ends at most once.
    pub(crate) fn end_game(&mut self, winner: PlayerId, reason: EndReason, out: &mut Outbox) {
        if self.lifecycle != Lifecycle::Playing {
            return;
        }
        let winner_name = self
            .player(winner)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        tracing::info!(lobby = %self.id, winner = %winner, ?reason, "game ended");

        out.broadcast(ServerMessage::GameEnded {
            winner_id: winner,
            winner_name,
            reason,
        });
        out.cancel(Timer::SpinSettle);
        out.cancel(Timer::VerifyFallback(self.verify_epoch));

        self.lifecycle = Lifecycle::Ended;
        self.clear_turn_fields();
        self.turn_index = 0;
        self.deck.clear();
        self.played.clear();
        self.discard_count = 0;
        self.obligation = None;
        self.verify_epoch += 1;
        for player in &mut self.players {
            player.reset_for_lobby();
        }
    }

    /// Relays a chat line to the whole lobby. Blank lines are dropped.
    pub fn chat(&mut self, id: PlayerId, text: &str) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        let mut out = Outbox::new();
        let text: String = text.trim().chars().take(MAX_CHAT_CHARS).collect();
        if text.is_empty() {
            return Ok(out);
        }
        out.broadcast(ServerMessage::Chat {
            player_name: self.players[idx].name.clone(),
            text,
        });
        Ok(out)
    }

    /// Re-sends the caller's hand.
    pub fn request_hand(&mut self, id: PlayerId) -> Result<Outbox, ActionError> {
        let idx = self.index_of(id)?;
        let mut out = Outbox::new();
        self.send_hand(idx, &mut out);
        Ok(out)
    }

    // =====================================================================
    // Shared helpers
    // =====================================================================

    pub(crate) fn index_of(&self, id: PlayerId) -> Result<usize, ActionError> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(ActionError::NotInLobby(id))
    }

    pub(crate) fn require_playing(&self) -> Result<(), ActionError> {
        match self.lifecycle {
            Lifecycle::Playing => Ok(()),
            other => Err(ActionError::WrongLifecycle(other)),
        }
    }

    pub(crate) fn require_phase(&self, phase: Phase) -> Result<(), ActionError> {
        self.require_playing()?;
        if self.phase != phase {
            return Err(ActionError::WrongPhase(self.phase));
        }
        Ok(())
    }

    pub(crate) fn require_turn(&self, idx: usize) -> Result<(), ActionError> {
        if idx != self.turn_index {
            return Err(ActionError::NotYourTurn);
        }
        Ok(())
    }

    /// Moves up to `n` cards from the deck tail into a hand. Returns how many
    /// were dealt.
    pub(crate) fn deal(&mut self, idx: usize, n: usize) -> usize {
        let at = self.deck.len().saturating_sub(n);
        let cards = self.deck.split_off(at);
        let dealt = cards.len();
        self.players[idx].hand.extend(cards);
        dealt
    }

    /// Resets dice, wheel and pending-spin state to the start of a turn.
    pub(crate) fn clear_turn_fields(&mut self) {
        self.phase = Phase::AwaitRoll;
        self.dice_value = None;
        self.ring = None;
        self.selection = None;
        self.pending_spin = None;
        self.bell_ringer = None;
    }

    pub(crate) fn send_hand(&self, idx: usize, out: &mut Outbox) {
        let player = &self.players[idx];
        out.send(
            player.id,
            ServerMessage::HandUpdate {
                cards: player.hand_view(),
            },
        );
    }

    pub(crate) fn broadcast_state(&self, out: &mut Outbox) {
        out.broadcast(ServerMessage::GameState(self.snapshot()));
    }

    pub(crate) fn broadcast_roster(&self, out: &mut Outbox, message: String) {
        out.broadcast(ServerMessage::RosterUpdate {
            players: self.roster(),
            message,
        });
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;

    use super::*;

    /// A lobby with `n` seated players (ids 1..=n) and a game in progress.
    pub(crate) fn playing_lobby(n: u64, seed: u64) -> Lobby {
        let mut lobby = Lobby::new(LobbyId(1), GameConfig::default(), StdRng::seed_from_u64(seed));
        for id in 1..=n {
            lobby.join(PlayerId(id), &format!("P{id}")).unwrap();
        }
        let mut out = Outbox::new();
        lobby.start_game(&mut out);
        lobby
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;

    use super::test_support::playing_lobby;
    use super::*;
    use crate::Effect;
    use crate::catalog::CATALOG_SIZE;

    fn lobby() -> Lobby {
        Lobby::new(LobbyId(1), GameConfig::default(), StdRng::seed_from_u64(7))
    }

    // =====================================================================
    // Join
    // =====================================================================

    #[test]
    fn test_join_broadcasts_roster() {
        let mut lobby = lobby();
        let out = lobby.join(PlayerId(1), "  Ana ").unwrap();

        assert_eq!(lobby.len(), 1);
        assert_eq!(lobby.players()[0].name, "Ana");
        match out.broadcasts().next() {
            Some(ServerMessage::RosterUpdate { players, message }) => {
                assert_eq!(players.len(), 1);
                assert_eq!(message, "Ana joined");
            }
            other => panic!("expected RosterUpdate, got {other:?}"),
        }
    }

    #[test]
    fn test_join_full_lobby_returns_error() {
        let mut lobby = lobby();
        for id in 1..=4 {
            lobby.join(PlayerId(id), "p").unwrap();
        }
        assert_eq!(lobby.join(PlayerId(5), "p").unwrap_err(), ActionError::LobbyFull);
        assert!(!lobby.is_joinable());
    }

    #[test]
    fn test_join_twice_returns_error() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        assert_eq!(
            lobby.join(PlayerId(1), "a").unwrap_err(),
            ActionError::AlreadyJoined(PlayerId(1))
        );
    }

    #[test]
    fn test_join_during_game_returns_not_joinable() {
        let mut lobby = playing_lobby(2, 1);
        assert_eq!(lobby.join(PlayerId(9), "late").unwrap_err(), ActionError::NotJoinable);
    }

    // =====================================================================
    // Ready and countdown
    // =====================================================================

    #[test]
    fn test_set_ready_all_ready_starts_countdown() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        lobby.join(PlayerId(2), "b").unwrap();

        let out = lobby.set_ready(PlayerId(1), true).unwrap();
        assert_eq!(lobby.lifecycle(), Lifecycle::Waiting);
        assert!(out.effects.is_empty());

        let out = lobby.set_ready(PlayerId(2), true).unwrap();
        assert_eq!(lobby.lifecycle(), Lifecycle::Countdown);
        assert!(out.broadcasts().any(|m| matches!(
            m,
            ServerMessage::CountdownTick { seconds_remaining: 3 }
        )));
        assert_eq!(
            out.effects,
            vec![Effect::Arm(Timer::CountdownTick, GameConfig::COUNTDOWN_TICK)]
        );
    }

    #[test]
    fn test_set_ready_single_player_does_not_start() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        lobby.set_ready(PlayerId(1), true).unwrap();
        assert_eq!(lobby.lifecycle(), Lifecycle::Waiting);
    }

    #[test]
    fn test_set_ready_false_during_countdown_cancels() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        lobby.join(PlayerId(2), "b").unwrap();
        lobby.set_ready(PlayerId(1), true).unwrap();
        lobby.set_ready(PlayerId(2), true).unwrap();

        let out = lobby.set_ready(PlayerId(2), false).unwrap();
        assert_eq!(lobby.lifecycle(), Lifecycle::Waiting);
        assert!(out.effects.contains(&Effect::Cancel(Timer::CountdownTick)));
        assert!(out.broadcasts().any(|m| matches!(m, ServerMessage::CountdownCancelled)));
    }

    #[test]
    fn test_set_ready_during_game_returns_error() {
        let mut lobby = playing_lobby(2, 1);
        assert_eq!(
            lobby.set_ready(PlayerId(1), true).unwrap_err(),
            ActionError::WrongLifecycle(Lifecycle::Playing)
        );
    }

    #[test]
    fn test_countdown_tick_counts_down_then_starts() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        lobby.join(PlayerId(2), "b").unwrap();
        lobby.set_ready(PlayerId(1), true).unwrap();
        lobby.set_ready(PlayerId(2), true).unwrap();

        let out = lobby.countdown_tick();
        assert_eq!(lobby.countdown_remaining(), 2);
        assert!(!out.effects.is_empty());
        lobby.countdown_tick();
        let out = lobby.countdown_tick();

        assert_eq!(lobby.lifecycle(), Lifecycle::Playing);
        assert!(out.broadcasts().any(|m| matches!(m, ServerMessage::GameStarted)));
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_countdown_tick_after_cancel_is_noop() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        assert!(lobby.countdown_tick().is_empty());
    }

    // =====================================================================
    // Start and end
    // =====================================================================

    #[test]
    fn test_start_game_deals_initial_hands_from_shuffled_catalog() {
        for n in 2..=4u64 {
            let lobby = playing_lobby(n, n);
            assert_eq!(lobby.deck_len(), CATALOG_SIZE - 11 * n as usize);

            let mut ids = HashSet::new();
            for player in lobby.players() {
                assert_eq!(player.hand.len(), 11);
                for card in &player.hand {
                    assert!(ids.insert(card.id), "duplicate card {}", card.id);
                }
            }
            for card in &lobby.deck {
                assert!(ids.insert(card.id), "duplicate card {}", card.id);
            }
            assert_eq!(ids.len(), CATALOG_SIZE);
        }
    }

    #[test]
    fn test_start_game_sends_each_player_their_hand() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        lobby.join(PlayerId(2), "b").unwrap();
        let mut out = Outbox::new();
        lobby.start_game(&mut out);

        assert_eq!(lobby.phase(), Phase::AwaitRoll);
        assert_eq!(lobby.turn_index(), 0);
        for id in [PlayerId(1), PlayerId(2)] {
            let hands: Vec<_> = out.sent_to(id).collect();
            assert_eq!(hands.len(), 1);
        }
    }

    #[test]
    fn test_start_game_not_enough_players_returns_to_waiting() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        let mut out = Outbox::new();
        lobby.start_game(&mut out);
        assert_eq!(lobby.lifecycle(), Lifecycle::Waiting);
        assert_eq!(lobby.deck_len(), 0);
    }

    #[test]
    fn test_end_game_clears_game_fields_once() {
        let mut lobby = playing_lobby(2, 3);
        let mut out = Outbox::new();
        lobby.end_game(PlayerId(2), EndReason::Basta, &mut out);

        assert_eq!(lobby.lifecycle(), Lifecycle::Ended);
        assert_eq!(lobby.deck_len(), 0);
        assert!(lobby.players().iter().all(|p| p.hand.is_empty() && !p.ready));

        let mut again = Outbox::new();
        lobby.end_game(PlayerId(2), EndReason::Basta, &mut again);
        assert!(again.is_empty());
        assert_eq!(
            out.broadcasts()
                .filter(|m| matches!(m, ServerMessage::GameEnded { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_set_ready_after_end_allows_rematch() {
        let mut lobby = playing_lobby(2, 3);
        let mut out = Outbox::new();
        lobby.end_game(PlayerId(1), EndReason::Basta, &mut out);

        lobby.set_ready(PlayerId(1), true).unwrap();
        assert_eq!(lobby.lifecycle(), Lifecycle::Waiting);
        lobby.set_ready(PlayerId(2), true).unwrap();
        assert_eq!(lobby.lifecycle(), Lifecycle::Countdown);
    }

    // =====================================================================
    // Chat, hand and dispatch
    // =====================================================================

    #[test]
    fn test_chat_truncates_long_text() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        let out = lobby.chat(PlayerId(1), &"x".repeat(500)).unwrap();
        match out.broadcasts().next() {
            Some(ServerMessage::Chat { text, player_name }) => {
                assert_eq!(text.chars().count(), MAX_CHAT_CHARS);
                assert_eq!(player_name, "a");
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_blank_is_dropped() {
        let mut lobby = lobby();
        lobby.join(PlayerId(1), "a").unwrap();
        assert!(lobby.chat(PlayerId(1), "   ").unwrap().is_empty());
    }

    #[test]
    fn test_request_hand_sends_only_to_caller() {
        let mut lobby = playing_lobby(2, 5);
        let out = lobby.request_hand(PlayerId(2)).unwrap();
        assert_eq!(out.sent_to(PlayerId(2)).count(), 1);
        assert_eq!(out.sent_to(PlayerId(1)).count(), 0);
    }

    #[test]
    fn test_handle_stranger_returns_not_in_lobby() {
        let mut lobby = playing_lobby(2, 1);
        assert_eq!(
            lobby.handle(PlayerId(42), ClientMessage::RollDice).unwrap_err(),
            ActionError::NotInLobby(PlayerId(42))
        );
    }

    #[test]
    fn test_handle_membership_message_returns_not_an_action() {
        let mut lobby = playing_lobby(2, 1);
        assert_eq!(
            lobby.handle(PlayerId(1), ClientMessage::LeaveGame).unwrap_err(),
            ActionError::NotAnAction
        );
    }

    #[test]
    fn test_snapshot_marks_active_player() {
        let lobby = playing_lobby(3, 2);
        let view = lobby.snapshot();
        let active: Vec<_> = view.players.iter().filter(|p| p.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, PlayerId(1));
        assert_eq!(view.deck_count, CATALOG_SIZE - 33);
    }
}
