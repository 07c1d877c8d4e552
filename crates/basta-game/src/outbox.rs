//! What a rule handler produces: messages to deliver and timers to arm or
//! cancel. The lobby actor carries both out after the handler returns.

use std::time::Duration;

use basta_protocol::{PlayerId, Recipient, ServerMessage};

/// A lobby-owned timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// One second of the pre-game countdown.
    CountdownTick,
    /// A spin has been broadcast and is waiting to resolve.
    SpinSettle,
    /// Fallback that advances the turn if the bell ringer never
    /// acknowledges. Carries the verification epoch it belongs to.
    VerifyFallback(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Arm(Timer, Duration),
    Cancel(Timer),
}

/// Output of one handler run.
#[derive(Debug, Default)]
pub struct Outbox {
    pub messages: Vec<(Recipient, ServerMessage)>,
    pub effects: Vec<Effect>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&mut self, msg: ServerMessage) {
        self.messages.push((Recipient::All, msg));
    }

    pub fn send(&mut self, player: PlayerId, msg: ServerMessage) {
        self.messages.push((Recipient::Player(player), msg));
    }

    pub fn arm(&mut self, timer: Timer, after: Duration) {
        self.effects.push(Effect::Arm(timer, after));
    }

    pub fn cancel(&mut self, timer: Timer) {
        self.effects.push(Effect::Cancel(timer));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.effects.is_empty()
    }

    /// Messages addressed to everyone, in order. Handy in tests.
    pub fn broadcasts(&self) -> impl Iterator<Item = &ServerMessage> {
        self.messages.iter().filter_map(|(to, msg)| match to {
            Recipient::All => Some(msg),
            Recipient::Player(_) => None,
        })
    }

    /// Messages addressed to one player, in order.
    pub fn sent_to(&self, player: PlayerId) -> impl Iterator<Item = &ServerMessage> {
        self.messages.iter().filter_map(move |(to, msg)| match to {
            Recipient::Player(p) if *p == player => Some(msg),
            _ => None,
        })
    }
}
