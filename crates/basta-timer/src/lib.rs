//! Cancellable per-key deadlines for BASTA lobby actors.
//!
//! A lobby owns a handful of one-shot timers (countdown tick, spin settle,
//! verification fallback). [`Deadlines`] keeps at most one deadline per key
//! and hands back the key of whichever expires first.
//!
//! # Integration
//!
//! The deadline set is designed to sit inside a lobby actor's
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         timer = deadlines.next_expired() => {
//!             let outbox = lobby.on_timer(timer);
//!         }
//!     }
//! }
//! ```
//!
//! With nothing armed, [`Deadlines::next_expired`] pends forever and
//! `select!` only serves the other branches.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// A set of one-shot deadlines keyed by `K`.
///
/// Arming a key that is already armed replaces its deadline. Expired keys
/// are removed as they are returned, so each arm fires at most once.
#[derive(Debug)]
pub struct Deadlines<K> {
    entries: HashMap<K, Instant>,
}

impl<K> Default for Deadlines<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> Deadlines<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires `key` after `after` has elapsed.
    pub fn arm(&mut self, key: K, after: Duration) {
        self.arm_at(key, Instant::now() + after);
    }

    /// Fires `key` at `deadline`.
    pub fn arm_at(&mut self, key: K, deadline: Instant) {
        if self.entries.insert(key, deadline).is_some() {
            trace!(?key, "deadline replaced");
        } else {
            trace!(?key, "deadline armed");
        }
    }

    /// Disarms `key`. Returns whether it was armed.
    pub fn cancel(&mut self, key: K) -> bool {
        let removed = self.entries.remove(&key).is_some();
        if removed {
            trace!(?key, "deadline cancelled");
        }
        removed
    }

    /// Disarms every key matching `pred`. Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pred(key));
        before - self.entries.len()
    }

    pub fn is_armed(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// When `key` will fire, if armed.
    pub fn deadline(&self, key: K) -> Option<Instant> {
        self.entries.get(&key).copied()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(count = self.entries.len(), "clearing deadlines");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The earliest armed deadline and its key.
    pub fn next_deadline(&self) -> Option<(K, Instant)> {
        self.entries
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(key, at)| (*key, *at))
    }

    /// Waits for the earliest deadline, disarms it and returns its key.
    ///
    /// Pends forever while nothing is armed. Cancel-safe: dropping the
    /// future before it completes leaves every deadline in place, so it
    /// can be recreated on each turn of a `select!` loop.
    pub async fn next_expired(&mut self) -> K {
        let Some((key, at)) = self.next_deadline() else {
            return std::future::pending().await;
        };
        time::sleep_until(at).await;
        self.entries.remove(&key);
        trace!(?key, "deadline expired");
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B(u64),
    }

    #[test]
    fn test_arm_replaces_existing_deadline() {
        let mut d = Deadlines::new();
        let now = Instant::now();
        d.arm_at(Key::A, now + Duration::from_secs(5));
        d.arm_at(Key::A, now + Duration::from_secs(1));
        assert_eq!(d.len(), 1);
        assert_eq!(d.deadline(Key::A), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_cancel_where_removes_matching_keys() {
        let mut d = Deadlines::new();
        d.arm(Key::A, Duration::from_secs(1));
        d.arm(Key::B(1), Duration::from_secs(1));
        d.arm(Key::B(2), Duration::from_secs(1));

        let removed = d.cancel_where(|k| matches!(k, Key::B(_)));
        assert_eq!(removed, 2);
        assert!(d.is_armed(Key::A));
        assert!(!d.is_armed(Key::B(1)));
    }

    #[test]
    fn test_next_deadline_picks_earliest() {
        let mut d = Deadlines::new();
        let now = Instant::now();
        d.arm_at(Key::A, now + Duration::from_secs(3));
        d.arm_at(Key::B(7), now + Duration::from_secs(2));
        assert_eq!(
            d.next_deadline(),
            Some((Key::B(7), now + Duration::from_secs(2)))
        );
    }

    #[test]
    fn test_cancel_unarmed_returns_false() {
        let mut d: Deadlines<Key> = Deadlines::new();
        assert!(!d.cancel(Key::A));
        assert!(d.is_empty());
    }
}
