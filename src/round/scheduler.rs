//! Virtual-clock timer queue
//!
//! Timers fire in `(due time, insertion order)` order, one at a time, so
//! callbacks scheduled for the same instant never interleave. Every timer
//! belongs to a [`CancelToken`] group that can be dropped as a whole.

use std::collections::BTreeMap;

/// Handle for a group of timers (one per round)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelToken(u64);

/// Pending timers keyed by `(due_ms, seq)`
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    next_token: u64,
    pending: BTreeMap<(u64, u64), (CancelToken, T)>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            next_token: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Allocate a fresh cancellation group
    pub fn token(&mut self) -> CancelToken {
        let token = CancelToken(self.next_token);
        self.next_token += 1;
        token
    }

    /// Fire `payload` `delay_ms` from now
    pub fn schedule(&mut self, token: CancelToken, delay_ms: u64, payload: T) {
        let due = self.now_ms.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((due, seq), (token, payload));
    }

    /// Drop every pending timer in the group; returns how many were dropped
    pub fn cancel(&mut self, token: CancelToken) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, (t, _)| *t != token);
        before - self.pending.len()
    }

    /// Due time of the earliest pending timer
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(due, _)| due)
    }

    /// Remove the earliest timer if it is due by `until_ms`, moving the clock to it
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(CancelToken, T)> {
        let entry = self.pending.first_entry()?;
        let (due, _) = *entry.key();
        if due > until_ms {
            return None;
        }
        self.now_ms = self.now_ms.max(due);
        Some(entry.remove())
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
