//! Session orchestrator
//!
//! Owns the ledger and the round engine, gates every command, and runs single
//! rounds and batches through one code path (a single round is a batch of 1).
//! Time only moves through [`Session::advance`].

use serde::Serialize;

use crate::error::{ConfigError, GameError};
use crate::events::{GameEvent, GameObserver};
use crate::geometry::Side;
use crate::history::RoundHistory;
use crate::ledger::{Ledger, Wager};
use crate::round::{CancelToken, Round, RoundEngine, RoundParams, Scheduler, Step};
use crate::settings::GameConfig;

/// Why a batch ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BatchEnd {
    /// Every requested round ran
    Completed,
    /// `cancel_batch` observed at a round boundary
    Cancelled,
    /// A follow-up round failed the start gates
    StoppedEarly(GameError),
    /// A round could not be resolved
    Aborted(GameError),
}

/// A running sequence of rounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSession {
    pub requested: u32,
    pub completed: u32,
    pub cancel_requested: bool,
}

impl BatchSession {
    pub fn new(requested: u32) -> Self {
        Self {
            requested,
            completed: 0,
            cancel_requested: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.requested.saturating_sub(self.completed)
    }
}

/// Converts fractional frame deltas into whole milliseconds without drift
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    carry_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole milliseconds to advance for this frame; the fraction carries over
    pub fn take(&mut self, elapsed_ms: f64) -> u64 {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return 0;
        }
        let total = self.carry_ms + elapsed_ms;
        let whole = total.floor();
        self.carry_ms = total - whole;
        whole as u64
    }

    /// Fraction of a millisecond still owed
    pub fn carry_ms(&self) -> f64 {
        self.carry_ms
    }
}

/// Session-level timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    /// Pause after a settlement is over; start the next batched round
    NextBatchRound,
}

/// One player's session
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    ledger: Ledger,
    engine: RoundEngine,
    timers: Scheduler<SessionTimer>,
    token: CancelToken,
    batch: Option<BatchSession>,
    betting_locked: bool,
    next_round_index: u64,
    events: Vec<GameEvent>,
}

impl Session {
    /// Create a session; equal seeds and commands replay identically
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut timers = Scheduler::new();
        let token = timers.token();
        log::info!(
            "Session created (seed {}, bankroll {})",
            seed,
            config.starting_bankroll
        );
        Ok(Self {
            ledger: Ledger::new(config.starting_bankroll, config.odds),
            engine: RoundEngine::new(RoundParams::from(&config), seed),
            config,
            timers,
            token,
            batch: None,
            betting_locked: false,
            next_round_index: 0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn bankroll(&self) -> u64 {
        self.ledger.bankroll()
    }

    pub fn wager(&self) -> &Wager {
        self.ledger.wager()
    }

    pub fn history(&self) -> &RoundHistory {
        self.ledger.history()
    }

    pub fn batch(&self) -> Option<&BatchSession> {
        self.batch.as_ref()
    }

    /// The live round, or the last resolved one
    pub fn current_round(&self) -> Option<&Round> {
        self.engine.round()
    }

    pub fn is_betting_locked(&self) -> bool {
        self.betting_locked
    }

    /// A round or batch is in flight
    pub fn is_busy(&self) -> bool {
        self.batch.is_some() || self.engine.is_running()
    }

    /// Out of money with nothing staged
    pub fn is_bankrupt(&self) -> bool {
        self.ledger.is_bankrupt()
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Timers queued across the round engine and the session
    pub fn pending_timers(&self) -> usize {
        self.engine.pending_timers() + self.timers.len()
    }

    // === Commands ===

    /// Start a single round
    pub fn start_round(&mut self) -> Result<(), GameError> {
        self.start_batch(1)
    }

    /// Start `count` rounds back to back using the staged bet each time
    pub fn start_batch(&mut self, count: u32) -> Result<(), GameError> {
        if self.is_busy() {
            return reject(GameError::RoundInProgress);
        }
        if count == 0 || count > self.config.max_batch {
            return reject(GameError::InvalidBatchSize {
                requested: count,
                max: self.config.max_batch,
            });
        }
        if let Err(e) = self.check_start_gates() {
            return reject(e);
        }

        log::info!(
            "Batch of {} started (stake {}, side {:?})",
            count,
            self.ledger.wager().staged,
            self.ledger.wager().side
        );
        self.batch = Some(BatchSession::new(count));
        self.set_betting_locked(true);
        self.begin_round();
        Ok(())
    }

    /// Stop the batch at the next round boundary; returns whether a batch was running
    pub fn cancel_batch(&mut self) -> bool {
        let Some(batch) = self.batch.as_mut() else {
            return false;
        };
        batch.cancel_requested = true;
        log::info!("Batch cancel requested after {} rounds", batch.completed);

        // Between rounds the boundary is now
        if !self.engine.is_running() {
            self.finish_batch(BatchEnd::Cancelled);
        }
        true
    }

    pub fn stage_chip(&mut self, value: u64) -> Result<(), GameError> {
        self.ensure_unlocked()?;
        self.ledger.stage(value).or_else(reject)
    }

    pub fn clear_staged_bet(&mut self) -> Result<(), GameError> {
        self.ensure_unlocked()?;
        self.ledger.clear_staged();
        Ok(())
    }

    /// Toggle the backed side; `None` clears it
    pub fn select_bet_type(&mut self, side: Option<Side>) -> Result<(), GameError> {
        self.ensure_unlocked()?;
        self.ledger.select_side(side);
        Ok(())
    }

    pub fn reset_bankroll(&mut self) -> Result<(), GameError> {
        self.ensure_unlocked()?;
        self.ledger.reset_bankroll();
        log::info!("Bankroll reset to {}", self.ledger.bankroll());
        Ok(())
    }

    // === Clock ===

    /// Move the clock forward, firing every due timer in order
    pub fn advance(&mut self, elapsed_ms: u64) {
        let target = self.now_ms().saturating_add(elapsed_ms);

        loop {
            let round_due = self.engine.next_due_ms().filter(|&due| due <= target);
            let session_due = self.timers.next_due_ms().filter(|&due| due <= target);

            match (round_due, session_due) {
                (None, None) => break,
                (Some(r), Some(s)) if s < r => self.fire_session_timer(target, s),
                (Some(r), _) => {
                    self.timers.advance_to(r);
                    let step = self.engine.step(target, &mut self.events);
                    self.on_round_step(step);
                }
                (None, Some(s)) => self.fire_session_timer(target, s),
            }
        }

        self.engine.advance_clock(target);
        self.timers.advance_to(target);
    }

    /// Advance until no round or batch is in flight
    pub fn run_until_idle(&mut self) {
        while self.is_busy() {
            let next_due = [self.engine.next_due_ms(), self.timers.next_due_ms()]
                .into_iter()
                .flatten()
                .min();
            let Some(due) = next_due else {
                break;
            };
            self.advance(due.saturating_sub(self.now_ms()));
        }
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain events into an observer
    pub fn pump<O: GameObserver + ?Sized>(&mut self, observer: &mut O) {
        for event in self.drain_events() {
            event.dispatch(observer);
        }
    }

    // === Internals ===

    fn ensure_unlocked(&self) -> Result<(), GameError> {
        if self.betting_locked {
            return reject(GameError::BettingLocked);
        }
        Ok(())
    }

    fn check_start_gates(&self) -> Result<(), GameError> {
        let wager = self.ledger.wager();
        if wager.staged > 0 && wager.side.is_none() {
            return Err(GameError::NoBetTypeSelected);
        }
        if !self.ledger.covers_staged() {
            return Err(GameError::InsufficientFunds {
                needed: wager.staged,
                available: self.ledger.bankroll(),
            });
        }
        Ok(())
    }

    fn set_betting_locked(&mut self, locked: bool) {
        if self.betting_locked != locked {
            self.betting_locked = locked;
            log::debug!("Bets {}", if locked { "locked" } else { "open" });
            self.events.push(GameEvent::BettingLocked(locked));
        }
    }

    fn begin_round(&mut self) {
        if let Err(e) = self.ledger.commit() {
            self.finish_batch(BatchEnd::StoppedEarly(e));
            return;
        }
        let index = self.next_round_index;
        self.next_round_index += 1;
        self.engine.start_round(index, &mut self.events);
    }

    fn fire_session_timer(&mut self, target: u64, due: u64) {
        self.engine.advance_clock(due);
        if let Some((_, SessionTimer::NextBatchRound)) = self.timers.pop_due(target) {
            self.on_next_batch_round();
        }
    }

    fn on_round_step(&mut self, step: Step) {
        match step {
            Step::Idle | Step::Progressed => {}
            Step::Resolved {
                round_index,
                outcome,
                ..
            } => {
                let record = self.ledger.settle(round_index, outcome);
                log::info!(
                    "Round {} settled: {:?} stake {} payout {} bankroll {}",
                    round_index,
                    record.result,
                    record.stake,
                    record.payout,
                    record.bankroll_after
                );
                self.events.push(GameEvent::Settlement(record));
                self.after_round();
            }
            Step::Aborted { round_index, error } => {
                let refunded = self.ledger.void_active();
                log::warn!("Round {} aborted, refunded {}", round_index, refunded);
                self.events.push(GameEvent::RoundAborted {
                    round_index,
                    error: error.clone(),
                });
                self.finish_batch(BatchEnd::Aborted(error));
            }
        }
    }

    fn after_round(&mut self) {
        let Some(batch) = self.batch.as_mut() else {
            self.set_betting_locked(false);
            return;
        };
        batch.completed += 1;

        if batch.remaining() == 0 {
            self.finish_batch(BatchEnd::Completed);
        } else if batch.cancel_requested {
            self.finish_batch(BatchEnd::Cancelled);
        } else {
            self.timers.schedule(
                self.token,
                self.config.batch_pause_ms,
                SessionTimer::NextBatchRound,
            );
        }
    }

    fn on_next_batch_round(&mut self) {
        let Some(batch) = self.batch.as_ref() else {
            return;
        };
        if batch.cancel_requested {
            self.finish_batch(BatchEnd::Cancelled);
            return;
        }
        if let Err(e) = self.check_start_gates() {
            log::warn!("Batch stopped early: {}", e);
            self.finish_batch(BatchEnd::StoppedEarly(e));
            return;
        }
        self.begin_round();
    }

    fn finish_batch(&mut self, reason: BatchEnd) {
        self.timers.cancel(self.token);
        if let Some(batch) = self.batch.take() {
            log::info!(
                "Batch finished after {}/{} rounds: {:?}",
                batch.completed,
                batch.requested,
                reason
            );
            self.events.push(GameEvent::BatchFinished {
                completed: batch.completed,
                requested: batch.requested,
                reason,
            });
        }
        self.set_betting_locked(false);
        if self.ledger.is_bankrupt() {
            log::info!("Game over - out of money");
        }
    }
}

fn reject(error: GameError) -> Result<(), GameError> {
    log::warn!("Rejected: {}", error);
    Err(error)
}
