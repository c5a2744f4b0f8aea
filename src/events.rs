//! Events emitted to the presentation layer

use serde::Serialize;

use crate::consts::DOT_COUNT;
use crate::error::GameError;
use crate::geometry::Side;
use crate::ledger::SettlementRecord;
use crate::round::Dot;
use crate::session::BatchEnd;

/// Everything the presentation layer needs to redraw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum GameEvent {
    /// Fresh dots for a new round
    RoundStarted {
        round_index: u64,
        dots: [Dot; DOT_COUNT],
    },
    /// Countdown refresh (every tick)
    Tick { remaining_ms: u64 },
    /// A dot was picked to stop at `angle`
    DotSelected { dot_id: usize, angle: f64 },
    /// A dot stopped for good
    DotFrozen { dot_id: usize, angle: f64 },
    /// Final verdict; `margin` is the center's distance to the nearest edge
    RoundResolved {
        round_index: u64,
        outcome: Side,
        angles: [f64; DOT_COUNT],
        margin: f64,
    },
    Settlement(SettlementRecord),
    /// Round abandoned without settlement; the stake was refunded
    RoundAborted { round_index: u64, error: GameError },
    /// Betting controls disabled (`true`) or re-enabled (`false`)
    BettingLocked(bool),
    BatchFinished {
        completed: u32,
        requested: u32,
        reason: BatchEnd,
    },
}

/// Callback-style receiver for [`GameEvent`]s; every hook defaults to a no-op
pub trait GameObserver {
    fn on_round_started(&mut self, _round_index: u64, _dots: &[Dot; DOT_COUNT]) {}
    fn on_tick(&mut self, _remaining_ms: u64) {}
    fn on_dot_selected(&mut self, _dot_id: usize, _angle: f64) {}
    fn on_dot_frozen(&mut self, _dot_id: usize, _angle: f64) {}
    fn on_round_resolved(&mut self, _outcome: Side, _angles: [f64; DOT_COUNT]) {}
    fn on_settlement(&mut self, _record: &SettlementRecord) {}
    fn on_round_aborted(&mut self, _round_index: u64, _error: &GameError) {}
    fn on_betting_locked(&mut self, _locked: bool) {}
    fn on_batch_finished(&mut self, _completed: u32, _requested: u32, _reason: &BatchEnd) {}
}

impl GameEvent {
    /// Route this event to the matching observer hook
    pub fn dispatch<O: GameObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            GameEvent::RoundStarted { round_index, dots } => {
                observer.on_round_started(*round_index, dots)
            }
            GameEvent::Tick { remaining_ms } => observer.on_tick(*remaining_ms),
            GameEvent::DotSelected { dot_id, angle } => observer.on_dot_selected(*dot_id, *angle),
            GameEvent::DotFrozen { dot_id, angle } => observer.on_dot_frozen(*dot_id, *angle),
            GameEvent::RoundResolved {
                outcome, angles, ..
            } => observer.on_round_resolved(*outcome, *angles),
            GameEvent::Settlement(record) => observer.on_settlement(record),
            GameEvent::RoundAborted { round_index, error } => {
                observer.on_round_aborted(*round_index, error)
            }
            GameEvent::BettingLocked(locked) => observer.on_betting_locked(*locked),
            GameEvent::BatchFinished {
                completed,
                requested,
                reason,
            } => observer.on_batch_finished(*completed, *requested, reason),
        }
    }
}
