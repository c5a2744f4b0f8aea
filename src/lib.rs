//! Orbit Wager - three orbiting dots, one triangle
//!
//! Core modules:
//! - `geometry`: Center-in-triangle decision from three angles on a circle
//! - `round`: Round state machine (countdown, staggered stops, timer scheduler)
//! - `ledger`: Bankroll, staged wager, settlement arithmetic
//! - `session`: Orchestrates rounds and batches, gates commands
//! - `events`: Outbound events and the observer hook
//! - `settings`: Data-driven game configuration

pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod ledger;
pub mod round;
pub mod session;
pub mod settings;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{ConfigError, GameError};
pub use events::{GameEvent, GameObserver};
pub use geometry::{Side, resolve};
pub use history::{HistorySummary, RoundHistory};
pub use ledger::{Ledger, Odds, SettlementRecord, SettlementResult, Wager};
pub use session::{BatchEnd, BatchSession, FrameClock, Session};
pub use settings::{GameConfig, Pace};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Countdown resolution (one tick every 10 ms)
    pub const TICK_MS: u64 = 10;

    /// Every round has exactly this many dots
    pub const DOT_COUNT: usize = 3;

    /// Tolerance for arc comparisons in the containment test
    pub const ARC_EPSILON: f64 = 1e-9;

    /// Selection delay window, as fractions of the average time left per dot
    pub const SELECT_DELAY_MIN_FRACTION: f64 = 0.1;
    pub const SELECT_DELAY_MAX_FRACTION: f64 = 0.7;
    /// A selection never fires sooner than this
    pub const SELECT_DELAY_FLOOR_MS: u64 = 50;
    /// Selections are scheduled at least this long before the countdown ends
    pub const SELECT_DEADLINE_MARGIN_MS: u64 = 100;

    /// Freeze confirmation delay window (ms)
    pub const FREEZE_DELAY_MIN_MS: u64 = 100;
    pub const FREEZE_DELAY_MAX_MS: u64 = 800;
    /// Freezes are confirmed at least this long before the countdown ends
    pub const FREEZE_DEADLINE_MARGIN_MS: u64 = 50;

    /// Base dot palette, one color per dot id
    pub const DOT_COLORS: [&str; DOT_COUNT] = ["#ff5733", "#33ff57", "#3357ff"];
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}
