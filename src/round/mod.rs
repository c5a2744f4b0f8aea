//! Round engine
//!
//! Everything that happens between "start" and a verdict lives here:
//! - Exactly three dots per round
//! - Timer-driven only (virtual clock, no blocking)
//! - Seeded RNG only
//! - No ledger or presentation dependencies

pub mod engine;
pub mod scheduler;
pub mod state;

pub use engine::{RoundEngine, RoundParams, RoundTimer, Step};
pub use scheduler::{CancelToken, Scheduler};
pub use state::{Dot, DotPhase, Round, RoundPhase};
