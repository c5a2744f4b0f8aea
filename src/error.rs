//! Error taxonomy
//!
//! Every error here is recoverable: a rejected command leaves the session
//! untouched and the next command can proceed normally.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum GameError {
    /// Staging or starting would put more at risk than the bankroll holds
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    /// A stake is staged but no side was chosen
    #[error("select a bet type before starting")]
    NoBetTypeSelected,
    /// Fewer than three frozen angles at resolution time
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),
    /// Betting controls are disabled while a round or batch runs
    #[error("bets are locked")]
    BettingLocked,
    /// A round or batch is already running
    #[error("a round is already in progress")]
    RoundInProgress,
    /// Chip value of zero
    #[error("chip value must be positive")]
    InvalidChip,
    /// Batch size outside 1..=max
    #[error("batch size {requested} outside 1..={max}")]
    InvalidBatchSize { requested: u32, max: u32 },
}

/// Errors loading or validating a [`crate::GameConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
