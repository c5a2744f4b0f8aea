//! Settled-round history
//!
//! Append-only; lives for the session only.

use serde::{Deserialize, Serialize};

use crate::ledger::{SettlementRecord, SettlementResult};

/// Aggregate view over the history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub rounds: usize,
    /// Rounds with a stake at risk
    pub bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    pub total_staked: u64,
    pub total_paid: u64,
    /// Largest single-round profit
    pub biggest_win: u64,
    /// Rounds the center landed inside
    pub in_outcomes: usize,
}

impl HistorySummary {
    /// Total paid out minus total staked
    pub fn net(&self) -> i64 {
        self.total_paid as i64 - self.total_staked as i64
    }

    /// Fraction of bets won (0 with no bets)
    pub fn win_rate(&self) -> f64 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            0.0
        } else {
            self.wins as f64 / decided as f64
        }
    }
}

/// Settled rounds, oldest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoundHistory {
    records: Vec<SettlementRecord>,
}

impl RoundHistory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: SettlementRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SettlementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&SettlementRecord> {
        self.records.last()
    }

    /// The most recent `n` records, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &SettlementRecord> {
        self.records.iter().rev().take(n)
    }

    pub fn summary(&self) -> HistorySummary {
        let mut summary = HistorySummary {
            rounds: self.records.len(),
            ..Default::default()
        };

        for record in &self.records {
            if record.outcome == crate::geometry::Side::In {
                summary.in_outcomes += 1;
            }
            if record.stake > 0 {
                summary.bets += 1;
            }
            summary.total_staked += record.stake;
            summary.total_paid += record.payout;

            match record.result {
                SettlementResult::Win => {
                    summary.wins += 1;
                    summary.biggest_win = summary.biggest_win.max(record.payout.saturating_sub(record.stake));
                }
                SettlementResult::Loss => summary.losses += 1,
                SettlementResult::Push => summary.pushes += 1,
                SettlementResult::NoBet => {}
            }
        }

        summary
    }
}
