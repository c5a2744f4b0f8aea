//! Bankroll, staged wager and settlement
//!
//! Amounts are whole currency units. Odds are stored in hundredths so that
//! settlement is exact integer arithmetic: a 100 stake at ×1.95 pays 195.

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::geometry::Side;
use crate::history::RoundHistory;

/// Payout multipliers per side, in hundredths (`390` pays ×3.90)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    pub in_hundredths: u32,
    pub out_hundredths: u32,
}

impl Default for Odds {
    /// P(In) = 1/4 and P(Out) = 3/4, so ×3.90 / ×1.30 returns 97.5% on both sides
    fn default() -> Self {
        Self {
            in_hundredths: 390,
            out_hundredths: 130,
        }
    }
}

impl Odds {
    pub fn new(in_hundredths: u32, out_hundredths: u32) -> Self {
        Self {
            in_hundredths,
            out_hundredths,
        }
    }

    pub fn hundredths(&self, side: Side) -> u32 {
        match side {
            Side::In => self.in_hundredths,
            Side::Out => self.out_hundredths,
        }
    }

    /// Multiplier for display
    pub fn multiplier(&self, side: Side) -> f64 {
        self.hundredths(side) as f64 / 100.0
    }

    /// Full payout (stake included) for a winning stake, rounded down
    pub fn payout(&self, side: Side, stake: u64) -> u64 {
        stake.saturating_mul(self.hundredths(side) as u64) / 100
    }

    /// Expected return per unit staged, given the true geometric odds
    pub fn expected_return(&self, side: Side) -> f64 {
        let p_win = match side {
            Side::In => 0.25,
            Side::Out => 0.75,
        };
        p_win * self.multiplier(side)
    }
}

/// The player's bet for the current and upcoming rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    /// Amount staged for the next round; sticky across rounds
    pub staged: u64,
    /// Side backed, if any
    pub side: Option<Side>,
    /// Amount at risk in the in-flight round (0 between rounds)
    pub active: u64,
}

/// How a settled round went for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementResult {
    Win,
    Loss,
    /// Stake placed without a side; returned in full
    Push,
    /// Nothing was staged
    NoBet,
}

/// One settled round, appended to the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub round_index: u64,
    pub outcome: Side,
    pub side: Option<Side>,
    /// Stake that was at risk
    pub stake: u64,
    /// Amount credited back (stake included); 0 on a loss
    pub payout: u64,
    pub bankroll_after: u64,
    pub result: SettlementResult,
}

impl SettlementRecord {
    /// Net change to the bankroll over the round
    pub fn net(&self) -> i64 {
        self.payout as i64 - self.stake as i64
    }
}

/// Bankroll plus the wager and settled-round history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    bankroll: u64,
    starting_bankroll: u64,
    wager: Wager,
    odds: Odds,
    history: RoundHistory,
}

impl Ledger {
    pub fn new(starting_bankroll: u64, odds: Odds) -> Self {
        Self {
            bankroll: starting_bankroll,
            starting_bankroll,
            wager: Wager::default(),
            odds,
            history: RoundHistory::new(),
        }
    }

    pub fn bankroll(&self) -> u64 {
        self.bankroll
    }

    pub fn wager(&self) -> &Wager {
        &self.wager
    }

    pub fn odds(&self) -> &Odds {
        &self.odds
    }

    pub fn history(&self) -> &RoundHistory {
        &self.history
    }

    /// Whether the bankroll covers the staged amount
    pub fn covers_staged(&self) -> bool {
        self.bankroll >= self.wager.staged
    }

    /// Add a chip to the staged amount
    pub fn stage(&mut self, amount: u64) -> Result<(), GameError> {
        if amount == 0 {
            return Err(GameError::InvalidChip);
        }
        let needed = self.wager.staged.saturating_add(amount);
        if self.bankroll < needed {
            return Err(GameError::InsufficientFunds {
                needed,
                available: self.bankroll,
            });
        }
        self.wager.staged = needed;
        Ok(())
    }

    /// Drop the staged amount (it was never deducted)
    pub fn clear_staged(&mut self) {
        self.wager.staged = 0;
    }

    /// Toggle the backed side; picking the active side again clears it
    pub fn select_side(&mut self, side: Option<Side>) {
        self.wager.side = match side {
            Some(s) if self.wager.side == Some(s) => None,
            other => other,
        };
    }

    /// Put the staged amount at risk for the round about to start
    pub fn commit(&mut self) -> Result<u64, GameError> {
        if self.wager.active != 0 {
            return Err(GameError::InternalConsistency(
                "wager committed twice without settlement".into(),
            ));
        }
        if !self.covers_staged() {
            return Err(GameError::InsufficientFunds {
                needed: self.wager.staged,
                available: self.bankroll,
            });
        }
        self.wager.active = self.wager.staged;
        self.bankroll -= self.wager.active;
        Ok(self.wager.active)
    }

    /// Settle the in-flight round against its outcome
    pub fn settle(&mut self, round_index: u64, outcome: Side) -> SettlementRecord {
        let stake = std::mem::take(&mut self.wager.active);
        let side = self.wager.side;

        let (result, payout) = match (stake, side) {
            (0, _) => (SettlementResult::NoBet, 0),
            (stake, None) => (SettlementResult::Push, stake),
            (stake, Some(s)) if s == outcome => (SettlementResult::Win, self.odds.payout(s, stake)),
            (_, Some(_)) => (SettlementResult::Loss, 0),
        };
        self.bankroll = self.bankroll.saturating_add(payout);

        let record = SettlementRecord {
            round_index,
            outcome,
            side,
            stake,
            payout,
            bankroll_after: self.bankroll,
            result,
        };
        self.history.push(record.clone());
        record
    }

    /// Refund the in-flight stake of an aborted round; nothing is recorded
    pub fn void_active(&mut self) -> u64 {
        let stake = std::mem::take(&mut self.wager.active);
        self.bankroll = self.bankroll.saturating_add(stake);
        stake
    }

    /// Restore the starting bankroll and clear the wager; history is kept
    pub fn reset_bankroll(&mut self) {
        self.bankroll = self.starting_bankroll;
        self.wager = Wager::default();
    }

    /// Out of money with nothing staged
    pub fn is_bankrupt(&self) -> bool {
        self.bankroll == 0 && self.wager.staged == 0 && self.wager.active == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stage_limits() {
        let mut ledger = Ledger::new(100, Odds::default());
        ledger.stage(60).unwrap();
        assert_eq!(
            ledger.stage(50),
            Err(GameError::InsufficientFunds {
                needed: 110,
                available: 100
            })
        );
        assert_eq!(ledger.wager().staged, 60);
        assert_eq!(ledger.stage(0), Err(GameError::InvalidChip));
        ledger.stage(40).unwrap();
        assert_eq!(ledger.wager().staged, 100);
        // Staging never touches the bankroll
        assert_eq!(ledger.bankroll(), 100);
        ledger.clear_staged();
        assert_eq!(ledger.wager().staged, 0);
        assert_eq!(ledger.bankroll(), 100);
    }

    #[test]
    fn test_select_side_toggles() {
        let mut ledger = Ledger::new(100, Odds::default());
        ledger.select_side(Some(Side::In));
        assert_eq!(ledger.wager().side, Some(Side::In));
        ledger.select_side(Some(Side::Out));
        assert_eq!(ledger.wager().side, Some(Side::Out));
        ledger.select_side(Some(Side::Out));
        assert_eq!(ledger.wager().side, None);
        ledger.select_side(Some(Side::In));
        ledger.select_side(None);
        assert_eq!(ledger.wager().side, None);
    }

    #[test]
    fn test_win_pays_stake_and_profit() {
        let mut ledger = Ledger::new(1000, Odds::new(195, 195));
        ledger.stage(100).unwrap();
        ledger.select_side(Some(Side::In));
        assert_eq!(ledger.commit(), Ok(100));
        assert_eq!(ledger.bankroll(), 900);

        let record = ledger.settle(0, Side::In);
        assert_eq!(record.result, SettlementResult::Win);
        assert_eq!(record.payout, 195);
        assert_eq!(record.net(), 95);
        assert_eq!(ledger.bankroll(), 1095);
        assert_eq!(ledger.wager().active, 0);
        // Sticky bet
        assert_eq!(ledger.wager().staged, 100);
        assert_eq!(ledger.wager().side, Some(Side::In));
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_loss_and_push() {
        let mut ledger = Ledger::new(500, Odds::default());
        ledger.stage(50).unwrap();
        ledger.select_side(Some(Side::In));
        ledger.commit().unwrap();
        let record = ledger.settle(0, Side::Out);
        assert_eq!(record.result, SettlementResult::Loss);
        assert_eq!(record.payout, 0);
        assert_eq!(ledger.bankroll(), 450);

        ledger.select_side(None);
        ledger.commit().unwrap();
        let record = ledger.settle(1, Side::In);
        assert_eq!(record.result, SettlementResult::Push);
        assert_eq!(record.payout, 50);
        assert_eq!(ledger.bankroll(), 450);
    }

    #[test]
    fn test_no_bet_still_recorded() {
        let mut ledger = Ledger::new(10, Odds::default());
        assert_eq!(ledger.commit(), Ok(0));
        let record = ledger.settle(3, Side::Out);
        assert_eq!(record.result, SettlementResult::NoBet);
        assert_eq!(record.round_index, 3);
        assert_eq!(ledger.bankroll(), 10);
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_double_commit_rejected() {
        let mut ledger = Ledger::new(100, Odds::default());
        ledger.stage(10).unwrap();
        ledger.commit().unwrap();
        assert!(matches!(
            ledger.commit(),
            Err(GameError::InternalConsistency(_))
        ));
        assert_eq!(ledger.bankroll(), 90);
    }

    #[test]
    fn test_void_refunds_without_record() {
        let mut ledger = Ledger::new(100, Odds::default());
        ledger.stage(30).unwrap();
        ledger.commit().unwrap();
        assert_eq!(ledger.void_active(), 30);
        assert_eq!(ledger.bankroll(), 100);
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_reset_and_bankrupt() {
        let mut ledger = Ledger::new(20, Odds::default());
        ledger.stage(20).unwrap();
        ledger.select_side(Some(Side::In));
        ledger.commit().unwrap();
        ledger.settle(0, Side::Out);
        ledger.clear_staged();
        assert!(ledger.is_bankrupt());

        ledger.reset_bankroll();
        assert_eq!(ledger.bankroll(), 20);
        assert_eq!(*ledger.wager(), Wager::default());
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_default_odds_house_edge() {
        let odds = Odds::default();
        assert!(odds.expected_return(Side::In) < 1.0);
        assert!(odds.expected_return(Side::Out) < 1.0);
        assert!(odds.multiplier(Side::In) > odds.multiplier(Side::Out));
    }

    proptest! {
        #[test]
        fn prop_conservation(
            start in 0u64..10_000,
            steps in prop::collection::vec((0u64..500, 0u8..3, any::<bool>()), 1..40),
        ) {
            let mut ledger = Ledger::new(start, Odds::new(390, 130));
            for (round, (chip, side, in_wins)) in steps.into_iter().enumerate() {
                if chip > 0 {
                    let _ = ledger.stage(chip);
                }
                let side = match side {
                    0 => None,
                    1 => Some(Side::In),
                    _ => Some(Side::Out),
                };
                if ledger.wager().side != side {
                    ledger.select_side(side);
                }
                let staged_before = ledger.wager().staged;
                let before = ledger.bankroll();
                if ledger.commit().is_err() {
                    ledger.clear_staged();
                    continue;
                }
                let outcome = if in_wins { Side::In } else { Side::Out };
                let record = ledger.settle(round as u64, outcome);
                prop_assert_eq!(ledger.bankroll(), before - record.stake + record.payout);
                prop_assert_eq!(record.bankroll_after, ledger.bankroll());
                prop_assert_eq!(ledger.wager().staged, staged_before);
                prop_assert_eq!(ledger.wager().active, 0);
            }
        }
    }
}
