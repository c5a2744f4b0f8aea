//! Round state machine
//!
//! Drives a round from its start to resolution through scheduled timers:
//! countdown ticks, staggered dot selections and freeze confirmations. The
//! engine never blocks; the caller moves the virtual clock with [`RoundEngine::step`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f64::consts::TAU;

use super::scheduler::{CancelToken, Scheduler};
use super::state::{Dot, Round, RoundPhase};
use crate::consts::*;
use crate::error::GameError;
use crate::events::GameEvent;
use crate::geometry::{self, Side};
use crate::settings::GameConfig;

/// Timing and motion parameters for rounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundParams {
    pub countdown_ms: u64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub orbit_radius: f64,
}

impl From<&GameConfig> for RoundParams {
    fn from(config: &GameConfig) -> Self {
        Self {
            countdown_ms: config.countdown_ms,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            orbit_radius: config.orbit_radius,
        }
    }
}

/// Scheduled round callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTimer {
    CountdownTick,
    SelectNext,
    ConfirmFreeze { dot: usize },
}

/// What a single [`RoundEngine::step`] did
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Nothing due
    Idle,
    /// A timer fired; the round goes on
    Progressed,
    Resolved {
        round_index: u64,
        outcome: Side,
        angles: [f64; DOT_COUNT],
    },
    /// Resolution failed; the round must not be settled
    Aborted { round_index: u64, error: GameError },
}

/// Owns the live round, its RNG and its timers
#[derive(Debug)]
pub struct RoundEngine {
    params: RoundParams,
    rng: Pcg32,
    timers: Scheduler<RoundTimer>,
    round: Option<Round>,
}

impl RoundEngine {
    pub fn new(params: RoundParams, seed: u64) -> Self {
        Self {
            params,
            rng: Pcg32::seed_from_u64(seed),
            timers: Scheduler::new(),
            round: None,
        }
    }

    pub fn params(&self) -> &RoundParams {
        &self.params
    }

    /// The live round, or the last resolved one
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// A round is started and not yet resolved
    pub fn is_running(&self) -> bool {
        self.round.as_ref().is_some_and(|r| !r.is_resolved())
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, ms: u64) {
        self.timers.advance_to(ms);
    }

    /// Cancel the previous round's timers, then deal fresh dots
    pub fn start_round(&mut self, index: u64, events: &mut Vec<GameEvent>) {
        if let Some(token) = self.round.take().and_then(|r| r.token) {
            let dropped = self.timers.cancel(token);
            if dropped > 0 {
                log::debug!("Dropped {} stale timers", dropped);
            }
        }

        let RoundParams {
            countdown_ms,
            min_speed,
            max_speed,
            ..
        } = self.params;
        let rng = &mut self.rng;
        let dots: [Dot; DOT_COUNT] = std::array::from_fn(|id| {
            let angle = rng.random::<f64>() * TAU;
            let speed = rng.random_range(min_speed..=max_speed);
            let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            Dot::new(id, angle, speed * direction, DOT_COLORS[id])
        });

        let token = self.timers.token();
        let mut round = Round::new(index, countdown_ms, dots);
        round.token = Some(token);

        log::info!("Round {} started ({} ms countdown)", index, countdown_ms);
        events.push(GameEvent::RoundStarted {
            round_index: index,
            dots: round.dots.clone(),
        });

        self.round = Some(round);
        self.timers.schedule(token, TICK_MS, RoundTimer::CountdownTick);
        self.schedule_selection();
    }

    /// Fire the earliest timer due by `until_ms`
    pub fn step(&mut self, until_ms: u64, events: &mut Vec<GameEvent>) -> Step {
        let Some((token, timer)) = self.timers.pop_due(until_ms) else {
            return Step::Idle;
        };

        // Timers of a superseded or finished round are ignored
        let live = self
            .round
            .as_ref()
            .is_some_and(|r| r.token == Some(token) && !r.is_resolved());
        if !live {
            return Step::Progressed;
        }

        match timer {
            RoundTimer::CountdownTick => self.on_tick(token, events),
            RoundTimer::SelectNext => self.on_select(token, events),
            RoundTimer::ConfirmFreeze { dot } => self.on_confirm(dot, events),
        }
    }

    fn on_tick(&mut self, token: CancelToken, events: &mut Vec<GameEvent>) -> Step {
        let Some(round) = self.round.as_mut() else {
            return Step::Idle;
        };

        round.remaining_ms = round.remaining_ms.saturating_sub(TICK_MS);
        let dt = TICK_MS as f64 / 1000.0;
        for dot in &mut round.dots {
            dot.spin(dt);
        }
        events.push(GameEvent::Tick {
            remaining_ms: round.remaining_ms,
        });

        if round.remaining_ms > 0 {
            self.timers.schedule(token, TICK_MS, RoundTimer::CountdownTick);
            return Step::Progressed;
        }

        // Out of time: everything still moving stops where it is
        for dot in round.dots.iter_mut().filter(|d| !d.is_frozen()) {
            let angle = dot.freeze();
            log::debug!("Dot {} force-frozen at {:.4}", dot.id, angle);
            events.push(GameEvent::DotFrozen {
                dot_id: dot.id,
                angle,
            });
        }
        self.finish(events)
    }

    fn on_select(&mut self, token: CancelToken, events: &mut Vec<GameEvent>) -> Step {
        let Some(round) = self.round.as_mut() else {
            return Step::Idle;
        };
        if round.remaining_ms == 0 {
            return Step::Progressed;
        }
        let candidates = round.spinning_ids();
        if candidates.is_empty() {
            return Step::Progressed;
        }

        let id = candidates[self.rng.random_range(0..candidates.len())];
        let angle = round.dots[id].select();
        round.phase = RoundPhase::Stopping;
        log::debug!("Dot {} selected at {:.4}", id, angle);
        events.push(GameEvent::DotSelected { dot_id: id, angle });

        let jitter = self
            .rng
            .random_range(FREEZE_DELAY_MIN_MS..FREEZE_DELAY_MAX_MS);
        let delay = jitter
            .min(round.remaining_ms.saturating_sub(FREEZE_DEADLINE_MARGIN_MS))
            .max(1);
        self.timers
            .schedule(token, delay, RoundTimer::ConfirmFreeze { dot: id });
        Step::Progressed
    }

    fn on_confirm(&mut self, dot: usize, events: &mut Vec<GameEvent>) -> Step {
        let Some(round) = self.round.as_mut() else {
            return Step::Idle;
        };
        let Some(target) = round.dots.get_mut(dot) else {
            return Step::Progressed;
        };
        if round.remaining_ms == 0 || target.is_frozen() {
            return Step::Progressed;
        }

        let angle = target.freeze();
        log::debug!("Dot {} frozen at {:.4}", dot, angle);
        events.push(GameEvent::DotFrozen { dot_id: dot, angle });

        if round.all_frozen() {
            return self.finish(events);
        }
        self.schedule_selection();
        Step::Progressed
    }

    /// Queue the next selection, staggered over the time left per unselected dot
    fn schedule_selection(&mut self) {
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let Some(token) = round.token else {
            return;
        };
        let unselected = round.spinning_ids().len();
        if unselected == 0 || round.remaining_ms == 0 {
            return;
        }

        let avg = round.remaining_ms as f64 / unselected as f64;
        let span = SELECT_DELAY_MAX_FRACTION - SELECT_DELAY_MIN_FRACTION;
        let raw = self.rng.random::<f64>() * span * avg + SELECT_DELAY_MIN_FRACTION * avg;
        let delay = (raw as u64)
            .min(round.remaining_ms.saturating_sub(SELECT_DEADLINE_MARGIN_MS))
            .max(SELECT_DELAY_FLOOR_MS);

        self.timers.schedule(token, delay, RoundTimer::SelectNext);
    }

    /// Resolve the round and drop whatever timers it still has queued
    fn finish(&mut self, events: &mut Vec<GameEvent>) -> Step {
        let Some(round) = self.round.as_mut() else {
            return Step::Idle;
        };
        round.phase = RoundPhase::Resolved;
        if let Some(token) = round.token {
            self.timers.cancel(token);
        }

        let angles = match round.final_angles() {
            Ok(angles) => angles,
            Err(error) => {
                log::error!("Round {} aborted: {}", round.index, error);
                return Step::Aborted {
                    round_index: round.index,
                    error,
                };
            }
        };

        let outcome = geometry::resolve(angles);
        round.outcome = Some(outcome);
        let margin = geometry::closest_edge(angles, self.params.orbit_radius).distance;
        log::info!(
            "Round {} resolved {} (margin {:.2})",
            round.index,
            outcome.as_str(),
            margin
        );
        events.push(GameEvent::RoundResolved {
            round_index: round.index,
            outcome,
            angles,
            margin,
        });

        Step::Resolved {
            round_index: round.index,
            outcome,
            angles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(countdown_ms: u64) -> RoundParams {
        RoundParams {
            countdown_ms,
            min_speed: 0.6,
            max_speed: 3.0,
            orbit_radius: 150.0,
        }
    }

    /// Step until the round resolves; returns the final step
    fn run(engine: &mut RoundEngine, events: &mut Vec<GameEvent>) -> Step {
        loop {
            match engine.step(u64::MAX, events) {
                Step::Progressed => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn test_round_resolves_with_three_frozen_dots() {
        let mut engine = RoundEngine::new(params(10_000), 12345);
        let mut events = Vec::new();
        engine.start_round(0, &mut events);
        assert!(engine.is_running());
        assert!(matches!(events[0], GameEvent::RoundStarted { round_index: 0, .. }));

        let step = run(&mut engine, &mut events);
        let Step::Resolved { outcome, angles, .. } = step else {
            panic!("expected resolution, got {step:?}");
        };
        assert_eq!(geometry::resolve(angles), outcome);

        let round = engine.round().unwrap();
        assert!(round.is_resolved());
        assert!(round.all_frozen());
        assert_eq!(round.outcome, Some(outcome));
        assert_eq!(engine.pending_timers(), 0);
        assert!(!engine.is_running());

        let frozen: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DotFrozen { dot_id, .. } => Some(*dot_id),
                _ => None,
            })
            .collect();
        assert_eq!(frozen.len(), DOT_COUNT);
        let resolved = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoundResolved { .. }))
            .count();
        assert_eq!(resolved, 1);
    }

    #[test]
    fn test_frozen_angle_matches_selection() {
        let mut engine = RoundEngine::new(params(10_000), 42);
        let mut events = Vec::new();
        engine.start_round(0, &mut events);
        run(&mut engine, &mut events);

        for event in &events {
            if let GameEvent::DotSelected { dot_id, angle } = event {
                let frozen = engine.round().unwrap().dots[*dot_id].frozen_angle;
                assert_eq!(frozen, Some(*angle));
            }
        }
    }

    #[test]
    fn test_countdown_is_monotonic_and_bounded() {
        let mut engine = RoundEngine::new(params(2_000), 7);
        let mut events = Vec::new();
        engine.start_round(0, &mut events);
        run(&mut engine, &mut events);

        let ticks: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Tick { remaining_ms } => Some(*remaining_ms),
                _ => None,
            })
            .collect();
        assert!(!ticks.is_empty());
        assert!(ticks.windows(2).all(|w| w[1] == w[0] - TICK_MS));
        assert!(engine.now_ms() <= 2_000);
    }

    #[test]
    fn test_timeout_force_freezes_everything() {
        // Too short for the staggered stops to finish: selection floor is 50 ms
        // and freeze confirmation needs more, so the countdown wins.
        let mut engine = RoundEngine::new(params(40), 99);
        let mut events = Vec::new();
        engine.start_round(0, &mut events);
        let step = run(&mut engine, &mut events);

        assert!(matches!(step, Step::Resolved { .. }));
        assert_eq!(engine.now_ms(), 40);
        assert!(engine.round().unwrap().all_frozen());
        assert_eq!(engine.pending_timers(), 0);
    }

    #[test]
    fn test_timeout_freezes_selected_dot_at_captured_angle() {
        // 40 ms ends before the first scheduled selection, so dot 1 is the
        // only selected dot and it has no freeze confirmation queued
        let mut engine = RoundEngine::new(params(40), 7);
        let mut events = Vec::new();
        engine.start_round(0, &mut events);
        let captured = engine.round.as_mut().unwrap().dots[1].select();
        let spinning_start = engine.round().unwrap().dots[0].angle;

        let step = run(&mut engine, &mut events);
        assert!(matches!(step, Step::Resolved { .. }));

        let round = engine.round().unwrap();
        let selected = &round.dots[1];
        assert_eq!(selected.captured_angle, Some(captured));
        assert_eq!(selected.frozen_angle, Some(captured));
        assert_eq!(selected.angle, captured);
        assert!(events.contains(&GameEvent::DotFrozen {
            dot_id: 1,
            angle: captured
        }));

        // Spinning dots froze wherever the countdown left them
        let spun = &round.dots[0];
        assert_ne!(spun.frozen_angle, Some(spinning_start));
        assert_eq!(spun.frozen_angle, Some(spun.angle));
        assert_eq!(spun.captured_angle, None);
    }

    #[test]
    fn test_restart_cancels_previous_timers() {
        let mut engine = RoundEngine::new(params(10_000), 5);
        let mut events = Vec::new();
        engine.start_round(0, &mut events);
        engine.step(500, &mut events);
        let pending_before = engine.pending_timers();
        assert!(pending_before > 0);

        engine.start_round(1, &mut events);
        // Only the new round's countdown tick and first selection remain
        assert_eq!(engine.pending_timers(), 2);
        assert_eq!(engine.round().unwrap().index, 1);
        assert_eq!(engine.round().unwrap().remaining_ms, 10_000);
    }

    #[test]
    fn test_dot_velocities_bounded_and_nonzero() {
        let mut engine = RoundEngine::new(params(10_000), 2718);
        let mut events = Vec::new();
        for i in 0..50 {
            engine.start_round(i, &mut events);
            for dot in &engine.round().unwrap().dots {
                let speed = dot.angular_velocity.abs();
                assert!((0.6..=3.0).contains(&speed));
                assert!(dot.angle >= 0.0 && dot.angle < TAU);
            }
        }
    }

    #[test]
    fn test_determinism() {
        let mut e1 = RoundEngine::new(params(5_000), 99999);
        let mut e2 = RoundEngine::new(params(5_000), 99999);
        let (mut ev1, mut ev2) = (Vec::new(), Vec::new());
        e1.start_round(0, &mut ev1);
        e2.start_round(0, &mut ev2);
        assert_eq!(run(&mut e1, &mut ev1), run(&mut e2, &mut ev2));
        assert_eq!(ev1, ev2);
    }
}
