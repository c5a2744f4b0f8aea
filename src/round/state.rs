//! Round state and core types
//!
//! A round owns exactly three dots. Dots are created fresh at round start
//! and discarded with the round.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::scheduler::CancelToken;
use crate::consts::DOT_COUNT;
use crate::error::GameError;
use crate::geometry::Side;
use crate::{normalize_angle, polar_to_cartesian};

/// Dot lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DotPhase {
    /// Orbiting
    Spinning,
    /// Picked to stop; angle captured, no longer moving
    Selected,
    /// Stopped for good
    Frozen,
}

/// A dot orbiting the center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub id: usize,
    /// Current angle (radians, [0, 2π))
    pub angle: f64,
    /// Signed angular velocity (radians/sec, never zero)
    pub angular_velocity: f64,
    pub color: String,
    pub phase: DotPhase,
    /// Angle captured when the dot was selected
    pub captured_angle: Option<f64>,
    /// Final angle; set once
    pub frozen_angle: Option<f64>,
}

impl Dot {
    pub fn new(id: usize, angle: f64, angular_velocity: f64, color: impl Into<String>) -> Self {
        Self {
            id,
            angle: normalize_angle(angle),
            angular_velocity,
            color: color.into(),
            phase: DotPhase::Spinning,
            captured_angle: None,
            frozen_angle: None,
        }
    }

    /// Advance a spinning dot by `dt` seconds; selected and frozen dots hold still
    pub fn spin(&mut self, dt: f64) {
        if self.phase == DotPhase::Spinning {
            self.angle = normalize_angle(self.angle + self.angular_velocity * dt);
        }
    }

    /// Capture the current angle and stop moving
    pub fn select(&mut self) -> f64 {
        if self.phase == DotPhase::Spinning {
            self.phase = DotPhase::Selected;
            self.captured_angle = Some(self.angle);
        }
        self.captured_angle.unwrap_or(self.angle)
    }

    /// Freeze at the captured angle, or the current one if never selected
    pub fn freeze(&mut self) -> f64 {
        if let Some(angle) = self.frozen_angle {
            return angle;
        }
        let angle = self.captured_angle.unwrap_or(self.angle);
        self.angle = angle;
        self.frozen_angle = Some(angle);
        self.phase = DotPhase::Frozen;
        angle
    }

    pub fn is_frozen(&self) -> bool {
        self.phase == DotPhase::Frozen
    }

    /// Cartesian position on an orbit of the given radius
    pub fn position(&self, radius: f64) -> DVec2 {
        polar_to_cartesian(radius, self.angle)
    }
}

/// Round progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No dot selected yet
    Spinning,
    /// At least one dot selected, not all frozen
    Stopping,
    /// All dots frozen; terminal
    Resolved,
}

/// A single round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub index: u64,
    pub remaining_ms: u64,
    pub dots: [Dot; DOT_COUNT],
    pub phase: RoundPhase,
    /// `None` while unresolved
    pub outcome: Option<Side>,
    #[serde(skip)]
    pub(crate) token: Option<CancelToken>,
}

impl Round {
    pub fn new(index: u64, countdown_ms: u64, dots: [Dot; DOT_COUNT]) -> Self {
        Self {
            index,
            remaining_ms: countdown_ms,
            dots,
            phase: RoundPhase::Spinning,
            outcome: None,
            token: None,
        }
    }

    /// Ids of dots still spinning
    pub fn spinning_ids(&self) -> Vec<usize> {
        self.dots
            .iter()
            .filter(|d| d.phase == DotPhase::Spinning)
            .map(|d| d.id)
            .collect()
    }

    pub fn frozen_count(&self) -> usize {
        self.dots.iter().filter(|d| d.is_frozen()).count()
    }

    pub fn all_frozen(&self) -> bool {
        self.frozen_count() == DOT_COUNT
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == RoundPhase::Resolved
    }

    /// The three frozen angles, in dot order
    pub fn final_angles(&self) -> Result<[f64; DOT_COUNT], GameError> {
        let mut angles = [0.0; DOT_COUNT];
        for (slot, dot) in angles.iter_mut().zip(&self.dots) {
            *slot = dot.frozen_angle.ok_or_else(|| {
                GameError::InternalConsistency(format!(
                    "round {}: only {} of {} dots frozen",
                    self.index,
                    self.frozen_count(),
                    DOT_COUNT
                ))
            })?;
        }
        Ok(angles)
    }
}
