//! Agent structure and construction rules.

use crate::error::{Result, SimError};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

/// Behavioral role of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentKind {
    #[default]
    Normal,
    /// Repulsive to others, chases and eats prey
    Predator,
    /// Strongly followed by non-predators
    Leader,
    /// Boundary contact. Only used as an interaction key, never a group member
    Wall,
}

impl AgentKind {
    #[inline]
    pub fn is_predator(self) -> bool {
        self == AgentKind::Predator
    }

    /// Can be removed by a predator
    #[inline]
    pub fn is_prey(self) -> bool {
        matches!(self, AgentKind::Normal | AgentKind::Leader)
    }
}

/// A self-propelled point agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub position: Vector,
    /// Unit direction of motion
    pub heading: Vector,
    pub speed: f64,
    pub max_speed: f64,
    /// Width of the uniform angular perturbation applied per step
    pub noise: f64,
    pub sight_radius: f64,
    /// Half-angle of the forward visibility cone, in radians
    pub field_of_view: f64,
    /// Sensitivity to predators, in `[0, 1]`
    pub fear: f64,
    pub kind: AgentKind,
}

impl Agent {
    /// Create an agent. The heading is normalized when non-zero, and a
    /// predator may reach twice its nominal speed.
    pub fn new(
        position: Vector,
        heading: Vector,
        speed: f64,
        noise: f64,
        sight_radius: f64,
        kind: AgentKind,
    ) -> Result<Self> {
        if position.dim() != heading.dim() {
            return Err(SimError::DimensionMismatch {
                expected: position.dim(),
                found: heading.dim(),
            });
        }
        if kind == AgentKind::Wall {
            return Err(SimError::WallAgent);
        }
        if !(sight_radius.is_finite() && sight_radius >= 0.0) {
            return Err(SimError::InvalidSightRadius(sight_radius));
        }

        let speed = speed.max(0.0);
        let max_speed = if kind.is_predator() { 2.0 * speed } else { speed };

        Ok(Self {
            position,
            heading: heading.normalized().unwrap_or(heading),
            speed,
            max_speed,
            noise: noise.max(0.0),
            sight_radius,
            field_of_view: FRAC_PI_4,
            fear: 1.0,
            kind,
        })
    }

    pub fn with_field_of_view(mut self, half_angle: f64) -> Self {
        self.field_of_view = half_angle;
        self
    }

    pub fn with_fear(mut self, fear: f64) -> Self {
        self.fear = fear.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.position.dim()
    }

    /// Velocity vector (speed times heading)
    #[inline]
    pub fn velocity(&self) -> Vector {
        self.heading * self.speed
    }

    #[inline]
    pub fn distance(&self, other: &Agent) -> f64 {
        self.position.distance(&other.position)
    }

    /// One-line description
    pub fn summary(&self) -> String {
        format!(
            "{:?} pos={:?} heading={:?} speed={:.3}/{:.3} noise={:.3} sight={:.2} fov={:.1}° fear={:.2}",
            self.kind,
            self.position.as_slice(),
            self.heading.as_slice(),
            self.speed,
            self.max_speed,
            self.noise,
            self.sight_radius,
            self.field_of_view.to_degrees(),
            self.fear,
        )
    }
}
