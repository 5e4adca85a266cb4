//! Local interaction rule: how one agent's next motion follows from what it senses.
//!
//! The physics of each pair of roles is one cell of the [`rule`] table, and each
//! cell maps to a pure [`Rule::contribution`].

use crate::agent::{Agent, AgentKind};
use crate::space::Domain;
use crate::vector::Vector;
use rand::Rng;

/// Weight of a leader's heading for non-predators
pub const LEADER_WEIGHT: f64 = 5.0;

/// Spring constant of the wall repulsion
pub const WALL_STIFFNESS: f64 = 100.0;

/// Extra share of prey speed a chasing predator picks up
pub const CHASE_SPEED_BONUS: f64 = 0.25;

/// What an agent perceives about one neighbor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensed {
    pub position: Vector,
    pub heading: Vector,
    pub speed: f64,
    pub kind: AgentKind,
}

impl Sensed {
    /// A boundary contact point: no heading, no speed
    pub fn wall(point: Vector) -> Self {
        Self {
            position: point,
            heading: Vector::zeros(point.dim()),
            speed: 0.0,
            kind: AgentKind::Wall,
        }
    }
}

impl From<&Agent> for Sensed {
    fn from(agent: &Agent) -> Self {
        Self {
            position: agent.position,
            heading: agent.heading,
            speed: agent.speed,
            kind: agent.kind,
        }
    }
}

/// Interaction physics between a target and one neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Add the neighbor's heading
    Align,
    /// Add the neighbor's heading, weighted by [`LEADER_WEIGHT`]
    Follow,
    /// Steer toward the neighbor along the unit separation vector
    Chase,
    /// Move away, scaled by fear and group size
    Flee,
    /// Wall spring pushing back into the domain
    Repel,
}

/// Interaction table keyed by `(target kind, neighbor kind)`
pub fn rule(target: AgentKind, neighbor: AgentKind) -> Rule {
    use AgentKind::*;

    match (target, neighbor) {
        (_, Wall) => Rule::Repel,
        (Predator, Predator) => Rule::Align,
        (Predator, Normal | Leader) => Rule::Chase,
        (_, Normal) => Rule::Align,
        (_, Predator) => Rule::Flee,
        (_, Leader) => Rule::Follow,
    }
}

/// Contribution of one neighbor to the heading and speed accumulators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub heading: Vector,
    pub speed: f64,
}

impl Rule {
    /// `neighbor_count` is the size of the whole neighbor set, walls included.
    pub fn contribution(self, target: &Agent, other: &Sensed, neighbor_count: usize) -> Contribution {
        let count = neighbor_count as f64;
        let away = target.position - other.position;

        match self {
            Rule::Align => Contribution {
                heading: other.heading,
                speed: other.speed,
            },
            Rule::Follow => Contribution {
                heading: other.heading * LEADER_WEIGHT,
                speed: other.speed,
            },
            Rule::Chase => Contribution {
                heading: (-away).normalized().unwrap_or_else(|| Vector::zeros(away.dim())),
                speed: other.speed * (1.0 + CHASE_SPEED_BONUS),
            },
            Rule::Flee => Contribution {
                heading: away * (target.fear * count),
                speed: other.speed,
            },
            Rule::Repel => Contribution {
                heading: away * (count * WALL_STIFFNESS),
                speed: 0.0,
            },
        }
    }
}

/// New kinematic state of an agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vector,
    pub heading: Vector,
    pub speed: f64,
}

impl Agent {
    pub fn apply(&mut self, motion: Motion) {
        self.position = motion.position;
        self.heading = motion.heading;
        self.speed = motion.speed;
    }
}

/// Per-axis uniform perturbation in `[-amplitude/2, amplitude/2)`
pub fn sample_noise<R: Rng + ?Sized>(rng: &mut R, dim: usize, amplitude: f64) -> Vector {
    Vector::random_in_box(rng, dim, -amplitude / 2.0, amplitude / 2.0)
}

/// Compute the next motion of `target` from its neighbor set.
///
/// The position advances along the current heading before the heading is
/// recomputed. Returns `None` when no neighbor other than walls was sensed,
/// in which case the agent keeps its state for this step.
pub fn next_motion(
    target: &Agent,
    neighbors: &[Sensed],
    noise: Vector,
    dt: f64,
    domain: &Domain,
) -> Option<Motion> {
    let dim = target.dimension();
    let mut heading_sum = Vector::zeros(dim);
    let mut speed_sum = 0.0;
    let mut members = 0usize;

    for other in neighbors {
        if other.kind != AgentKind::Wall {
            members += 1;
        }
        let c = rule(target.kind, other.kind).contribution(target, other, neighbors.len());
        heading_sum += c.heading;
        speed_sum += c.speed;
    }

    if members == 0 {
        return None;
    }

    let n = members as f64;
    let mean_heading = heading_sum / n;
    let mean_speed = speed_sum / n;

    let mut position = target.position + target.heading * (target.speed * dt);
    domain.wrap(&mut position);

    let heading = (mean_heading + noise)
        .normalized()
        .unwrap_or(target.heading);

    Some(Motion {
        position,
        heading,
        speed: mean_speed.min(target.max_speed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(kind: AgentKind, x: f64, y: f64, hx: f64, hy: f64) -> Agent {
        Agent::new(Vector::xy(x, y), Vector::xy(hx, hy), 1.0, 0.0, 5.0, kind).unwrap()
    }

    fn domain() -> Domain {
        Domain::new(2, 50.0).unwrap()
    }

    #[test]
    fn test_rule_table() {
        use AgentKind::*;

        assert_eq!(rule(Normal, Normal), Rule::Align);
        assert_eq!(rule(Normal, Predator), Rule::Flee);
        assert_eq!(rule(Normal, Leader), Rule::Follow);
        assert_eq!(rule(Normal, Wall), Rule::Repel);
        assert_eq!(rule(Leader, Normal), Rule::Align);
        assert_eq!(rule(Leader, Predator), Rule::Flee);
        assert_eq!(rule(Leader, Leader), Rule::Follow);
        assert_eq!(rule(Predator, Normal), Rule::Chase);
        assert_eq!(rule(Predator, Leader), Rule::Chase);
        assert_eq!(rule(Predator, Predator), Rule::Align);
        assert_eq!(rule(Predator, Wall), Rule::Repel);
    }

    #[test]
    fn test_follow_weights_leader() {
        let target = agent(AgentKind::Normal, 0.0, 0.0, 1.0, 0.0);
        let leader = agent(AgentKind::Leader, 1.0, 0.0, 0.0, 1.0);
        let c = Rule::Follow.contribution(&target, &Sensed::from(&leader), 2);
        assert_eq!(c.heading, Vector::xy(0.0, 5.0));
        assert_eq!(c.speed, 1.0);
    }

    #[test]
    fn test_chase_is_unit_vector_toward_prey() {
        let predator = agent(AgentKind::Predator, 0.0, 0.0, 1.0, 0.0);
        let prey = agent(AgentKind::Normal, 0.0, 4.0, 1.0, 0.0);
        let c = Rule::Chase.contribution(&predator, &Sensed::from(&prey), 2);
        assert!((c.heading[0]).abs() < 1e-12);
        assert!((c.heading[1] - 1.0).abs() < 1e-12);
        assert!((c.speed - 1.25).abs() < 1e-12);

        // Coincident prey contributes no direction
        let on_top = agent(AgentKind::Normal, 0.0, 0.0, 1.0, 0.0);
        let c = Rule::Chase.contribution(&predator, &Sensed::from(&on_top), 2);
        assert_eq!(c.heading, Vector::zeros(2));
    }

    #[test]
    fn test_flee_scales_with_fear_and_count() {
        let prey = agent(AgentKind::Normal, 1.0, 0.0, 1.0, 0.0).with_fear(0.5);
        let predator = agent(AgentKind::Predator, 0.0, 0.0, 1.0, 0.0);
        let c = Rule::Flee.contribution(&prey, &Sensed::from(&predator), 4);
        assert_eq!(c.heading, Vector::xy(2.0, 0.0));
    }

    #[test]
    fn test_repel_pushes_back_inside() {
        let target = agent(AgentKind::Normal, 24.0, 0.0, 1.0, 0.0);
        let wall = Sensed::wall(Vector::xy(25.0, 0.0));
        let c = Rule::Repel.contribution(&target, &wall, 2);
        assert_eq!(c.heading, Vector::xy(-200.0, 0.0));
        assert_eq!(c.speed, 0.0);
    }

    #[test]
    fn test_position_uses_previous_heading() {
        let target = agent(AgentKind::Normal, 0.0, 0.0, 1.0, 0.0);
        let other = agent(AgentKind::Normal, 1.0, 0.0, 0.0, 1.0);
        let neighbors = [Sensed::from(&target), Sensed::from(&other)];

        let motion = next_motion(&target, &neighbors, Vector::zeros(2), 0.5, &domain()).unwrap();

        assert_eq!(motion.position, Vector::xy(0.5, 0.0));
        let expected = 1.0 / 2f64.sqrt();
        assert!((motion.heading[0] - expected).abs() < 1e-12);
        assert!((motion.heading[1] - expected).abs() < 1e-12);
        assert_eq!(motion.speed, 1.0);
    }

    #[test]
    fn test_speed_clamped_to_max() {
        let target = agent(AgentKind::Normal, 0.0, 0.0, 1.0, 0.0);
        let mut fast = agent(AgentKind::Normal, 1.0, 0.0, 1.0, 0.0);
        fast.speed = 9.0;
        let neighbors = [Sensed::from(&target), Sensed::from(&fast)];

        let motion = next_motion(&target, &neighbors, Vector::zeros(2), 0.5, &domain()).unwrap();
        assert_eq!(motion.speed, target.max_speed);
    }

    #[test]
    fn test_walls_excluded_from_speed_average() {
        let target = agent(AgentKind::Normal, 24.0, 0.0, 1.0, 0.0);
        let neighbors = [Sensed::from(&target), Sensed::wall(Vector::xy(25.0, 0.0))];

        let motion = next_motion(&target, &neighbors, Vector::zeros(2), 0.5, &domain()).unwrap();
        assert_eq!(motion.speed, 1.0);
        // Repulsion dominates alignment
        assert!(motion.heading[0] < 0.0);
    }

    #[test]
    fn test_no_members_means_no_update() {
        let target = agent(AgentKind::Normal, 24.0, 0.0, 1.0, 0.0);
        let neighbors = [Sensed::wall(Vector::xy(25.0, 0.0))];
        assert!(next_motion(&target, &neighbors, Vector::zeros(2), 0.5, &domain()).is_none());
        assert!(next_motion(&target, &[], Vector::zeros(2), 0.5, &domain()).is_none());
    }

    #[test]
    fn test_cancelling_headings_keep_previous() {
        let target = agent(AgentKind::Normal, 0.0, 0.0, 1.0, 0.0);
        let other = agent(AgentKind::Normal, 1.0, 0.0, -1.0, 0.0);
        let neighbors = [Sensed::from(&target), Sensed::from(&other)];

        let motion = next_motion(&target, &neighbors, Vector::zeros(2), 0.5, &domain()).unwrap();
        assert_eq!(motion.heading, target.heading);
    }

    #[test]
    fn test_noise_bounds() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let n = sample_noise(&mut rng, 3, 0.8);
            for &c in n.as_slice() {
                assert!(c.abs() <= 0.4);
            }
        }
    }
}
