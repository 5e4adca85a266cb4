//! Random construction of agents and groups within parameter ranges.

use crate::agent::{Agent, AgentKind};
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::group::Group;
use crate::vector::Vector;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, FRAC_PI_8};

/// Raw headings shorter than this are redrawn
pub const MIN_HEADING_NORM: f64 = 1e-3;

/// Closed interval a parameter is drawn from uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Always yields `value`
    pub const fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    /// A single uniform draw in `[0, 1)`
    pub const fn random() -> Self {
        Self::new(0.0, 1.0)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min + (self.max - self.min) * rng.gen::<f64>()
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Sampling ranges for every generated agent parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentRanges {
    /// Per-axis position bounds
    pub position: ParamRange,
    /// Per-axis bounds of the raw velocity draw
    pub speed: ParamRange,
    pub noise: ParamRange,
    pub sight: ParamRange,
    /// Half-angle of the vision cone, radians
    pub field_of_view: ParamRange,
    pub fear: ParamRange,
}

impl Default for AgentRanges {
    fn default() -> Self {
        Self {
            position: ParamRange::new(-25.0, 25.0),
            speed: ParamRange::new(-2.0, 2.0),
            noise: ParamRange::new(0.0, 1.0),
            sight: ParamRange::new(5.0, 10.0),
            field_of_view: ParamRange::new(FRAC_PI_8, FRAC_PI_4),
            fear: ParamRange::new(0.0, 1.0),
        }
    }
}

impl AgentRanges {
    /// Faster, slightly noisy hunters
    pub fn predator() -> Self {
        Self {
            speed: ParamRange::new(-3.0, 3.0),
            noise: ParamRange::fixed(0.25),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let named = [
            ("position", self.position),
            ("speed", self.speed),
            ("noise", self.noise),
            ("sight", self.sight),
            ("field_of_view", self.field_of_view),
            ("fear", self.fear),
        ];
        for (name, range) in named {
            if !range.is_valid() {
                return Err(format!("{} range must satisfy min <= max", name));
            }
        }
        if self.noise.min < 0.0 || self.sight.min < 0.0 {
            return Err("noise and sight must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Generate one agent of the given kind.
///
/// The raw velocity is redrawn until its norm exceeds [`MIN_HEADING_NORM`];
/// its direction becomes the heading and its norm the speed. A speed range
/// that cannot reach that norm yields a motionless agent.
pub fn generate_agent<R: Rng + ?Sized>(
    rng: &mut R,
    ranges: &AgentRanges,
    kind: AgentKind,
    dimension: usize,
) -> Result<Agent> {
    if !(2..=3).contains(&dimension) {
        return Err(SimError::InvalidDimension(dimension));
    }

    let position = Vector::random_in_box(rng, dimension, ranges.position.min, ranges.position.max);
    let noise = ranges.noise.sample(rng);
    let sight = ranges.sight.sample(rng);
    let field_of_view = ranges.field_of_view.sample(rng);
    let fear = ranges.fear.sample(rng);

    let reach = ranges.speed.min.abs().max(ranges.speed.max.abs()) * (dimension as f64).sqrt();
    let mut raw = Vector::zeros(dimension);
    if reach > MIN_HEADING_NORM {
        while raw.norm() <= MIN_HEADING_NORM {
            raw = Vector::random_in_box(rng, dimension, ranges.speed.min, ranges.speed.max);
        }
    }

    let agent = Agent::new(position, raw, raw.norm(), noise, sight, kind)?
        .with_field_of_view(field_of_view)
        .with_fear(fear);
    Ok(agent)
}

/// Generate a group of `count` normal agents
pub fn generate_group<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    ranges: &AgentRanges,
    domain_length: f64,
    dimension: usize,
) -> Result<Group> {
    let agents = (0..count)
        .map(|_| generate_agent(rng, ranges, AgentKind::Normal, dimension))
        .collect::<Result<Vec<_>>>()?;
    let seed = rng.gen();
    Group::new_with_seed(agents, domain_length, dimension, seed)
}

/// Generate the initial group described by a configuration: normal agents,
/// then leaders, then predators. Seeded from `population.seed` when set.
pub fn generate_from_config(config: &Config) -> Result<Group> {
    let seed = config
        .population
        .seed
        .unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let pop = &config.population;

    let mut group = generate_group(
        &mut rng,
        pop.count,
        &config.agents,
        pop.domain_length,
        pop.dimension,
    )?
    .with_predation(config.predation);

    for _ in 0..pop.leaders {
        let leader = generate_agent(&mut rng, &config.agents, AgentKind::Leader, pop.dimension)?;
        group.add_agent(&leader)?;
    }
    for _ in 0..pop.predators {
        let predator =
            generate_agent(&mut rng, &config.predators, AgentKind::Predator, pop.dimension)?;
        group.add_agent(&predator)?;
    }

    group.reseed(seed);
    Ok(group)
}
