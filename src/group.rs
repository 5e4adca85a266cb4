//! Group of agents - the population-level simulation loop.

use crate::agent::{Agent, AgentKind};
use crate::error::{Result, SimError};
use crate::grid::SpatialIndex;
use crate::interaction::{next_motion, sample_noise, Motion};
use crate::neighbors::{NeighborQuery, Neighborhood};
use crate::space::Domain;
use crate::vector::Vector;
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How agents within one step see each other's updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Agents update in collection order and later agents see earlier
    /// agents' new state within the same step
    #[default]
    Sequential,
    /// Every agent reads the state at the start of the step
    Synchronous,
}

/// Per-step options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    pub use_field_of_view: bool,
    pub use_walls: bool,
    pub dt: f64,
    #[serde(default)]
    pub mode: UpdateMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_field_of_view: true,
            use_walls: true,
            dt: 0.5,
            mode: UpdateMode::Sequential,
        }
    }
}

/// Predation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredationConfig {
    /// Is predation enabled
    pub enabled: bool,
    /// Kill distance as a fraction of the domain length
    pub kill_fraction: f64,
}

impl Default for PredationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kill_fraction: 1.0 / 25.0,
        }
    }
}

impl PredationConfig {
    pub fn kill_distance(&self, domain_length: f64) -> Option<f64> {
        (self.enabled && self.kill_fraction > 0.0).then(|| self.kill_fraction * domain_length)
    }
}

/// A population of agents sharing one domain.
///
/// Cloning yields a fully independent group, dead ledger and RNG state
/// included; use [`Group::fork`] to branch with fresh noise.
#[derive(Clone, Debug)]
pub struct Group {
    agents: Vec<Agent>,
    dead_agents: Vec<Agent>,
    domain: Domain,
    predation: PredationConfig,

    /// Steps performed so far
    pub time: u64,

    // Agents ever admitted, for ledger checks
    admitted: usize,

    rng: ChaCha8Rng,
    seed: u64,
}

impl Group {
    /// Create a group with a random noise seed
    pub fn new(agents: Vec<Agent>, domain_length: f64, dimension: usize) -> Result<Self> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(agents, domain_length, dimension, seed)
    }

    /// Create a group whose noise is reproducible from `seed`
    pub fn new_with_seed(
        agents: Vec<Agent>,
        domain_length: f64,
        dimension: usize,
        seed: u64,
    ) -> Result<Self> {
        let domain = Domain::new(dimension, domain_length)?;
        for agent in &agents {
            check_agent(agent, dimension)?;
        }

        Ok(Self {
            admitted: agents.len(),
            agents,
            dead_agents: Vec::new(),
            domain,
            predation: PredationConfig::default(),
            time: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        })
    }

    pub fn with_predation(mut self, predation: PredationConfig) -> Self {
        self.predation = predation;
        self
    }

    /// Append a copy of `agent`
    pub fn add_agent(&mut self, agent: &Agent) -> Result<()> {
        check_agent(agent, self.dimension())?;
        self.agents.push(agent.clone());
        self.admitted += 1;
        Ok(())
    }

    /// Restart the noise stream from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
    }

    /// Independent copy with its own noise stream
    pub fn fork(&self, seed: u64) -> Self {
        let mut copy = self.clone();
        copy.reseed(seed);
        copy
    }

    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable access to agent parameters. Positions and headings must keep
    /// the group's dimension.
    #[inline]
    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Snapshots of agents removed by predation, in order of death
    #[inline]
    pub fn dead_agents(&self) -> &[Agent] {
        &self.dead_agents
    }

    #[inline]
    pub fn dead_count(&self) -> usize {
        self.dead_agents.len()
    }

    /// Live agent count
    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Count of agents ever part of the group
    #[inline]
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.domain.dimension()
    }

    #[inline]
    pub fn domain_length(&self) -> f64 {
        self.domain.length()
    }

    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    #[inline]
    pub fn predation(&self) -> &PredationConfig {
        &self.predation
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Live agents per unit volume
    pub fn density(&self) -> f64 {
        self.agents.len() as f64 / self.domain.volume()
    }

    /// Neighbor set of the agent at `index` against the current state
    pub fn neighbors(
        &self,
        index: usize,
        radius: f64,
        use_field_of_view: bool,
        use_walls: bool,
    ) -> Neighborhood {
        NeighborQuery::new(&self.agents, &self.domain).neighbors(
            index,
            radius,
            use_field_of_view,
            use_walls,
        )
    }

    /// Alignment of the whole group: `|Σ v| / Σ |v|`, in `[0, 1]`.
    /// Zero when no agent is moving.
    pub fn order_parameter(&self) -> f64 {
        let mut total = Vector::zeros(self.dimension());
        let mut magnitude = 0.0;
        for agent in &self.agents {
            let v = agent.velocity();
            total += v;
            magnitude += v.norm();
        }

        if magnitude > 0.0 {
            (total.norm() / magnitude).min(1.0)
        } else {
            0.0
        }
    }

    /// Positions and velocities, one row per live agent
    pub fn positions_and_velocities(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = (self.agents.len(), self.dimension());
        let positions = Array2::from_shape_fn(shape, |(i, j)| self.agents[i].position[j]);
        let velocities = Array2::from_shape_fn(shape, |(i, j)| self.agents[i].velocity()[j]);
        (positions, velocities)
    }

    /// Run `steps` steps in sequential mode
    pub fn run(&mut self, steps: u64, use_field_of_view: bool, use_walls: bool, dt: f64) {
        let options = RunOptions {
            use_field_of_view,
            use_walls,
            dt,
            mode: UpdateMode::Sequential,
        };
        self.run_with(steps, &options);
    }

    pub fn run_with(&mut self, steps: u64, options: &RunOptions) {
        for _ in 0..steps {
            self.step(options);
        }
    }

    /// Run with callback for progress updates
    pub fn run_with_callback<F>(&mut self, steps: u64, options: &RunOptions, mut callback: F)
    where
        F: FnMut(&Group, u64),
    {
        for i in 0..steps {
            self.step(options);
            callback(self, i);
        }
    }

    /// Advance every live agent by one step
    pub fn step(&mut self, options: &RunOptions) {
        let dead_before = self.dead_agents.len();

        let removed = match options.mode {
            UpdateMode::Sequential => self.sweep_sequential(options),
            UpdateMode::Synchronous => self.sweep_synchronous(options),
        };
        self.compact(&removed);

        self.time += 1;
        let killed = self.dead_agents.len() - dead_before;
        if killed > 0 {
            log::debug!(
                "step {}: {} agents caught, {} alive",
                self.time,
                killed,
                self.agents.len()
            );
        }
    }

    /// Asynchronous sweep: each agent moves immediately and the spatial
    /// index follows it, so later agents see the new state.
    fn sweep_sequential(&mut self, options: &RunOptions) -> Vec<bool> {
        let n = self.agents.len();
        let dim = self.dimension();
        let kill_distance = self.predation.kill_distance(self.domain.length());
        let mut removed = vec![false; n];
        let mut index = SpatialIndex::build(&self.domain, &self.agents);

        for i in 0..n {
            if removed[i] {
                continue;
            }

            if let Some(distance) = kill_distance {
                let victims = NeighborQuery::new(&self.agents, &self.domain)
                    .with_index(&index)
                    .with_removed(&removed)
                    .detect_kills(i, distance);
                self.record_kills(i, &victims, &mut removed);
            }

            let sensed = NeighborQuery::new(&self.agents, &self.domain)
                .with_index(&index)
                .with_removed(&removed)
                .neighbors(
                    i,
                    self.agents[i].sight_radius,
                    options.use_field_of_view,
                    options.use_walls,
                )
                .sensed(&self.agents);
            let noise = sample_noise(&mut self.rng, dim, self.agents[i].noise);

            match next_motion(&self.agents[i], &sensed, noise, options.dt, &self.domain) {
                Some(motion) => {
                    let from = self.agents[i].position;
                    self.agents[i].apply(motion);
                    index.relocate(&from, &motion.position, i);
                }
                None => log::warn!("agent {} sensed no neighbors, state kept", i),
            }
        }

        removed
    }

    /// Double-buffered sweep: predation first, then all motions computed in
    /// parallel from the same snapshot and applied together.
    fn sweep_synchronous(&mut self, options: &RunOptions) -> Vec<bool> {
        let n = self.agents.len();
        let dim = self.dimension();
        let kill_distance = self.predation.kill_distance(self.domain.length());
        let mut removed = vec![false; n];
        let index = SpatialIndex::build(&self.domain, &self.agents);

        if let Some(distance) = kill_distance {
            for i in 0..n {
                if removed[i] {
                    continue;
                }
                let victims = NeighborQuery::new(&self.agents, &self.domain)
                    .with_index(&index)
                    .with_removed(&removed)
                    .detect_kills(i, distance);
                self.record_kills(i, &victims, &mut removed);
            }
        }

        // Pre-draw noise so results do not depend on thread scheduling
        let noises: Vec<Vector> = self
            .agents
            .iter()
            .map(|a| sample_noise(&mut self.rng, dim, a.noise))
            .collect();

        let motions: Vec<Option<Motion>> = {
            let query = NeighborQuery::new(&self.agents, &self.domain)
                .with_index(&index)
                .with_removed(&removed);
            let agents = &self.agents;
            let domain = &self.domain;
            let removed = &removed;

            (0..n)
                .into_par_iter()
                .map(|i| {
                    if removed[i] {
                        return None;
                    }
                    let sensed = query
                        .neighbors(
                            i,
                            agents[i].sight_radius,
                            options.use_field_of_view,
                            options.use_walls,
                        )
                        .sensed(agents);
                    next_motion(&agents[i], &sensed, noises[i], options.dt, domain)
                })
                .collect()
        };

        for (i, (agent, motion)) in self.agents.iter_mut().zip(motions).enumerate() {
            match motion {
                Some(motion) => agent.apply(motion),
                None if !removed[i] => log::warn!("agent {} sensed no neighbors, state kept", i),
                None => {}
            }
        }

        removed
    }

    /// Snapshot victims into the ledger and hide them from later queries
    fn record_kills(&mut self, predator: usize, victims: &[usize], removed: &mut [bool]) {
        for &victim in victims {
            removed[victim] = true;
            self.dead_agents.push(self.agents[victim].clone());
            log::trace!("predator {} caught agent {}", predator, victim);
        }
    }

    /// Drop removed agents, keeping collection order
    fn compact(&mut self, removed: &[bool]) {
        if !removed.iter().any(|&r| r) {
            return;
        }
        let mut flags = removed.iter();
        self.agents.retain(|_| !flags.next().copied().unwrap_or(false));
    }
}

fn check_agent(agent: &Agent, dimension: usize) -> Result<()> {
    if agent.kind == AgentKind::Wall {
        return Err(SimError::WallAgent);
    }
    if !(agent.sight_radius.is_finite() && agent.sight_radius >= 0.0) {
        return Err(SimError::InvalidSightRadius(agent.sight_radius));
    }
    for found in [agent.position.dim(), agent.heading.dim()] {
        if found != dimension {
            return Err(SimError::DimensionMismatch {
                expected: dimension,
                found,
            });
        }
    }
    Ok(())
}
