//! Statistics tracking for the simulation.

use crate::agent::Agent;
use crate::group::Group;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Statistics snapshot for a simulation step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Steps performed so far
    pub time: u64,
    /// Live agent count
    pub population: usize,
    /// Agents removed by predation
    pub dead: usize,
    /// Live agents per unit volume
    pub density: f64,
    pub order_parameter: f64,
    /// Mean noise over non-predator agents
    pub noise_mean: f64,
    /// Mean fear over non-predator agents
    pub fear_mean: f64,
    /// Mean max speed over non-predator agents
    pub max_speed_mean: f64,
    /// Live predator count
    pub predators: usize,
}

impl Stats {
    /// Snapshot the current state of a group
    pub fn from_group(group: &Group) -> Self {
        let mut stats = Self {
            time: group.time,
            population: group.len(),
            dead: group.dead_count(),
            density: group.density(),
            order_parameter: group.order_parameter(),
            ..Self::default()
        };

        let prey: Vec<&Agent> = group
            .agents()
            .iter()
            .filter(|a| !a.kind.is_predator())
            .collect();
        stats.predators = group.len() - prey.len();

        if !prey.is_empty() {
            let n = prey.len() as f64;
            stats.noise_mean = prey.iter().map(|a| a.noise).sum::<f64>() / n;
            stats.fear_mean = prey.iter().map(|a| a.fear).sum::<f64>() / n;
            stats.max_speed_mean = prey.iter().map(|a| a.max_speed).sum::<f64>() / n;
        }

        stats
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "T:{:6} | Pop:{:5} | Dead:{:4} | Rho:{:.4} | Phi:{:.3} | Noise:{:.2} | Fear:{:.2}",
            self.time,
            self.population,
            self.dead,
            self.density,
            self.order_parameter,
            self.noise_mean,
            self.fear_mean,
        );
        if self.predators > 0 {
            line.push_str(&format!(" | Pred:{}", self.predators));
        }
        line
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval
    pub interval: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Snapshot `group` when its time falls on the recording interval
    pub fn maybe_record(&mut self, group: &Group) -> Option<&Stats> {
        if self.interval == 0 || group.time % self.interval != 0 {
            return None;
        }
        self.record(Stats::from_group(group));
        self.snapshots.last()
    }

    /// Get stats at a specific time (approximate)
    pub fn get_at(&self, time: u64) -> Option<&Stats> {
        if self.interval == 0 {
            return None;
        }
        let index = (time / self.interval) as usize;
        self.snapshots.get(index)
    }

    /// Order parameter over time
    pub fn order_series(&self) -> Vec<(u64, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.order_parameter))
            .collect()
    }

    /// Get population over time
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.population))
            .collect()
    }

    /// Save history to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from file
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Export agent states to CSV, one row per agent
pub fn export_agents_csv<P: AsRef<Path>>(agents: &[Agent], path: P) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "index,kind,x,y,z,vx,vy,vz,speed,noise,sight,fov,fear")?;

    for (i, agent) in agents.iter().enumerate() {
        let p = agent.position;
        let v = agent.velocity();
        let z = |c: &[f64]| c.get(2).copied().unwrap_or(0.0);
        writeln!(
            file,
            "{},{:?},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.4},{:.4},{:.4},{:.4}",
            i,
            agent.kind,
            p[0],
            p[1],
            z(p.as_slice()),
            v[0],
            v[1],
            z(v.as_slice()),
            agent.speed,
            agent.noise,
            agent.sight_radius,
            agent.field_of_view,
            agent.fear,
        )?;
    }

    Ok(())
}
