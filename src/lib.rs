//! # VICSEK
//!
//! Collective motion of self-propelled agents, with predators, leaders,
//! limited field of view and closed or toroidal boundaries.
//!
//! ## Features
//!
//! - **Heterogeneous roles**: normal agents align, leaders pull, predators hunt
//! - **Two update modes**: sequential in-place sweep or double-buffered parallel sweep
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: Seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust
//! use vicsek::{generate_from_config, Config};
//!
//! let mut config = Config::default();
//! config.population.seed = Some(42);
//!
//! let mut group = generate_from_config(&config).unwrap();
//! group.run(100, true, true, 0.5);
//!
//! println!("Order parameter: {:.3}", group.order_parameter());
//! println!("Density: {:.4}", group.density());
//! ```
//!
//! ## Predation
//!
//! ```rust
//! use vicsek::{Agent, AgentKind, Group, Vector};
//!
//! let predator = Agent::new(
//!     Vector::xy(0.0, 0.0),
//!     Vector::xy(1.0, 0.0),
//!     1.0,
//!     0.0,
//!     5.0,
//!     AgentKind::Predator,
//! )
//! .unwrap();
//! let prey = Agent::new(
//!     Vector::xy(0.1, 0.0),
//!     Vector::xy(1.0, 0.0),
//!     1.0,
//!     0.0,
//!     5.0,
//!     AgentKind::Normal,
//! )
//! .unwrap();
//!
//! let mut group = Group::new(vec![predator, prey], 50.0, 2).unwrap();
//! group.run(1, true, true, 0.5);
//! assert_eq!(group.dead_count(), 1);
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod group;
pub mod interaction;
pub mod neighbors;
pub mod space;
pub mod stats;
pub mod sweep;
pub mod vector;

// Re-export main types
pub use agent::{Agent, AgentKind};
pub use config::Config;
pub use error::{ConfigError, SimError};
pub use generator::{generate_agent, generate_from_config, generate_group, AgentRanges, ParamRange};
pub use group::{Group, PredationConfig, RunOptions, UpdateMode};
pub use vector::Vector;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, population: usize, mode: UpdateMode) -> error::Result<BenchmarkResult> {
    use std::time::Instant;

    let mut config = Config::default();
    config.population.count = population;
    config.population.seed = Some(0);

    let mut group = generate_from_config(&config)?;
    let options = RunOptions {
        mode,
        ..config.run.options()
    };

    let start = Instant::now();
    group.run_with(steps, &options);
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        population,
        mode,
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
        order_parameter: group.order_parameter(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub population: usize,
    pub mode: UpdateMode,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub order_parameter: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Population: {}", self.population)?;
        writeln!(f, "Mode: {:?}", self.mode)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        writeln!(f, "Final order parameter: {:.3}", self.order_parameter)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut config = Config::default();
        config.population.seed = Some(1);
        let mut group = generate_from_config(&config).unwrap();

        group.run(100, true, true, 0.5);

        assert_eq!(group.time, 100);
        assert_eq!(group.len(), 50);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(20, 50, UpdateMode::Synchronous).unwrap();

        assert_eq!(result.steps, 20);
        assert!(result.steps_per_second > 0.0);
        assert!(result.to_string().contains("Synchronous"));
    }
}
