//! Configuration system for the simulator.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::error::ConfigError;
use crate::generator::AgentRanges;
use crate::group::{PredationConfig, RunOptions, UpdateMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    /// Ranges for normal agents and leaders
    pub agents: AgentRanges,
    #[serde(default = "AgentRanges::predator")]
    pub predators: AgentRanges,
    pub run: RunConfig,
    #[serde(default)]
    pub predation: PredationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of normal agents
    pub count: usize,
    /// Number of predators added after the normal agents
    #[serde(default)]
    pub predators: usize,
    /// Number of leaders added after the normal agents
    #[serde(default)]
    pub leaders: usize,
    /// Side length of the cubic domain
    pub domain_length: f64,
    /// Space dimension (2 or 3)
    pub dimension: usize,
    /// Seed for generation and noise; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of steps to simulate
    pub steps: u64,
    /// Time step
    pub dt: f64,
    pub use_field_of_view: bool,
    /// Wall repulsion at the domain faces
    pub use_walls: bool,
    #[serde(default)]
    pub mode: UpdateMode,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Steps between stats snapshots
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            agents: AgentRanges::default(),
            predators: AgentRanges::predator(),
            run: RunConfig::default(),
            predation: PredationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            count: 50,
            predators: 0,
            leaders: 0,
            domain_length: 50.0,
            dimension: 2,
            seed: None,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            dt: 0.5,
            use_field_of_view: true,
            use_walls: true,
            mode: UpdateMode::Sequential,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 10,
            log_level: "info".to_string(),
        }
    }
}

impl RunConfig {
    /// Per-step options for [`crate::Group::run_with`]
    pub fn options(&self) -> RunOptions {
        RunOptions {
            use_field_of_view: self.use_field_of_view,
            use_walls: self.use_walls,
            dt: self.dt,
            mode: self.mode,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        let pop = &self.population;

        if !(2..=3).contains(&pop.dimension) {
            return invalid("dimension must be 2 or 3");
        }
        if !(pop.domain_length.is_finite() && pop.domain_length > 0.0) {
            return invalid("domain_length must be > 0");
        }
        if pop.count + pop.predators + pop.leaders == 0 {
            return invalid("population must contain at least one agent");
        }
        if !(self.run.dt.is_finite() && self.run.dt > 0.0) {
            return invalid("dt must be > 0");
        }
        if !(0.0..=1.0).contains(&self.predation.kill_fraction) {
            return invalid("kill_fraction must be between 0 and 1");
        }
        if self.logging.stats_interval == 0 {
            return invalid("stats_interval must be > 0");
        }
        self.agents
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("agents: {}", e)))?;
        self.predators
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("predators: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.population.count, loaded.population.count);
        assert_eq!(config.agents, loaded.agents);
        assert_eq!(loaded.run.mode, UpdateMode::Sequential);
    }

    #[test]
    fn test_optional_sections_default() {
        let yaml = r#"
population:
  count: 10
  domain_length: 20.0
  dimension: 3
agents:
  position: { min: -10.0, max: 10.0 }
  speed: { min: -1.0, max: 1.0 }
  noise: { min: 0.5, max: 0.5 }
  sight: { min: 2.0, max: 4.0 }
  field_of_view: { min: 0.5, max: 1.0 }
  fear: { min: 0.0, max: 1.0 }
run:
  steps: 20
  dt: 0.25
  use_field_of_view: false
  use_walls: false
  mode: synchronous
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.population.predators, 0);
        assert_eq!(config.predators, AgentRanges::predator());
        assert!(config.predation.enabled);
        assert_eq!(config.run.options().mode, UpdateMode::Synchronous);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.population.dimension = 4;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.agents.noise.min = 2.0;
        config.agents.noise.max = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.run.dt = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.population.seed = Some(99);
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.population.seed, Some(99));
    }
}
