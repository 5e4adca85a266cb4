//! Error types for the simulation core and configuration layer.

use thiserror::Error;

/// Errors raised by group construction and mutation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Space dimension outside {2, 3}
    #[error("dimension must be 2 or 3, got {0}")]
    InvalidDimension(usize),

    /// Agent vectors disagree with the group (or with each other)
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Boundary contacts are synthesized per query and never stored
    #[error("wall contacts cannot be group members")]
    WallAgent,

    /// Domain side length must be finite and positive
    #[error("invalid domain length: {0}")]
    InvalidDomain(f64),

    /// Sight radius must be finite and non-negative
    #[error("invalid sight radius: {0}")]
    InvalidSightRadius(f64),
}

/// Errors raised while loading, saving or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
