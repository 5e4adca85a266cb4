//! Simulation domain: a (hyper)cube of side `length` centred at the origin.

use crate::error::{Result, SimError};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// Cubic domain spanning `[-L/2, L/2]` on every axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    dimension: usize,
    length: f64,
}

impl Domain {
    pub fn new(dimension: usize, length: f64) -> Result<Self> {
        if !(2..=3).contains(&dimension) {
            return Err(SimError::InvalidDimension(dimension));
        }
        if !(length.is_finite() && length > 0.0) {
            return Err(SimError::InvalidDomain(length));
        }
        Ok(Self { dimension, length })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[inline]
    pub fn half(&self) -> f64 {
        self.length / 2.0
    }

    /// Domain volume (area in 2D)
    pub fn volume(&self) -> f64 {
        self.length.powi(self.dimension as i32)
    }

    /// Wrap every component that left `[-L/2, L/2]` back in from the opposite edge
    pub fn wrap(&self, position: &mut Vector) {
        let half = self.half();
        for i in 0..position.dim() {
            let p = position[i];
            if p > half || p < -half {
                position[i] = (p + half).rem_euclid(self.length) - half;
            }
        }
    }

    /// Nearest point on each face to `position`: two per axis, low face first
    pub fn wall_contacts(&self, position: &Vector) -> impl Iterator<Item = Vector> + '_ {
        let position = *position;
        let half = self.half();
        (0..self.dimension).flat_map(move |axis| {
            [-half, half].into_iter().map(move |face| {
                let mut contact = position;
                contact[axis] = face;
                contact
            })
        })
    }
}
