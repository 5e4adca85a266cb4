//! Small fixed-capacity vectors for 2D and 3D geometry.

use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub};

/// A point or direction in 2 or 3 dimensional space.
///
/// Unused trailing components are kept at zero so equality and norms
/// behave the same for both dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    coords: [f64; 3],
    dim: u8,
}

impl Vector {
    /// Planar vector
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            coords: [x, y, 0.0],
            dim: 2,
        }
    }

    /// Spatial vector
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            coords: [x, y, z],
            dim: 3,
        }
    }

    /// Zero vector of the given dimension (clamped to 2..=3)
    pub fn zeros(dim: usize) -> Self {
        Self {
            coords: [0.0; 3],
            dim: dim.clamp(2, 3) as u8,
        }
    }

    /// Build from a slice of 2 or 3 components
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [x, y] => Ok(Self::xy(*x, *y)),
            [x, y, z] => Ok(Self::xyz(*x, *y, *z)),
            _ => Err(SimError::InvalidDimension(values.len())),
        }
    }

    /// Uniform sample in the box `[min, max)^dim`
    pub fn random_in_box<R: Rng + ?Sized>(rng: &mut R, dim: usize, min: f64, max: f64) -> Self {
        let mut v = Self::zeros(dim);
        for i in 0..v.dim() {
            v.coords[i] = min + (max - min) * rng.gen::<f64>();
        }
        v
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim as usize
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.coords[..self.dim()]
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Euclidean norm
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance(&self, other: &Vector) -> f64 {
        (*self - *other).norm()
    }

    /// Unit vector in the same direction, or `None` for a zero vector
    pub fn normalized(&self) -> Option<Vector> {
        let n = self.norm();
        if n > 0.0 && n.is_finite() {
            Some(*self / n)
        } else {
            None
        }
    }

    /// Angle of the (x, y) projection with the x axis, in `[0, 2π)`
    #[inline]
    pub fn planar_angle(&self) -> f64 {
        self.coords[1].atan2(self.coords[0]).rem_euclid(TAU)
    }
}

/// Smallest absolute difference between two angles, in `[0, π]`
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(TAU);
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.as_slice()[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        let dim = self.dim();
        &mut self.coords[..dim][index]
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        debug_assert_eq!(self.dim, other.dim);
        Self {
            coords: [
                self.coords[0] + other.coords[0],
                self.coords[1] + other.coords[1],
                self.coords[2] + other.coords[2],
            ],
            dim: self.dim,
        }
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self {
        self * -1.0
    }
}

impl Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self {
            coords: [
                self.coords[0] * scalar,
                self.coords[1] * scalar,
                self.coords[2] * scalar,
            ],
            dim: self.dim,
        }
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, v: Vector) -> Vector {
        v * self
    }
}

impl Div<f64> for Vector {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        self * (1.0 / scalar)
    }
}
