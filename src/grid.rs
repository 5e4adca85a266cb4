//! Spatial grid for fast neighbor queries in continuous space.

use crate::agent::Agent;
use crate::space::Domain;
use crate::vector::Vector;

/// Upper bound on cells per axis, keeps 3D grids from exploding
const fn max_cells_per_axis(dimension: usize) -> usize {
    if dimension == 2 {
        64
    } else {
        24
    }
}

/// Uniform cell list over the domain. Positions outside the domain are
/// clamped into the border cells, so every agent is always indexed.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    dimension: usize,
    half: f64,
    cell_size: f64,
    cells_per_axis: usize,
    /// Flattened cells, x fastest
    cells: Vec<Vec<usize>>,
}

impl SpatialIndex {
    /// Create an empty index whose cells are at least `min_cell_size` wide
    pub fn new(domain: &Domain, min_cell_size: f64) -> Self {
        let length = domain.length();
        let dimension = domain.dimension();
        let wanted = if min_cell_size.is_finite() && min_cell_size > 0.0 {
            (length / min_cell_size).floor() as usize
        } else {
            1
        };
        let cells_per_axis = wanted.clamp(1, max_cells_per_axis(dimension));

        Self {
            dimension,
            half: domain.half(),
            cell_size: length / cells_per_axis as f64,
            cells_per_axis,
            cells: vec![Vec::new(); cells_per_axis.pow(dimension as u32)],
        }
    }

    /// Index all agents, with cells sized to the largest sight radius
    pub fn build(domain: &Domain, agents: &[Agent]) -> Self {
        let max_sight = agents
            .iter()
            .map(|a| a.sight_radius)
            .fold(0.0f64, f64::max);
        let mut index = Self::new(domain, max_sight);
        for (idx, agent) in agents.iter().enumerate() {
            index.insert(&agent.position, idx);
        }
        index
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    #[inline]
    pub fn insert(&mut self, position: &Vector, idx: usize) {
        let cell = self.cell_of(position);
        self.cells[cell].push(idx);
    }

    /// Remove an entry previously inserted at `position`
    pub fn remove(&mut self, position: &Vector, idx: usize) -> bool {
        let cell = self.cell_of(position);
        let entries = &mut self.cells[cell];
        match entries.iter().position(|&i| i == idx) {
            Some(slot) => {
                entries.swap_remove(slot);
                true
            }
            None => false,
        }
    }

    /// Move an entry after its agent changed position
    pub fn relocate(&mut self, from: &Vector, to: &Vector, idx: usize) {
        if self.cell_of(from) != self.cell_of(to) {
            self.remove(from, idx);
            self.insert(to, idx);
        }
    }

    /// Indices of all entries in cells overlapping the box around `center`,
    /// sorted ascending. Callers still apply the exact distance test.
    pub fn query_radius(&self, center: &Vector, radius: f64) -> Vec<usize> {
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for axis in 0..self.dimension {
            lo[axis] = self.axis_cell(center[axis] - radius);
            hi[axis] = self.axis_cell(center[axis] + radius);
        }

        let n = self.cells_per_axis;
        let mut results = Vec::new();
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    results.extend_from_slice(&self.cells[x + n * (y + n * z)]);
                }
            }
        }

        results.sort_unstable();
        results
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    #[inline]
    pub fn cells_per_axis(&self) -> usize {
        self.cells_per_axis
    }

    #[inline]
    fn axis_cell(&self, coord: f64) -> usize {
        let cell = ((coord + self.half) / self.cell_size).floor();
        if cell.is_nan() || cell < 0.0 {
            0
        } else {
            (cell as usize).min(self.cells_per_axis - 1)
        }
    }

    #[inline]
    fn cell_of(&self, position: &Vector) -> usize {
        let n = self.cells_per_axis;
        let mut flat = 0;
        for axis in (0..self.dimension).rev() {
            flat = flat * n + self.axis_cell(position[axis]);
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::new(2, 50.0).unwrap()
    }

    #[test]
    fn test_cell_sizing() {
        let index = SpatialIndex::new(&domain(), 10.0);
        assert_eq!(index.cells_per_axis(), 5);

        // Tiny cells are capped
        let index = SpatialIndex::new(&domain(), 0.01);
        assert_eq!(index.cells_per_axis(), 64);

        // Cells wider than the domain collapse to one
        let index = SpatialIndex::new(&domain(), 100.0);
        assert_eq!(index.cells_per_axis(), 1);
    }

    #[test]
    fn test_spatial_index_basic() {
        let mut index = SpatialIndex::new(&domain(), 5.0);
        index.insert(&Vector::xy(1.0, 1.0), 0);
        index.insert(&Vector::xy(1.5, 1.2), 1);
        index.insert(&Vector::xy(-20.0, 20.0), 2);

        assert_eq!(index.len(), 3);
        assert_eq!(index.query_radius(&Vector::xy(1.0, 1.0), 1.0), vec![0, 1]);
    }

    #[test]
    fn test_spatial_query_radius() {
        let mut index = SpatialIndex::new(&domain(), 5.0);
        index.insert(&Vector::xy(0.0, 0.0), 3);
        index.insert(&Vector::xy(4.0, 0.0), 1);
        index.insert(&Vector::xy(0.0, -4.0), 2);
        index.insert(&Vector::xy(20.0, 20.0), 0); // Far away

        let results = index.query_radius(&Vector::xy(0.0, 0.0), 5.0);
        assert_eq!(results, vec![1, 2, 3]);
    }

    #[test]
    fn test_out_of_domain_positions_clamped() {
        let mut index = SpatialIndex::new(&domain(), 5.0);
        index.insert(&Vector::xy(-40.0, 0.0), 0);

        assert!(index.query_radius(&Vector::xy(-24.0, 0.0), 2.0).contains(&0));
        assert!(index.query_radius(&Vector::xy(-40.0, 0.0), 0.5).contains(&0));
    }

    #[test]
    fn test_relocate_and_remove() {
        let mut index = SpatialIndex::new(&domain(), 5.0);
        let from = Vector::xy(0.0, 0.0);
        let to = Vector::xy(20.0, 20.0);
        index.insert(&from, 7);

        index.relocate(&from, &to, 7);
        assert!(index.query_radius(&from, 1.0).is_empty());
        assert_eq!(index.query_radius(&to, 1.0), vec![7]);

        assert!(index.remove(&to, 7));
        assert!(!index.remove(&to, 7));
        assert!(index.is_empty());
    }

    #[test]
    fn test_three_dimensional_index() {
        let domain = Domain::new(3, 20.0).unwrap();
        let mut index = SpatialIndex::new(&domain, 4.0);
        index.insert(&Vector::xyz(0.0, 0.0, 9.0), 0);
        index.insert(&Vector::xyz(0.0, 0.0, -9.0), 1);

        assert_eq!(index.query_radius(&Vector::xyz(0.0, 0.0, 8.0), 2.0), vec![0]);
        assert_eq!(index.query_radius(&Vector::xyz(0.0, 0.0, 0.0), 10.0), vec![0, 1]);
    }
}
