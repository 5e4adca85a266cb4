//! Neighbor queries: distance cutoff, field of view, wall contacts and kill detection.
//!
//! Queries are pure reads of the population. Predation is a separate
//! [`NeighborQuery::detect_kills`] pass so callers decide when removals happen.

use crate::agent::Agent;
use crate::grid::SpatialIndex;
use crate::interaction::Sensed;
use crate::space::Domain;
use crate::vector::{angular_difference, Vector};

/// Result of a neighbor query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighborhood {
    /// Indices of sensed agents in collection order, the target included
    pub members: Vec<usize>,
    /// Wall contact points within range
    pub walls: Vec<Vector>,
}

impl Neighborhood {
    /// Size of the neighbor set, walls included
    pub fn len(&self) -> usize {
        self.members.len() + self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.walls.is_empty()
    }

    /// Perceived state of every neighbor: members first, then walls
    pub fn sensed(&self, agents: &[Agent]) -> Vec<Sensed> {
        self.members
            .iter()
            .map(|&i| Sensed::from(&agents[i]))
            .chain(self.walls.iter().map(|&w| Sensed::wall(w)))
            .collect()
    }
}

/// Is `point` inside the target's forward vision cone (planar angles only)
pub fn in_field_of_view(target: &Agent, point: &Vector) -> bool {
    let offset = *point - target.position;
    let diff = angular_difference(target.heading.planar_angle(), offset.planar_angle());
    diff <= target.field_of_view
}

/// Read-only view of a population used to answer neighbor queries
#[derive(Clone, Copy)]
pub struct NeighborQuery<'a> {
    agents: &'a [Agent],
    domain: &'a Domain,
    index: Option<&'a SpatialIndex>,
    removed: Option<&'a [bool]>,
}

impl<'a> NeighborQuery<'a> {
    pub fn new(agents: &'a [Agent], domain: &'a Domain) -> Self {
        Self {
            agents,
            domain,
            index: None,
            removed: None,
        }
    }

    /// Prune candidates with a spatial index built over the same agents
    pub fn with_index(mut self, index: &'a SpatialIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Ignore agents flagged in `removed` (same length as the agents)
    pub fn with_removed(mut self, removed: &'a [bool]) -> Self {
        self.removed = Some(removed);
        self
    }

    /// Neighbor set of agent `target`.
    ///
    /// An agent qualifies within `radius`. In 2D with `use_field_of_view`,
    /// it must also lie inside the target's vision cone unless it is a
    /// predator. The target is always part of its own neighbor set.
    pub fn neighbors(
        &self,
        target: usize,
        radius: f64,
        use_field_of_view: bool,
        use_walls: bool,
    ) -> Neighborhood {
        let me = &self.agents[target];
        let check_view = use_field_of_view && self.domain.dimension() == 2;

        let mut members: Vec<usize> = self
            .candidates(&me.position, radius)
            .into_iter()
            .filter(|&i| {
                if i == target {
                    return false;
                }
                let other = &self.agents[i];
                me.distance(other) <= radius
                    && (!check_view
                        || other.kind.is_predator()
                        || in_field_of_view(me, &other.position))
            })
            .collect();
        // Candidates are ascending, so this keeps collection order
        let slot = members.partition_point(|&i| i < target);
        members.insert(slot, target);

        let walls = if use_walls {
            self.domain
                .wall_contacts(&me.position)
                .filter(|w| me.position.distance(w) <= radius)
                .collect()
        } else {
            Vec::new()
        };

        Neighborhood { members, walls }
    }

    /// Prey within `kill_distance` (strict) of `target`, when it is a predator
    pub fn detect_kills(&self, target: usize, kill_distance: f64) -> Vec<usize> {
        let me = &self.agents[target];
        if !me.kind.is_predator() {
            return Vec::new();
        }

        self.candidates(&me.position, kill_distance)
            .into_iter()
            .filter(|&i| {
                let other = &self.agents[i];
                i != target && other.kind.is_prey() && me.distance(other) < kill_distance
            })
            .collect()
    }

    /// Live candidate indices in collection order
    fn candidates(&self, center: &Vector, radius: f64) -> Vec<usize> {
        let mut found = match self.index {
            Some(index) => index.query_radius(center, radius),
            None => (0..self.agents.len()).collect(),
        };
        if let Some(removed) = self.removed {
            found.retain(|&i| !removed[i]);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentKind;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn agent(kind: AgentKind, x: f64, y: f64) -> Agent {
        Agent::new(Vector::xy(x, y), Vector::xy(1.0, 0.0), 1.0, 0.0, 5.0, kind)
            .unwrap()
            .with_field_of_view(FRAC_PI_4)
    }

    fn domain() -> Domain {
        Domain::new(2, 50.0).unwrap()
    }

    #[test]
    fn test_target_always_included() {
        let agents = vec![agent(AgentKind::Normal, 0.0, 0.0)];
        let domain = domain();
        let hood = NeighborQuery::new(&agents, &domain).neighbors(0, 0.0, true, false);
        assert_eq!(hood.members, vec![0]);
    }

    #[test]
    fn test_target_included_with_index_and_negative_radius() {
        let agents = vec![
            agent(AgentKind::Normal, 0.0, 0.0),
            agent(AgentKind::Normal, 1.0, 0.0),
            agent(AgentKind::Normal, 2.0, 0.0),
        ];
        let domain = domain();
        let index = SpatialIndex::build(&domain, &agents);
        let indexed = NeighborQuery::new(&agents, &domain).with_index(&index);

        assert_eq!(indexed.neighbors(1, -1.0, false, false).members, vec![1]);
        assert_eq!(indexed.neighbors(1, 5.0, false, false).members, vec![0, 1, 2]);
    }

    #[test]
    fn test_distance_filter() {
        let agents = vec![
            agent(AgentKind::Normal, 0.0, 0.0),
            agent(AgentKind::Normal, 3.0, 0.0),
            agent(AgentKind::Normal, 6.0, 0.0),
        ];
        let domain = domain();
        let hood = NeighborQuery::new(&agents, &domain).neighbors(0, 5.0, false, false);
        assert_eq!(hood.members, vec![0, 1]);
    }

    #[test]
    fn test_field_of_view_excludes_agent_behind() {
        let agents = vec![
            agent(AgentKind::Normal, 0.0, 0.0),
            agent(AgentKind::Normal, -2.0, 0.0),
        ];
        let domain = domain();
        let query = NeighborQuery::new(&agents, &domain);

        assert!(agents[0].field_of_view < PI / 2.0);
        assert_eq!(query.neighbors(0, 5.0, true, false).members, vec![0]);
        assert_eq!(query.neighbors(0, 5.0, false, false).members, vec![0, 1]);
    }

    #[test]
    fn test_field_of_view_across_zero_angle() {
        // Heading at 350°, neighbor at 10°: 20° apart, inside a 45° cone
        let mut me = agent(AgentKind::Normal, 0.0, 0.0);
        let a = 350f64.to_radians();
        me.heading = Vector::xy(a.cos(), a.sin());
        let b = 10f64.to_radians();
        assert!(in_field_of_view(&me, &Vector::xy(b.cos(), b.sin())));
    }

    #[test]
    fn test_predators_always_felt() {
        let agents = vec![
            agent(AgentKind::Normal, 0.0, 0.0),
            agent(AgentKind::Predator, -2.0, 0.0),
        ];
        let domain = domain();
        let hood = NeighborQuery::new(&agents, &domain).neighbors(0, 5.0, true, false);
        assert_eq!(hood.members, vec![0, 1]);
    }

    #[test]
    fn test_field_of_view_ignored_in_3d() {
        let mk = |x: f64| {
            Agent::new(
                Vector::xyz(x, 0.0, 0.0),
                Vector::xyz(1.0, 0.0, 0.0),
                1.0,
                0.0,
                5.0,
                AgentKind::Normal,
            )
            .unwrap()
            .with_field_of_view(0.1)
        };
        let agents = vec![mk(0.0), mk(-2.0)];
        let domain = Domain::new(3, 50.0).unwrap();
        let hood = NeighborQuery::new(&agents, &domain).neighbors(0, 5.0, true, false);
        assert_eq!(hood.members, vec![0, 1]);
    }

    #[test]
    fn test_wall_contacts_within_radius() {
        let agents = vec![agent(AgentKind::Normal, 23.0, 0.0)];
        let domain = domain();
        let query = NeighborQuery::new(&agents, &domain);

        let hood = query.neighbors(0, 5.0, true, true);
        assert_eq!(hood.walls, vec![Vector::xy(25.0, 0.0)]);
        assert_eq!(hood.len(), 2);

        let sensed = hood.sensed(&agents);
        assert_eq!(sensed[1].kind, AgentKind::Wall);

        assert!(query.neighbors(0, 5.0, true, false).walls.is_empty());
    }

    #[test]
    fn test_removed_agents_are_invisible() {
        let agents = vec![
            agent(AgentKind::Normal, 0.0, 0.0),
            agent(AgentKind::Normal, 1.0, 0.0),
        ];
        let removed = vec![false, true];
        let domain = domain();
        let hood = NeighborQuery::new(&agents, &domain)
            .with_removed(&removed)
            .neighbors(0, 5.0, false, false);
        assert_eq!(hood.members, vec![0]);
    }

    #[test]
    fn test_detect_kills() {
        let agents = vec![
            agent(AgentKind::Predator, 0.0, 0.0),
            agent(AgentKind::Normal, 0.1, 0.0),
            agent(AgentKind::Leader, 0.0, 1.5),
            agent(AgentKind::Predator, 0.5, 0.0),
            agent(AgentKind::Normal, 3.0, 0.0),
        ];
        let domain = domain();
        let query = NeighborQuery::new(&agents, &domain);

        assert_eq!(query.detect_kills(0, 2.0), vec![1, 2]);
        // Only predators kill
        assert!(query.detect_kills(1, 2.0).is_empty());
    }

    #[test]
    fn test_index_matches_brute_force() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(11);
        let agents: Vec<Agent> = (0..200)
            .map(|_| {
                let mut a = agent(
                    AgentKind::Normal,
                    rng.gen_range(-25.0..25.0),
                    rng.gen_range(-25.0..25.0),
                );
                let t: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
                a.heading = Vector::xy(t.cos(), t.sin());
                a
            })
            .collect();
        let domain = domain();
        let index = SpatialIndex::build(&domain, &agents);

        let plain = NeighborQuery::new(&agents, &domain);
        let indexed = NeighborQuery::new(&agents, &domain).with_index(&index);
        for i in 0..agents.len() {
            assert_eq!(
                plain.neighbors(i, 5.0, true, true),
                indexed.neighbors(i, 5.0, true, true)
            );
        }
    }
}
