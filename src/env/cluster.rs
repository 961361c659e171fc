//! Node capacity, status and occupancy bookkeeping.

use rand::seq::SliceRandom;
use rand::Rng;

/// State of the compute nodes agents are deployed onto.
///
/// Invariants, holding after every operation:
/// - `num_agents == occupancy.iter().sum()`
/// - `occupancy[i] <= capacity[i]`
/// - a failed node has zero occupancy
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    active: Vec<bool>,
    occupancy: Vec<u32>,
    capacity: Vec<f64>,
    num_agents: u32,
}

impl Cluster {
    /// Creates a cluster of `num_nodes` active, empty nodes of equal capacity.
    pub fn new(num_nodes: usize, capacity: f64) -> Self {
        Self {
            active: vec![true; num_nodes],
            occupancy: vec![0; num_nodes],
            capacity: vec![capacity; num_nodes],
            num_agents: 0,
        }
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.active.len()
    }

    /// Total number of deployed agents.
    pub fn num_agents(&self) -> u32 {
        self.num_agents
    }

    /// Returns true if the node is up.
    pub fn is_active(&self, node: usize) -> bool {
        self.active[node]
    }

    /// Node status as `{0, 1}` flags (1 = active).
    pub fn status(&self) -> Vec<u8> {
        self.active.iter().map(|&a| a as u8).collect()
    }

    pub fn occupancy(&self) -> &[u32] {
        &self.occupancy
    }

    pub fn capacity(&self) -> &[f64] {
        &self.capacity
    }

    /// Returns true if one more agent fits on the node.
    pub fn has_room(&self, node: usize) -> bool {
        (self.occupancy[node] + 1) as f64 <= self.capacity[node]
    }

    /// Places one agent on `node` if it is active and has room.
    ///
    /// Returns whether the deployment happened. Out-of-range nodes fail.
    pub fn try_deploy(&mut self, node: usize) -> bool {
        if node >= self.num_nodes() || !self.active[node] || !self.has_room(node) {
            return false;
        }
        self.occupancy[node] += 1;
        self.num_agents += 1;
        true
    }

    /// Removes one agent from a uniformly chosen occupied node.
    ///
    /// Returns the node the agent left, or `None` if no agent is deployed.
    pub fn depart_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.num_agents == 0 {
            return None;
        }
        let occupied: Vec<usize> = (0..self.num_nodes())
            .filter(|&i| self.occupancy[i] > 0)
            .collect();
        let node = *occupied.choose(rng)?;
        self.occupancy[node] -= 1;
        self.num_agents -= 1;
        Some(node)
    }

    /// Fails a uniformly chosen active node, dropping every agent on it.
    ///
    /// Returns `(node, lost_agents)`, or `None` if every node is already down.
    pub fn fail_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, u32)> {
        let active: Vec<usize> = (0..self.num_nodes()).filter(|&i| self.active[i]).collect();
        let node = *active.choose(rng)?;
        let lost = self.occupancy[node];
        self.active[node] = false;
        self.occupancy[node] = 0;
        self.num_agents = self.num_agents.saturating_sub(lost);
        Some((node, lost))
    }

    /// Brings a uniformly chosen failed node back up (empty).
    ///
    /// Returns the recovered node, or `None` if no node is down.
    pub fn recover_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let failed: Vec<usize> = (0..self.num_nodes()).filter(|&i| !self.active[i]).collect();
        let node = *failed.choose(rng)?;
        self.active[node] = true;
        Some(node)
    }

    /// Returns true if all bookkeeping invariants hold.
    pub fn check_invariants(&self) -> bool {
        let total: u32 = self.occupancy.iter().sum();
        total == self.num_agents
            && self
                .occupancy
                .iter()
                .zip(&self.capacity)
                .all(|(&occ, &cap)| occ as f64 <= cap)
            && self
                .occupancy
                .iter()
                .zip(&self.active)
                .all(|(&occ, &active)| active || occ == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_cluster_is_empty_and_active() {
        let cluster = Cluster::new(3, 5.0);
        assert_eq!(cluster.status(), vec![1, 1, 1]);
        assert_eq!(cluster.occupancy(), &[0, 0, 0]);
        assert_eq!(cluster.num_agents(), 0);
        assert!(cluster.check_invariants());
    }

    #[test]
    fn deploy_until_full() {
        let mut cluster = Cluster::new(1, 2.0);
        assert!(cluster.try_deploy(0));
        assert!(cluster.try_deploy(0));
        assert!(!cluster.try_deploy(0));
        assert_eq!(cluster.occupancy(), &[2]);
        assert_eq!(cluster.num_agents(), 2);
    }

    #[test]
    fn fractional_capacity_never_overfills() {
        let mut cluster = Cluster::new(1, 2.5);
        assert!(cluster.try_deploy(0));
        assert!(cluster.try_deploy(0));
        assert!(!cluster.try_deploy(0));
        assert!(cluster.check_invariants());
    }

    #[test]
    fn deploy_out_of_range_fails() {
        let mut cluster = Cluster::new(2, 5.0);
        assert!(!cluster.try_deploy(2));
        assert_eq!(cluster.num_agents(), 0);
    }

    #[test]
    fn depart_with_no_agents_is_noop() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut cluster = Cluster::new(2, 5.0);
        assert_eq!(cluster.depart_random(&mut rng), None);
        assert!(cluster.check_invariants());
    }

    #[test]
    fn depart_picks_occupied_node() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cluster = Cluster::new(3, 5.0);
        cluster.try_deploy(2);
        assert_eq!(cluster.depart_random(&mut rng), Some(2));
        assert_eq!(cluster.num_agents(), 0);
    }

    #[test]
    fn failure_drops_agents() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut cluster = Cluster::new(1, 5.0);
        for _ in 0..3 {
            cluster.try_deploy(0);
        }
        assert_eq!(cluster.fail_random(&mut rng), Some((0, 3)));
        assert_eq!(cluster.status(), vec![0]);
        assert_eq!(cluster.occupancy(), &[0]);
        assert_eq!(cluster.num_agents(), 0);
        assert!(!cluster.try_deploy(0));
    }

    #[test]
    fn failure_with_all_nodes_down_is_noop() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cluster = Cluster::new(1, 5.0);
        cluster.fail_random(&mut rng);
        assert_eq!(cluster.fail_random(&mut rng), None);
    }

    #[test]
    fn recovery_only_targets_failed_nodes() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut cluster = Cluster::new(2, 5.0);
        assert_eq!(cluster.recover_random(&mut rng), None);
        let (failed, _) = cluster.fail_random(&mut rng).unwrap();
        assert_eq!(cluster.recover_random(&mut rng), Some(failed));
        assert_eq!(cluster.status(), vec![1, 1]);
    }

    #[test]
    fn invariants_hold_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut cluster = Cluster::new(4, 3.0);
        for i in 0..2_000 {
            match rng.gen_range(0..4) {
                0 => {
                    cluster.try_deploy(i % 5);
                }
                1 => {
                    cluster.depart_random(&mut rng);
                }
                2 => {
                    cluster.fail_random(&mut rng);
                }
                _ => {
                    cluster.recover_random(&mut rng);
                }
            }
            assert!(cluster.check_invariants());
        }
    }
}
