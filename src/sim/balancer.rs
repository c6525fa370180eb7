//! Greedy load redistribution between overloaded and underloaded nodes.

use std::cmp::Ordering;

use tracing::{debug, info};

use crate::grid::Node;

use super::types::Action;

/// Share of a receiver's current headroom that a single transfer may use.
const MAX_HEADROOM_SHARE: f64 = 0.5;

/// Greedy rebalancer.
///
/// Holds only its thresholds; every call works on the nodes passed in and all
/// mutation goes through each node's own lock. Relief is partial:
/// a single transfer never takes more than half of a receiver's headroom, so
/// the grid converges over several calls rather than in one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balancer {
    overload_threshold: f64,
    underload_threshold: f64,
}

impl Balancer {
    /// Creates a balancer with utilization thresholds in percent.
    pub fn new(overload_threshold: f64, underload_threshold: f64) -> Self {
        Self {
            overload_threshold,
            underload_threshold,
        }
    }

    pub fn overload_threshold(&self) -> f64 {
        self.overload_threshold
    }

    pub fn underload_threshold(&self) -> f64 {
        self.underload_threshold
    }

    /// Returns the nodes whose utilization exceeds the overload threshold, in
    /// input order.
    pub fn detect_overloaded<'a>(&self, nodes: &'a [Node]) -> Vec<&'a Node> {
        nodes
            .iter()
            .filter(|n| n.is_overloaded(self.overload_threshold))
            .collect()
    }

    /// Moves load from overloaded nodes to underloaded ones and returns the
    /// transfers in the order they were applied.
    ///
    /// Overloaded nodes are visited by descending utilization, receivers by
    /// descending headroom. Both orders are fixed at the start of the call.
    /// Each overloaded node sheds `load - capacity * overload / 100`, taking
    /// at most half of a receiver's freshly read headroom per transfer.
    ///
    /// The two sides of a transfer are separate single-node updates. A
    /// concurrent writer can interleave between them.
    pub fn optimize(&self, nodes: &[Node]) -> Vec<Action> {
        let mut overloaded: Vec<(&Node, f64)> = Vec::new();
        let mut underloaded: Vec<(&Node, f64)> = Vec::new();

        for node in nodes {
            let r = node.read();
            if r.utilization > self.overload_threshold {
                overloaded.push((node, r.utilization));
            } else if r.utilization < self.underload_threshold && r.available > 0.0 {
                underloaded.push((node, r.available));
            }
        }

        if overloaded.is_empty() {
            debug!("no overloaded nodes detected");
            return Vec::new();
        }

        overloaded.sort_by(|a, b| descending(a.1, b.1));
        underloaded.sort_by(|a, b| descending(a.1, b.1));

        let mut actions = Vec::new();
        let share = self.overload_threshold / 100.0;

        for &(source, _) in &overloaded {
            let r = source.read();
            let mut excess = r.load - r.capacity * share;
            if excess <= 0.0 {
                continue;
            }

            for &(target, _) in &underloaded {
                if excess <= 0.0 {
                    break;
                }
                let available = target.available();
                if available <= 0.0 {
                    continue;
                }

                let amount = excess.min(available * MAX_HEADROOM_SHARE);
                source.shift_load(-amount);
                target.shift_load(amount);
                excess -= amount;

                info!(
                    from = source.id(),
                    to = target.id(),
                    amount_mw = amount,
                    "transferred load"
                );
                actions.push(Action::load_transfer(source.id(), target.id(), amount));
            }
        }

        actions
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
