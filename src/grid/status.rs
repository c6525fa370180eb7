//! Serializable views of grid state for logging, reporting, and the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::node::Node;

/// One node's identity and consistent electrical state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub node_id: String,
    pub region: String,
    /// Load (MW).
    pub load: f64,
    /// Capacity (MW).
    pub capacity: f64,
    /// Utilization (%).
    pub utilization: f64,
    /// Headroom (MW).
    pub available: f64,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        let r = node.read();
        Self {
            node_id: node.id().to_string(),
            region: node.region().to_string(),
            load: r.load,
            capacity: r.capacity,
            utilization: r.utilization,
            available: r.available,
        }
    }
}

/// Grid-wide aggregate computed from a set of node snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct GridStatus {
    pub timestamp: DateTime<Utc>,
    pub total_nodes: usize,
    /// Sum of node loads (MW).
    pub total_load: f64,
    /// Sum of node capacities (MW).
    pub total_capacity: f64,
    /// `total_load / total_capacity * 100`, or 0 for an empty grid.
    pub utilization: f64,
    /// Nodes strictly above the overload threshold.
    pub overloaded_nodes: usize,
    pub nodes: Vec<NodeSnapshot>,
}

impl GridStatus {
    /// Aggregates `nodes` and counts those above `overload_threshold`.
    pub fn from_snapshot(nodes: Vec<NodeSnapshot>, overload_threshold: f64) -> Self {
        let total_load: f64 = nodes.iter().map(|n| n.load).sum();
        let total_capacity: f64 = nodes.iter().map(|n| n.capacity).sum();
        let utilization = if total_capacity > 0.0 {
            total_load / total_capacity * 100.0
        } else {
            0.0
        };
        let overloaded_nodes = nodes
            .iter()
            .filter(|n| n.utilization > overload_threshold)
            .count();
        Self {
            timestamp: Utc::now(),
            total_nodes: nodes.len(),
            total_load,
            total_capacity,
            utilization,
            overloaded_nodes,
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_status_aggregates() {
        let nodes = [
            Node::with_load("A", "North", 100.0, 90.0),
            Node::with_load("B", "South", 100.0, 20.0),
        ];
        let snapshot = nodes.iter().map(NodeSnapshot::from).collect();
        let status = GridStatus::from_snapshot(snapshot, 85.0);
        assert_eq!(status.total_nodes, 2);
        assert_eq!(status.total_load, 110.0);
        assert_eq!(status.total_capacity, 200.0);
        assert!((status.utilization - 55.0).abs() < EPS);
        assert_eq!(status.overloaded_nodes, 1);
    }

    #[test]
    fn test_empty_status() {
        let status = GridStatus::from_snapshot(Vec::new(), 85.0);
        assert_eq!(status.total_nodes, 0);
        assert_eq!(status.utilization, 0.0);
    }
}
