//! Grid state: substations, stochastic sources, and their fixed assignment.

pub mod node;
pub mod source;
pub mod status;

use std::ops::Range;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{info, warn};

use crate::config::GridConfig;

pub use node::{LoadReading, Node};
pub use source::{Source, SourceKind};
pub use status::{GridStatus, NodeSnapshot};

/// Regions assigned round-robin to generated nodes.
pub const REGIONS: &[&str] = &["North", "South", "East", "West", "Central"];

/// Every `PRODUCER_STRIDE`-th generated source is a producer.
const PRODUCER_STRIDE: usize = 5;
const SOURCE_BASE_MIN_MW: f64 = 10.0;
const SOURCE_BASE_SPAN_MW: f64 = 30.0;
const SOURCE_VARIABILITY_MIN: f64 = 0.3;
const SOURCE_VARIABILITY_SPAN: f64 = 0.4;

/// Returns the slice of source indices read by node `index`.
///
/// Each node gets `source_count / node_count` consecutive sources. When the
/// division leaves a remainder, the trailing sources belong to no node.
///
/// # Examples
///
/// ```
/// use grid_balancer::grid::source_slice;
///
/// assert_eq!(source_slice(50, 10, 3), 15..20);
/// // 7 / 3 == 2: source 6 is never read
/// assert_eq!(source_slice(7, 3, 2), 4..6);
/// ```
pub fn source_slice(source_count: usize, node_count: usize, index: usize) -> Range<usize> {
    if node_count == 0 {
        return 0..0;
    }
    let per_node = source_count / node_count;
    let start = (index * per_node).min(source_count);
    let end = (start + per_node).min(source_count);
    start..end
}

/// The full set of nodes and sources for one run.
///
/// Both collections are fixed after construction. Node mutation happens
/// through each [`Node`]'s own lock.
#[derive(Debug)]
pub struct Grid {
    nodes: Vec<Node>,
    sources: Vec<Source>,
}

impl Grid {
    /// Assembles a grid from explicit nodes and sources.
    pub fn new(nodes: Vec<Node>, sources: Vec<Source>) -> Self {
        Self { nodes, sources }
    }

    /// Generates a grid from configuration using `config.seed`.
    ///
    /// Node `i` is named `NODE-{i+1}` and gets capacity
    /// `node_base_capacity + U(0, capacity_jitter)`. Source `i` is named
    /// `SOURCE-{i+1}`, is a producer when `i % 5 == 0`, and has a base load of
    /// 10–40 MW with 0.3–0.7 variability. Each source owns a generator seeded
    /// from the master stream.
    pub fn generate(config: &GridConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let nodes: Vec<Node> = (0..config.node_count)
            .map(|i| {
                let region = REGIONS[i % REGIONS.len()];
                let jitter = rng.random::<f64>() * config.capacity_jitter;
                Node::new(
                    format!("NODE-{}", i + 1),
                    region,
                    config.node_base_capacity + jitter,
                )
            })
            .collect();

        let sources: Vec<Source> = (0..config.source_count)
            .map(|i| {
                let kind = if i % PRODUCER_STRIDE == 0 {
                    SourceKind::Producer
                } else {
                    SourceKind::Consumer
                };
                let base = SOURCE_BASE_MIN_MW + rng.random::<f64>() * SOURCE_BASE_SPAN_MW;
                let variability =
                    SOURCE_VARIABILITY_MIN + rng.random::<f64>() * SOURCE_VARIABILITY_SPAN;
                let source_rng = StdRng::seed_from_u64(rng.random());
                Source::with_rng(format!("SOURCE-{}", i + 1), kind, base, variability, source_rng)
            })
            .collect();

        let grid = Self::new(nodes, sources);
        info!(
            nodes = grid.nodes.len(),
            sources = grid.sources.len(),
            "initialized grid"
        );
        let unassigned = grid.unassigned_sources();
        if unassigned > 0 {
            warn!(
                unassigned,
                "source count is not divisible by node count; trailing sources are never read"
            );
        }
        grid
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Sources assigned to the node at `index`.
    pub fn sources_for(&self, index: usize) -> &[Source] {
        &self.sources[source_slice(self.sources.len(), self.nodes.len(), index)]
    }

    /// Number of sources that no node reads.
    pub fn unassigned_sources(&self) -> usize {
        match self.nodes.len() {
            0 => self.sources.len(),
            n => self.sources.len() % n,
        }
    }

    /// Sums the current output of the node's sources, clamped to zero.
    pub fn aggregate_load(&self, index: usize) -> f64 {
        self.sources_for(index)
            .iter()
            .map(Source::current_output)
            .sum::<f64>()
            .max(0.0)
    }

    /// Sum of all node loads (MW).
    pub fn total_load(&self) -> f64 {
        self.nodes.iter().map(Node::load).sum()
    }

    /// Point-in-time snapshot of every node, in grid order.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes.iter().map(NodeSnapshot::from).collect()
    }

    /// Aggregated status counting nodes above `overload_threshold`.
    pub fn status(&self, overload_threshold: f64) -> GridStatus {
        GridStatus::from_snapshot(self.snapshot(), overload_threshold)
    }
}
