use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

/// Consistent view of a node's electrical state.
///
/// `utilization` and `available` are always derived from the same
/// `(load, capacity)` pair held in this struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadReading {
    /// Current load (MW).
    pub load: f64,
    /// Rated capacity (MW).
    pub capacity: f64,
    /// `load / capacity * 100`.
    pub utilization: f64,
    /// `max(0, capacity - load)` (MW).
    pub available: f64,
}

impl LoadReading {
    fn derive(state: &NodeState) -> Self {
        Self {
            load: state.load,
            capacity: state.capacity,
            utilization: state.load / state.capacity * 100.0,
            available: (state.capacity - state.load).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeState {
    load: f64,
    capacity: f64,
}

/// A substation in the grid.
///
/// Load and capacity live in a single record behind one read/write lock, so
/// every reader observes a pair written together. Nodes never validate their
/// inputs; negative or zero values are stored as given.
///
/// # Examples
///
/// ```
/// use grid_balancer::grid::Node;
///
/// let node = Node::new("NODE-1", "North", 100.0);
/// node.set_load(90.0);
///
/// let reading = node.read();
/// assert_eq!(reading.utilization, 90.0);
/// assert_eq!(reading.available, 10.0);
/// assert!(node.is_overloaded(85.0));
/// ```
#[derive(Debug)]
pub struct Node {
    id: String,
    region: String,
    state: RwLock<NodeState>,
}

impl Node {
    /// Creates an idle node (zero load) with the given capacity in MW.
    pub fn new(id: impl Into<String>, region: impl Into<String>, capacity: f64) -> Self {
        Self::with_load(id, region, capacity, 0.0)
    }

    /// Creates a node with an initial load.
    pub fn with_load(
        id: impl Into<String>,
        region: impl Into<String>,
        capacity: f64,
        load: f64,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            state: RwLock::new(NodeState { load, capacity }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns an atomic snapshot of load, capacity, and the derived values.
    pub fn read(&self) -> LoadReading {
        // Writers never panic while holding the guard, so a poisoned lock
        // still holds a complete record.
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        LoadReading::derive(&state)
    }

    pub fn load(&self) -> f64 {
        self.read().load
    }

    pub fn capacity(&self) -> f64 {
        self.read().capacity
    }

    pub fn utilization(&self) -> f64 {
        self.read().utilization
    }

    pub fn available(&self) -> f64 {
        self.read().available
    }

    /// Replaces the current load.
    pub fn set_load(&self, load: f64) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .load = load;
    }

    /// Replaces the rated capacity.
    pub fn set_capacity(&self, capacity: f64) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity = capacity;
    }

    /// Adds `delta_mw` to the load under a single write lock and returns the
    /// new load.
    ///
    /// Two concurrent shifts on the same node never lose an update. Shifts on
    /// different nodes are independent operations.
    pub fn shift_load(&self, delta_mw: f64) -> f64 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.load += delta_mw;
        state.load
    }

    /// Returns `true` when utilization is strictly above `threshold` percent.
    pub fn is_overloaded(&self, threshold: f64) -> bool {
        self.read().utilization > threshold
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.read();
        write!(
            f,
            "{} [{}] load={:.2}/{:.2} MW utilization={:.1}%",
            self.id, self.region, r.load, r.capacity, r.utilization
        )
    }
}
