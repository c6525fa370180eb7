//! Concurrent power-grid simulator with greedy substation load rebalancing.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Nodes, sources, and grid-wide aggregates.
pub mod grid;
pub mod io;
pub mod reporting;
/// Balancer, engine, and job scheduling.
pub mod sim;
