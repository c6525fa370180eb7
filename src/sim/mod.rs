/// Greedy load redistribution.
pub mod balancer;
pub mod engine;
/// Periodic job timing and the shared scheduler loop.
pub mod schedule;
pub mod types;
