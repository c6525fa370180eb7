/// CSV export of node snapshots.
pub mod export;
