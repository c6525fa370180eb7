//! Periodic firing of the engine's three jobs.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::config::SimulationConfig;

/// The three recurring jobs driven by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Recompute every node's load from its sources.
    Update,
    /// Run the balancer and forward its actions.
    Optimize,
    /// Publish a status snapshot.
    Report,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Optimize => write!(f, "optimize"),
            Self::Report => write!(f, "report"),
        }
    }
}

/// Initial delay and period of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTiming {
    pub initial_delay: Duration,
    pub period: Duration,
}

impl JobTiming {
    /// First firing after one full period.
    pub fn every(period: Duration) -> Self {
        Self {
            initial_delay: period,
            period,
        }
    }

    /// First firing immediately.
    pub fn immediately_every(period: Duration) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            period,
        }
    }
}

/// Timing for all jobs plus the bounds used by the update job and shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub update: JobTiming,
    pub optimize: JobTiming,
    pub report: JobTiming,
    /// Maximum wait for each node update task.
    pub task_timeout: Duration,
    /// Time `stop()` waits before aborting jobs still running.
    pub shutdown_grace: Duration,
}

impl Schedule {
    pub fn timing(&self, job: JobKind) -> JobTiming {
        match job {
            JobKind::Update => self.update,
            JobKind::Optimize => self.optimize,
            JobKind::Report => self.report,
        }
    }
}

impl From<&SimulationConfig> for Schedule {
    /// Updates start at once; optimization and reporting wait one period.
    fn from(c: &SimulationConfig) -> Self {
        Self {
            update: JobTiming::immediately_every(Duration::from_secs(c.update_interval_secs)),
            optimize: JobTiming::every(Duration::from_secs(c.optimize_interval_secs)),
            report: JobTiming::every(Duration::from_secs(c.report_interval_secs)),
            task_timeout: Duration::from_secs(c.task_timeout_secs),
            shutdown_grace: Duration::from_secs(c.shutdown_grace_secs),
        }
    }
}

/// Runs `job` on `timing` until `shutdown` turns `true` or its sender drops.
///
/// A run is awaited to completion before the next tick is taken, and ticks
/// missed while it was running are skipped, so runs of the same job never
/// overlap. Shutdown is observed between runs only.
pub async fn run_periodic<F, Fut>(
    kind: JobKind,
    timing: JobTiming,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + timing.initial_delay, timing.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                debug!(job = %kind, "job fired");
                job().await;
            }
        }
    }
    debug!(job = %kind, "job cancelled");
}
