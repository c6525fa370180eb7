//! Simulation engine that owns the grid and drives the periodic jobs.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ScenarioConfig};
use crate::grid::{Grid, GridStatus, NodeSnapshot};
use crate::reporting::Reporter;

use super::balancer::Balancer;
use super::schedule::{JobKind, Schedule, run_periodic};
use super::types::{Action, EngineStatus, SensorReading};

/// Seed offset for the sensor jitter RNG to avoid correlation with grid generation.
const SENSOR_SEED_OFFSET: u64 = 1_009;
const VOLTAGE_BASE_KV: f64 = 400.0;
const VOLTAGE_SPAN_KV: f64 = 20.0;
const FREQUENCY_BASE_HZ: f64 = 60.0;
const FREQUENCY_SPAN_HZ: f64 = 0.5;

/// Errors raised while building or starting an [`Engine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The scenario failed validation; nothing was created.
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    /// `start()` was called outside the `Created` state.
    #[error("engine cannot start while {0}")]
    InvalidState(EngineStatus),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of one update job invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Nodes whose load was overwritten.
    pub updated: usize,
    /// Nodes left at their previous load (timeout, pool closed, or panic).
    pub skipped: usize,
}

/// Node update tasks of one job. Dropping it aborts any still running.
struct UpdateTasks(Vec<JoinHandle<Result<(), AcquireError>>>);

impl Drop for UpdateTasks {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// State shared between the engine handle and its scheduled jobs.
struct Shared<R> {
    grid: Arc<Grid>,
    balancer: Balancer,
    reporter: R,
    workers: Arc<Semaphore>,
    task_timeout: Duration,
    sensor_rng: Mutex<StdRng>,
}

impl<R: Reporter> Shared<R> {
    async fn run_job(&self, job: JobKind) {
        match job {
            JobKind::Update => {
                self.update_loads().await;
            }
            JobKind::Optimize => {
                self.run_optimization().await;
            }
            JobKind::Report => {
                self.report_status().await;
            }
        }
    }

    /// Recomputes every node's load on the worker pool.
    ///
    /// Tasks are awaited in node order and each gets its own `task_timeout`
    /// window, starting when the job begins waiting on it. A task that misses
    /// its window is aborted and only its node keeps the previous load.
    async fn update_loads(&self) -> UpdateOutcome {
        let mut tasks = UpdateTasks(Vec::with_capacity(self.grid.nodes().len()));
        for index in 0..self.grid.nodes().len() {
            let grid = Arc::clone(&self.grid);
            let workers = Arc::clone(&self.workers);
            tasks.0.push(tokio::spawn(async move {
                let _permit = workers.acquire_owned().await?;
                let load = grid.aggregate_load(index);
                let node = &grid.nodes()[index];
                node.set_load(load);
                debug!(node = node.id(), load, "updated node load");
                Ok::<_, AcquireError>(())
            }));
        }

        let mut outcome = UpdateOutcome::default();
        for (node, task) in self.grid.nodes().iter().zip(tasks.0.iter_mut()) {
            let waited = timeout(self.task_timeout, &mut *task).await;
            let result = match waited {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        node = node.id(),
                        timeout_ms = self.task_timeout.as_millis() as u64,
                        "update task timed out, keeping previous load"
                    );
                    task.abort();
                    // the task may have finished before the abort landed
                    task.await
                }
            };

            match result {
                Ok(Ok(())) => outcome.updated += 1,
                Ok(Err(e)) => {
                    warn!(node = node.id(), error = %e, "update task rejected by worker pool");
                    outcome.skipped += 1;
                }
                Err(e) if e.is_cancelled() => outcome.skipped += 1,
                Err(e) => {
                    error!(node = node.id(), error = %e, "update task failed");
                    outcome.skipped += 1;
                }
            }
        }
        outcome
    }

    async fn run_optimization(&self) -> Vec<Action> {
        info!("running optimization");
        let nodes = self.grid.nodes();

        let overloaded = self.balancer.detect_overloaded(nodes);
        if !overloaded.is_empty() {
            warn!(count = overloaded.len(), "detected overloaded nodes");
            for node in &overloaded {
                warn!("  - {node}");
            }
        }

        let actions = self.balancer.optimize(nodes);
        if !actions.is_empty() {
            info!(count = actions.len(), "applied optimization actions");
            if let Err(e) = self.reporter.send_actions(&actions).await {
                error!(error = %e, "failed to send optimization actions");
            }
        }
        actions
    }

    async fn report_status(&self) -> GridStatus {
        let status = self.grid.status(self.balancer.overload_threshold());
        for node in &status.nodes {
            info!(
                "  {} [{}] load={:.2}/{:.2} MW utilization={:.1}%",
                node.node_id, node.region, node.load, node.capacity, node.utilization
            );
        }
        info!(
            total_load_mw = status.total_load,
            total_capacity_mw = status.total_capacity,
            utilization_pct = status.utilization,
            overloaded = status.overloaded_nodes,
            "grid status report"
        );

        let readings = self.sensor_readings(&status.nodes);
        if let Err(e) = self.reporter.send_sensor_data(&readings).await {
            error!(error = %e, "failed to send sensor data");
        }
        status
    }

    fn sensor_readings(&self, nodes: &[NodeSnapshot]) -> Vec<SensorReading> {
        let mut rng = self
            .sensor_rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let timestamp = Utc::now();
        nodes
            .iter()
            .map(|n| SensorReading {
                sensor_id: format!("SENSOR-{}", n.node_id),
                node_id: n.node_id.clone(),
                timestamp,
                load: n.load,
                voltage: VOLTAGE_BASE_KV + rng.random::<f64>() * VOLTAGE_SPAN_KV,
                frequency: FREQUENCY_BASE_HZ + rng.random::<f64>() * FREQUENCY_SPAN_HZ,
            })
            .collect()
    }
}

/// Simulation engine owning the grid, the worker pool, and the job scheduler.
///
/// Generic over `R: Reporter` for static dispatch. The engine moves through
/// `Created → Running → Stopped`; [`start`](Engine::start) must be called from
/// inside a Tokio runtime.
///
/// Jobs share no lock beyond each node's own. An update and an optimization
/// can interleave at node granularity and the last write to a node wins.
pub struct Engine<R: Reporter> {
    shared: Arc<Shared<R>>,
    schedule: Schedule,
    status: EngineStatus,
    shutdown: watch::Sender<bool>,
    jobs: Vec<JoinHandle<()>>,
}

impl<R: Reporter> Engine<R> {
    /// Validates `config`, generates the grid, and builds an idle engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] before any node is created if
    /// the scenario does not validate.
    pub fn new(config: &ScenarioConfig, reporter: R) -> Result<Self, EngineError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(EngineError::InvalidConfig(errors));
        }

        let g = &config.grid;
        let grid = Grid::generate(g);
        let balancer = Balancer::new(g.overload_threshold, g.underload_threshold);
        Ok(Self::with_grid(
            grid,
            balancer,
            Schedule::from(&config.simulation),
            config.simulation.worker_pool_size,
            reporter,
            g.seed.wrapping_add(SENSOR_SEED_OFFSET),
        ))
    }

    /// Builds an idle engine around an existing grid.
    ///
    /// # Arguments
    ///
    /// * `grid` - Nodes and sources to simulate
    /// * `balancer` - Rebalancer with its thresholds
    /// * `schedule` - Job timing; every period must be non-zero
    /// * `worker_pool_size` - Maximum concurrent node update tasks
    /// * `reporter` - Sink for sensor snapshots and actions
    /// * `seed` - Seed for sensor voltage/frequency jitter
    pub fn with_grid(
        grid: Grid,
        balancer: Balancer,
        schedule: Schedule,
        worker_pool_size: usize,
        reporter: R,
        seed: u64,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                grid: Arc::new(grid),
                balancer,
                reporter,
                workers: Arc::new(Semaphore::new(worker_pool_size.max(1))),
                task_timeout: schedule.task_timeout,
                sensor_rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }),
            schedule,
            status: EngineStatus::Created,
            shutdown,
            jobs: Vec::new(),
        }
    }

    /// Launches the update, optimize, and report jobs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidState`] unless the engine is `Created`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status != EngineStatus::Created {
            return Err(EngineError::InvalidState(self.status));
        }

        info!(
            nodes = self.shared.grid.nodes().len(),
            update_every = ?self.schedule.update.period,
            optimize_every = ?self.schedule.optimize.period,
            report_every = ?self.schedule.report.period,
            "starting simulation engine"
        );

        for kind in [JobKind::Update, JobKind::Optimize, JobKind::Report] {
            let shared = Arc::clone(&self.shared);
            let job = move || {
                let shared = Arc::clone(&shared);
                async move { shared.run_job(kind).await }
            };
            self.jobs.push(tokio::spawn(run_periodic(
                kind,
                self.schedule.timing(kind),
                self.shutdown.subscribe(),
                job,
            )));
        }

        self.status = EngineStatus::Running;
        Ok(())
    }

    /// Stops all jobs and closes the worker pool.
    ///
    /// Jobs still running after the grace period are aborted, which also
    /// aborts their outstanding node tasks. Calling `stop` before `start` or
    /// more than once does nothing.
    pub async fn stop(&mut self) {
        if self.status != EngineStatus::Running {
            return;
        }
        info!("stopping simulation engine");
        self.status = EngineStatus::Stopped;
        self.shutdown.send_replace(true);
        self.shared.workers.close();

        let grace = self.schedule.shutdown_grace;
        let jobs = &mut self.jobs;
        let drained = timeout(grace, async {
            for job in jobs.iter_mut() {
                if let Err(e) = job.await {
                    warn!(error = %e, "job ended abnormally");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "jobs still running after grace period, aborting"
            );
            for job in &self.jobs {
                job.abort();
            }
        }
        self.jobs.clear();
        info!("simulation engine stopped");
    }

    /// Runs the update job once, outside the schedule.
    pub async fn update_loads(&self) -> UpdateOutcome {
        self.shared.update_loads().await
    }

    /// Runs the optimize job once, outside the schedule.
    pub async fn run_optimization(&self) -> Vec<Action> {
        self.shared.run_optimization().await
    }

    /// Runs the report job once, outside the schedule.
    pub async fn report_status(&self) -> GridStatus {
        self.shared.report_status().await
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    /// Point-in-time copy of every node's state.
    pub fn nodes(&self) -> Vec<NodeSnapshot> {
        self.shared.grid.snapshot()
    }

    /// Shared read access to the grid, e.g. for the status API.
    pub fn grid(&self) -> Arc<Grid> {
        Arc::clone(&self.shared.grid)
    }

    pub fn balancer(&self) -> &Balancer {
        &self.shared.balancer
    }

    pub fn reporter(&self) -> &R {
        &self.shared.reporter
    }
}

impl<R: Reporter> Drop for Engine<R> {
    fn drop(&mut self) {
        for job in &self.jobs {
            job.abort();
        }
    }
}
