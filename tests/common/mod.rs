//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::time::Duration;

use grid_balancer::grid::{Grid, Node, Source, SourceKind};
use grid_balancer::reporting::{ReportError, Reporter};
use grid_balancer::sim::balancer::Balancer;
use grid_balancer::sim::engine::Engine;
use grid_balancer::sim::schedule::{JobTiming, Schedule};
use grid_balancer::sim::types::{Action, SensorReading};

/// Default balancer (85% overload, 40% underload).
pub fn default_balancer() -> Balancer {
    Balancer::new(85.0, 40.0)
}

/// Default schedule: update at once then every 5s, optimize every 15s,
/// report every 10s.
pub fn default_schedule() -> Schedule {
    Schedule {
        update: JobTiming::immediately_every(Duration::from_secs(5)),
        optimize: JobTiming::every(Duration::from_secs(15)),
        report: JobTiming::every(Duration::from_secs(10)),
        task_timeout: Duration::from_secs(5),
        shutdown_grace: Duration::from_secs(5),
    }
}

/// Three 100 MW nodes with fixed-output sources.
///
/// After one update: NODE-1 = 95 MW, NODE-2 = 20 MW, NODE-3 = 50 MW.
pub fn fixed_grid() -> Grid {
    let nodes = vec![
        Node::new("NODE-1", "North", 100.0),
        Node::new("NODE-2", "South", 100.0),
        Node::new("NODE-3", "East", 100.0),
    ];
    let sources = vec![
        Source::new("SOURCE-1", SourceKind::Consumer, 60.0, 0.0, 1),
        Source::new("SOURCE-2", SourceKind::Consumer, 35.0, 0.0, 2),
        Source::new("SOURCE-3", SourceKind::Consumer, 40.0, 0.0, 3),
        Source::new("SOURCE-4", SourceKind::Producer, 20.0, 0.0, 4),
        Source::new("SOURCE-5", SourceKind::Consumer, 30.0, 0.0, 5),
        Source::new("SOURCE-6", SourceKind::Consumer, 20.0, 0.0, 6),
    ];
    Grid::new(nodes, sources)
}

/// What a [`RecordingReporter`] has seen so far.
#[derive(Debug, Default)]
pub struct Recorded {
    pub sensor_batches: Vec<Vec<SensorReading>>,
    pub action_batches: Vec<Vec<Action>>,
}

/// Reporter that keeps every batch in memory. Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingReporter {
    pub fn sensor_batches(&self) -> usize {
        self.inner.lock().unwrap().sensor_batches.len()
    }

    pub fn action_batches(&self) -> Vec<Vec<Action>> {
        self.inner.lock().unwrap().action_batches.clone()
    }

    pub fn last_sensor_batch(&self) -> Option<Vec<SensorReading>> {
        self.inner.lock().unwrap().sensor_batches.last().cloned()
    }
}

impl Reporter for RecordingReporter {
    async fn send_sensor_data(&self, readings: &[SensorReading]) -> Result<(), ReportError> {
        self.inner
            .lock()
            .unwrap()
            .sensor_batches
            .push(readings.to_vec());
        Ok(())
    }

    async fn send_actions(&self, actions: &[Action]) -> Result<(), ReportError> {
        self.inner
            .lock()
            .unwrap()
            .action_batches
            .push(actions.to_vec());
        Ok(())
    }
}

/// Reporter whose service always answers 503. Counts the attempts.
#[derive(Debug, Default, Clone)]
pub struct FailingReporter {
    attempts: Arc<Mutex<usize>>,
}

impl FailingReporter {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    fn fail(&self, route: &'static str) -> Result<(), ReportError> {
        *self.attempts.lock().unwrap() += 1;
        Err(ReportError::Status { route, status: 503 })
    }
}

impl Reporter for FailingReporter {
    async fn send_sensor_data(&self, _readings: &[SensorReading]) -> Result<(), ReportError> {
        self.fail("/api/sensor-data")
    }

    async fn send_actions(&self, _actions: &[Action]) -> Result<(), ReportError> {
        self.fail("/api/control/optimize")
    }
}

/// Engine over [`fixed_grid`] with the default schedule and a failing
/// reporter.
pub fn failing_engine() -> (Engine<FailingReporter>, FailingReporter) {
    let reporter = FailingReporter::default();
    let engine = Engine::with_grid(
        fixed_grid(),
        default_balancer(),
        default_schedule(),
        4,
        reporter.clone(),
        42,
    );
    (engine, reporter)
}

/// Engine over [`fixed_grid`] with the default schedule and a recording
/// reporter. Returns a handle to the reporter's record alongside.
pub fn fixed_engine() -> (Engine<RecordingReporter>, RecordingReporter) {
    let reporter = RecordingReporter::default();
    let engine = Engine::with_grid(
        fixed_grid(),
        default_balancer(),
        default_schedule(),
        4,
        reporter.clone(),
        42,
    );
    (engine, reporter)
}
