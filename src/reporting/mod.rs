//! Outbound reporting of sensor snapshots and transfer actions.
//!
//! Reporting is best-effort. The engine logs and drops any [`ReportError`];
//! nothing is retried or queued, and grid state is never rolled back.

pub mod http;
pub mod payload;

use std::future::Future;

use thiserror::Error;

use crate::sim::types::{Action, SensorReading};

pub use http::HttpReporter;

/// Failure to deliver a batch to the reporting service.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The service answered with a non-2xx status.
    #[error("{route} returned status {status}")]
    Status { route: &'static str, status: u16 },
    /// The request could not be sent or timed out.
    #[error("request to {route} failed: {source}")]
    Transport {
        route: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Sink for the engine's periodic output.
///
/// Implementations must be cheap to share between jobs; the engine holds one
/// instance for its whole lifetime.
pub trait Reporter: Send + Sync + 'static {
    /// Delivers one batch of sensor readings.
    fn send_sensor_data(
        &self,
        readings: &[SensorReading],
    ) -> impl Future<Output = Result<(), ReportError>> + Send;

    /// Delivers the actions produced by one optimization pass.
    fn send_actions(
        &self,
        actions: &[Action],
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}

/// Reporter that accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    async fn send_sensor_data(&self, _readings: &[SensorReading]) -> Result<(), ReportError> {
        Ok(())
    }

    async fn send_actions(&self, _actions: &[Action]) -> Result<(), ReportError> {
        Ok(())
    }
}
