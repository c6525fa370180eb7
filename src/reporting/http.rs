//! HTTP/JSON reporter backed by `reqwest`.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::config::ReportingConfig;
use crate::sim::types::{Action, SensorReading};

use super::payload::{OptimizationActionDto, SensorDataDto};
use super::{ReportError, Reporter};

const SENSOR_ROUTE: &str = "/api/sensor-data";
const ACTIONS_ROUTE: &str = "/api/control/optimize";

/// Posts JSON batches to the reporting service.
///
/// Any 2xx response counts as delivered. Every other outcome is returned as a
/// [`ReportError`] for the caller to log.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReporter {
    /// Builds a reporter for `config.endpoint` with the configured request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error if the client cannot be built.
    pub fn new(config: &ReportingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        route: &'static str,
        body: &T,
    ) -> Result<(), ReportError> {
        let url = format!("{}{route}", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ReportError::Transport { route, source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReportError::Status {
                route,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl Reporter for HttpReporter {
    async fn send_sensor_data(&self, readings: &[SensorReading]) -> Result<(), ReportError> {
        let body: Vec<SensorDataDto<'_>> = readings.iter().map(SensorDataDto::from).collect();
        self.post(SENSOR_ROUTE, &body).await?;
        debug!(count = readings.len(), "sent sensor readings");
        Ok(())
    }

    async fn send_actions(&self, actions: &[Action]) -> Result<(), ReportError> {
        let timestamp = Utc::now().to_rfc3339();
        let body: Vec<OptimizationActionDto<'_>> = actions
            .iter()
            .map(|a| OptimizationActionDto::new(a, &timestamp))
            .collect();
        self.post(ACTIONS_ROUTE, &body).await?;
        debug!(count = actions.len(), "sent optimization actions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let config = ReportingConfig {
            endpoint: "http://localhost:5000/".to_string(),
            ..ReportingConfig::default()
        };
        let reporter = HttpReporter::new(&config).expect("client should build");
        assert_eq!(reporter.endpoint(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let config = ReportingConfig {
            // Port 9 (discard) on loopback is not expected to accept HTTP.
            endpoint: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..ReportingConfig::default()
        };
        let reporter = HttpReporter::new(&config).expect("client should build");
        let err = reporter
            .send_actions(&[Action::load_transfer("A", "B", 1.0)])
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, ReportError::Transport { route: ACTIONS_ROUTE, .. }));
    }
}
