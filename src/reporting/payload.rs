//! JSON wire format expected by the reporting service.

use serde::Serialize;

use crate::sim::types::{Action, ActionKind, SensorReading};

/// Sensor reading as posted to `/api/sensor-data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDataDto<'a> {
    pub sensor_id: &'a str,
    pub node_id: &'a str,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub load_reading: f64,
    pub voltage: f64,
    pub frequency: f64,
}

impl<'a> From<&'a SensorReading> for SensorDataDto<'a> {
    fn from(r: &'a SensorReading) -> Self {
        Self {
            sensor_id: &r.sensor_id,
            node_id: &r.node_id,
            timestamp: r.timestamp.to_rfc3339(),
            load_reading: r.load,
            voltage: r.voltage,
            frequency: r.frequency,
        }
    }
}

/// Transfer action as posted to `/api/control/optimize`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationActionDto<'a> {
    pub from_node_id: &'a str,
    pub to_node_id: &'a str,
    pub amount: f64,
    pub action_type: ActionKind,
    /// RFC 3339 timestamp of the batch.
    pub timestamp: String,
}

impl<'a> OptimizationActionDto<'a> {
    pub fn new(action: &'a Action, timestamp: &str) -> Self {
        Self {
            from_node_id: &action.from_node_id,
            to_node_id: &action.to_node_id,
            amount: action.amount,
            action_type: action.kind,
            timestamp: timestamp.to_string(),
        }
    }
}
