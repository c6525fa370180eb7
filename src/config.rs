//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Grid size, capacities, and balancing thresholds.
    #[serde(default)]
    pub grid: GridConfig,
    /// Worker pool and job timing.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Outbound reporting endpoint.
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Grid size, capacities, and balancing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of substations (must be > 0).
    pub node_count: usize,
    /// Number of load sources shared out across nodes.
    pub source_count: usize,
    /// Minimum node capacity (MW, must be > 0).
    pub node_base_capacity: f64,
    /// Upper bound of the uniform capacity jitter added per node (MW).
    pub capacity_jitter: f64,
    /// Utilization (%) above which a node is overloaded.
    pub overload_threshold: f64,
    /// Utilization (%) below which a node may receive load.
    pub underload_threshold: f64,
    /// Master random seed.
    pub seed: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            node_count: 10,
            source_count: 50,
            node_base_capacity: 100.0,
            capacity_jitter: 50.0,
            overload_threshold: 85.0,
            underload_threshold: 40.0,
            seed: 42,
        }
    }
}

/// Worker pool and job timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Maximum number of concurrently running node update tasks.
    pub worker_pool_size: usize,
    /// Period of the load update job (s).
    pub update_interval_secs: u64,
    /// Period of the optimization job (s).
    pub optimize_interval_secs: u64,
    /// Period of the status report job (s).
    pub report_interval_secs: u64,
    /// Total run time before a natural stop (s).
    pub duration_secs: u64,
    /// Per-task wait bound inside the update job (s).
    pub task_timeout_secs: u64,
    /// Time allowed for in-flight jobs to finish on stop (s).
    pub shutdown_grace_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 4,
            update_interval_secs: 5,
            optimize_interval_secs: 15,
            report_interval_secs: 10,
            duration_secs: 300,
            task_timeout_secs: 5,
            shutdown_grace_secs: 5,
        }
    }
}

impl SimulationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// Outbound reporting endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportingConfig {
    /// When `false`, snapshots and actions are dropped locally.
    pub enabled: bool,
    /// Base URL of the reporting service.
    pub endpoint: String,
    /// Per-request timeout (s).
    pub request_timeout_secs: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:5000".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"grid.node_count"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario (all defaults).
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the peak-demand preset: fewer, denser nodes with frequent
    /// rebalancing.
    ///
    /// Seven sources per node push most substations toward the overload
    /// threshold.
    pub fn peak_demand() -> Self {
        Self {
            grid: GridConfig {
                node_count: 8,
                source_count: 56,
                node_base_capacity: 120.0,
                capacity_jitter: 30.0,
                ..GridConfig::default()
            },
            simulation: SimulationConfig {
                update_interval_secs: 3,
                optimize_interval_secs: 6,
                report_interval_secs: 6,
                ..SimulationConfig::default()
            },
            reporting: ReportingConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "peak_demand"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "peak_demand" => Ok(Self::peak_demand()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let g = &self.grid;
        if g.node_count == 0 {
            errors.push(ConfigError::new("grid.node_count", "must be > 0"));
        }
        if !(g.node_base_capacity > 0.0) {
            errors.push(ConfigError::new("grid.node_base_capacity", "must be > 0"));
        }
        if !(g.capacity_jitter >= 0.0) {
            errors.push(ConfigError::new("grid.capacity_jitter", "must be >= 0"));
        }
        if !(g.underload_threshold >= 0.0) {
            errors.push(ConfigError::new("grid.underload_threshold", "must be >= 0"));
        }
        if !(g.underload_threshold < g.overload_threshold) {
            errors.push(ConfigError::new(
                "grid.underload_threshold",
                "must be < grid.overload_threshold",
            ));
        }

        let s = &self.simulation;
        if s.worker_pool_size == 0 {
            errors.push(ConfigError::new("simulation.worker_pool_size", "must be > 0"));
        }
        for (field, value) in [
            ("simulation.update_interval_secs", s.update_interval_secs),
            ("simulation.optimize_interval_secs", s.optimize_interval_secs),
            ("simulation.report_interval_secs", s.report_interval_secs),
            ("simulation.task_timeout_secs", s.task_timeout_secs),
        ] {
            if value == 0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }

        let r = &self.reporting;
        if r.enabled {
            if !(r.endpoint.starts_with("http://") || r.endpoint.starts_with("https://")) {
                errors.push(ConfigError::new(
                    "reporting.endpoint",
                    format!("must be an http(s) URL, got \"{}\"", r.endpoint),
                ));
            }
            if r.request_timeout_secs == 0 {
                errors.push(ConfigError::new("reporting.request_timeout_secs", "must be > 0"));
            }
        }

        errors
    }
}
