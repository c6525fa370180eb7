use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

/// Whether a source draws power from its node or injects power into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Positive contribution to net demand.
    Consumer,
    /// Negative contribution to net demand (generation).
    Producer,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumer => write!(f, "consumer"),
            Self::Producer => write!(f, "producer"),
        }
    }
}

/// A stochastic load or generation source attached to one node.
///
/// `Source` keeps no running output. Every call to
/// [`current_output`](Source::current_output) draws a fresh value around
/// `base_load`, so two reads inside the same update cycle can differ.
///
/// # Examples
///
/// ```
/// use grid_balancer::grid::{Source, SourceKind};
///
/// let solar = Source::new("SOURCE-1", SourceKind::Producer, 20.0, 0.0, 42);
/// assert_eq!(solar.current_output(), -20.0);
/// ```
#[derive(Debug)]
pub struct Source {
    id: String,
    kind: SourceKind,
    base_load: f64,
    variability: f64,
    rng: Mutex<StdRng>,
}

impl Source {
    /// Creates a new source.
    ///
    /// # Arguments
    ///
    /// * `id` - Source identifier
    /// * `kind` - Consumer or producer
    /// * `base_load` - Nominal magnitude in MW
    /// * `variability` - Relative fluctuation, clamped to `[0, 1]`
    /// * `seed` - Seed for this source's private random generator
    pub fn new(
        id: impl Into<String>,
        kind: SourceKind,
        base_load: f64,
        variability: f64,
        seed: u64,
    ) -> Self {
        Self::with_rng(id, kind, base_load, variability, StdRng::seed_from_u64(seed))
    }

    /// Creates a new source drawing from an explicit generator.
    pub fn with_rng(
        id: impl Into<String>,
        kind: SourceKind,
        base_load: f64,
        variability: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            base_load,
            variability: variability.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn base_load(&self) -> f64 {
        self.base_load
    }

    pub fn variability(&self) -> f64 {
        self.variability
    }

    /// Returns the instantaneous signed output in MW.
    ///
    /// The magnitude is `base_load * (1 + u)` with `u` uniform in
    /// `[-variability, +variability]`. Producers return a negative value,
    /// consumers a positive one.
    pub fn current_output(&self) -> f64 {
        let draw: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random();
        let variation = (draw - 0.5) * 2.0 * self.variability;
        let magnitude = (self.base_load * (1.0 + variation)).abs();
        match self.kind {
            SourceKind::Producer => -magnitude,
            SourceKind::Consumer => magnitude,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) base={:.2} MW",
            self.id, self.kind, self.base_load
        )
    }
}
