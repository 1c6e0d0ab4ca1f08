use crate::error::{ScheduleError, ScheduleResult};
use crate::statistics::DEFAULT_HISTOGRAM_BINS;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

pub const RUNS_ENV: &str = "SCHEDULE_RISK_RUNS";
pub const SEED_ENV: &str = "SCHEDULE_RISK_SEED";
pub const PARALLEL_ENV: &str = "SCHEDULE_RISK_PARALLEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_runs: usize,
    /// Reported for totals and for per-task start/finish samples.
    pub percentiles: Vec<f64>,
    /// Random seed; a fresh one is drawn when absent.
    pub seed: Option<u64>,
    pub histogram_bins: usize,
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_runs: 1000,
            percentiles: vec![10.0, 50.0, 80.0, 90.0],
            seed: None,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            parallel: true,
        }
    }
}

impl SimulationConfig {
    pub fn with_runs(mut self, num_runs: usize) -> Self {
        self.num_runs = num_runs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.percentiles = percentiles;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Overlays `SCHEDULE_RISK_RUNS`, `SCHEDULE_RISK_SEED` and
    /// `SCHEDULE_RISK_PARALLEL` when they are set and parse.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(runs) = env_value::<usize>(RUNS_ENV) {
            self.num_runs = runs;
        }
        if let Some(seed) = env_value::<u64>(SEED_ENV) {
            self.seed = Some(seed);
        }
        if let Some(parallel) = env_value::<bool>(PARALLEL_ENV) {
            self.parallel = parallel;
        }
        self
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        if let Some(p) = self
            .percentiles
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 100.0)
        {
            return Err(ScheduleError::InvalidConfig(format!(
                "percentile {p} is outside [0, 100]"
            )));
        }
        if self.histogram_bins == 0 {
            return Err(ScheduleError::InvalidConfig(
                "histogram_bins must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
