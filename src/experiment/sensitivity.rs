use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::replication::{run_once, ExperimentConfig};
use crate::core::errors::SimError;

/// How far and how finely one input mean is varied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySweep {
    /// Number of points, evenly spread over the factor range
    pub steps: usize,
    /// Maximum relative change; factors span `[1 - deviation, 1 + deviation]`
    pub deviation: f64,
}

impl Default for SensitivitySweep {
    fn default() -> Self {
        Self {
            steps: 101,
            deviation: 0.5,
        }
    }
}

impl SensitivitySweep {
    /// Scaling factor applied at point `step`
    pub fn factor(&self, step: usize) -> f64 {
        1.0 - self.deviation + 2.0 * self.deviation * step as f64 / (self.steps - 1) as f64
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.steps < 2 {
            return Err(SimError::InvalidConfig(
                "a sweep needs at least two steps".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.deviation) {
            return Err(SimError::InvalidConfig(format!(
                "deviation must lie in [0, 1), got {}",
                self.deviation
            )));
        }
        Ok(())
    }
}

/// A named value measured at one sweep point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityValue {
    pub name: String,
    pub value: f64,
}

/// Derived metrics of one run at one scaling factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub label: String,
    pub factor: f64,
    /// `(factor - 1) * 100`
    pub change_percent: f64,
    pub blocked_fraction: Vec<EntityValue>,
    pub utilization: Vec<EntityValue>,
    pub throughput: Vec<EntityValue>,
}

/// Vary the mean of the duration source `label` and run once per point
pub fn run_sweep(
    config: &ExperimentConfig,
    label: &str,
    sweep: &SensitivitySweep,
) -> Result<Vec<SensitivityPoint>, SimError> {
    config.validate()?;
    sweep.validate()?;
    // Fail on an unknown label before spawning any run
    config.topology.clone().scale_duration(label, 1.0)?;
    info!("Sweeping '{}' over {} points", label, sweep.steps);

    (0..sweep.steps)
        .into_par_iter()
        .map(|step| -> Result<SensitivityPoint, SimError> {
            let factor = sweep.factor(step);
            let mut scaled = config.clone();
            scaled.topology.scale_duration(label, factor)?;
            let report = run_once(&scaled, config.replication_seed(step))?;

            let entry = |name: &str, value: f64| EntityValue {
                name: name.to_string(),
                value,
            };
            Ok(SensitivityPoint {
                label: label.to_string(),
                factor,
                change_percent: (factor - 1.0) * 100.0,
                blocked_fraction: report
                    .inspectors
                    .iter()
                    .map(|insp| entry(&insp.name, report.blocked_fraction(insp)))
                    .collect(),
                utilization: report
                    .workstations
                    .iter()
                    .map(|ws| entry(&ws.name, report.utilization(ws)))
                    .collect(),
                throughput: report
                    .workstations
                    .iter()
                    .map(|ws| entry(&ws.name, report.throughput(ws)))
                    .collect(),
            })
        })
        .collect()
}
