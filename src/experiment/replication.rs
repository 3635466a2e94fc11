use std::fs;
use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stats::Summary;
use super::topology_config::TopologyConfig;
use crate::core::config::SimulationConfig;
use crate::core::errors::SimError;
use crate::core::report::RunReport;
use crate::core::simulation_engine::SimulationEngine;

/// Configuration of a replicated experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Per-run settings; the seed is replaced for every replication
    pub simulation: SimulationConfig,
    pub topology: TopologyConfig,
    /// Number of independent runs
    pub replications: usize,
    /// Samples generated per duration pool
    pub pool_size: usize,
    /// Confidence level of the reported intervals
    pub confidence: f64,
    /// Seed from which every replication seed is derived
    pub base_seed: u64,
}

impl ExperimentConfig {
    /// Create the reference experiment: 50 runs of the reference line
    pub fn new() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            topology: TopologyConfig::reference(),
            replications: 50,
            pool_size: 1000,
            confidence: 0.95,
            base_seed: 42,
        }
    }

    /// Load an experiment description from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.simulation.validate()?;
        if self.replications == 0 {
            return Err(SimError::InvalidConfig(
                "at least one replication is required".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        Ok(())
    }

    /// Seed of replication `index`
    pub fn replication_seed(&self, index: usize) -> u64 {
        self.base_seed.wrapping_add(index as u64)
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one independent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationReport {
    pub run_id: Uuid,
    pub index: usize,
    pub seed: u64,
    pub report: RunReport,
}

/// One metric of one entity summarised across replications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub entity: String,
    pub metric: String,
    pub summary: Summary,
}

/// Every replication plus the cross-replication summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub replications: Vec<ReplicationReport>,
    pub summaries: Vec<MetricSummary>,
}

impl ExperimentReport {
    /// Find the summary of `metric` for `entity`
    pub fn summary(&self, entity: &str, metric: &str) -> Option<&Summary> {
        self.summaries
            .iter()
            .find(|s| s.entity == entity && s.metric == metric)
            .map(|s| &s.summary)
    }
}

/// Run one replication with fresh duration pools drawn from `seed`
pub fn run_once(config: &ExperimentConfig, seed: u64) -> Result<RunReport, SimError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let topology = config.topology.build(config.pool_size, &mut rng)?;
    let simulation = config.simulation.clone().with_seed(rng.gen());
    SimulationEngine::new(topology, simulation)?.run()
}

/// Run every replication in parallel and summarise the results
///
/// Reports come back in replication order regardless of scheduling.
pub fn run_replications(config: &ExperimentConfig) -> Result<ExperimentReport, SimError> {
    config.validate()?;
    info!(
        "Running {} replications of {} minutes (deletion point {})",
        config.replications, config.simulation.horizon, config.simulation.deletion_point
    );

    let replications = (0..config.replications)
        .into_par_iter()
        .map(|index| -> Result<ReplicationReport, SimError> {
            let seed = config.replication_seed(index);
            let report = run_once(config, seed)?;
            info!("Finished run {}", index + 1);
            Ok(ReplicationReport {
                run_id: Uuid::new_v4(),
                index,
                seed,
                report,
            })
        })
        .collect::<Result<Vec<_>, SimError>>()?;

    let summaries = summarize(&replications, config.confidence);
    Ok(ExperimentReport {
        replications,
        summaries,
    })
}

/// Summarise the standard metrics of every workstation and inspector
pub fn summarize(replications: &[ReplicationReport], confidence: f64) -> Vec<MetricSummary> {
    let Some(first) = replications.first() else {
        return Vec::new();
    };

    let mut summaries = Vec::new();
    let mut push = |entity: &str, metric: &str, values: Vec<f64>| {
        if let Some(summary) = Summary::from_samples(&values, confidence) {
            summaries.push(MetricSummary {
                entity: entity.to_string(),
                metric: metric.to_string(),
                summary,
            });
        }
    };

    for (i, ws) in first.report.workstations.iter().enumerate() {
        push(
            &ws.name,
            "wait_time",
            samples(replications, |r| r.workstations[i].wait_time),
        );
        push(
            &ws.name,
            "products_made",
            samples(replications, |r| r.workstations[i].products_made as f64),
        );
        push(
            &ws.name,
            "throughput",
            samples(replications, |r| r.throughput(&r.workstations[i])),
        );
        push(
            &ws.name,
            "utilization",
            samples(replications, |r| r.utilization(&r.workstations[i])),
        );
        push(
            &ws.name,
            "mean_service_time",
            samples(replications, |r| r.mean_service_time(&r.workstations[i])),
        );
    }

    for (i, insp) in first.report.inspectors.iter().enumerate() {
        push(
            &insp.name,
            "blocked_time",
            samples(replications, |r| r.inspectors[i].blocked_time),
        );
        push(
            &insp.name,
            "blocked_fraction",
            samples(replications, |r| r.blocked_fraction(&r.inspectors[i])),
        );
    }

    summaries
}

fn samples(replications: &[ReplicationReport], metric: impl Fn(&RunReport) -> f64) -> Vec<f64> {
    replications.iter().map(|r| metric(&r.report)).collect()
}
