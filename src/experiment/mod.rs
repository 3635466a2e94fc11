//! Replicated experiments over configurable assembly lines.

pub mod durations;
pub mod replication;
pub mod sensitivity;
pub mod stats;
pub mod topology_config;

pub use durations::DurationSource;
pub use replication::{
    run_once, run_replications, summarize, ExperimentConfig, ExperimentReport, MetricSummary,
    ReplicationReport,
};
pub use sensitivity::{run_sweep, EntityValue, SensitivityPoint, SensitivitySweep};
pub use stats::Summary;
pub use topology_config::TopologyConfig;
