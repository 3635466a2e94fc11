use assembly_sim::experiment::{
    run_once, run_replications, run_sweep, DurationSource, ExperimentConfig, SensitivitySweep,
    TopologyConfig,
};
use assembly_sim::{SimError, SimulationConfig};

fn small_experiment() -> ExperimentConfig {
    ExperimentConfig::new()
        .with_replications(4)
        .with_pool_size(300)
        .with_base_seed(1234)
        .with_simulation(
            SimulationConfig::new()
                .with_horizon(500.0)
                .with_deletion_point(50.0),
        )
}

#[test]
fn test_replications_come_back_in_order() {
    let config = small_experiment();
    let report = run_replications(&config).unwrap();

    assert_eq!(report.replications.len(), 4);
    for (i, replication) in report.replications.iter().enumerate() {
        assert_eq!(replication.index, i);
        assert_eq!(replication.seed, config.replication_seed(i));
        assert!(replication.report.is_conserved());
    }
    // Every run gets its own id
    assert_ne!(report.replications[0].run_id, report.replications[1].run_id);
}

#[test]
fn test_replications_are_reproducible() {
    let config = small_experiment();
    let first = run_replications(&config).unwrap();
    let second = run_replications(&config).unwrap();

    for (a, b) in first.replications.iter().zip(&second.replications) {
        assert_eq!(a.report, b.report);
    }
    assert_eq!(first.summaries, second.summaries);
}

#[test]
fn test_summaries_cover_every_entity() {
    let report = run_replications(&small_experiment()).unwrap();

    for ws in ["Workstation 1", "Workstation 2", "Workstation 3"] {
        for metric in ["wait_time", "products_made", "throughput", "utilization"] {
            let summary = report.summary(ws, metric).unwrap();
            assert_eq!(summary.samples, 4);
            assert!(summary.ci_low <= summary.mean && summary.mean <= summary.ci_high);
        }
        let utilization = report.summary(ws, "utilization").unwrap();
        assert!(utilization.mean > 0.0 && utilization.mean <= 1.0);
    }
    for insp in ["Inspector 1", "Inspector 2"] {
        assert!(report.summary(insp, "blocked_time").is_some());
        let fraction = report.summary(insp, "blocked_fraction").unwrap();
        assert!(fraction.mean >= 0.0 && fraction.mean <= 1.0);
    }
    assert!(report.summary("Workstation 9", "wait_time").is_none());
}

#[test]
fn test_zero_replications_rejected() {
    let config = small_experiment().with_replications(0);
    assert!(matches!(
        run_replications(&config),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn test_fixed_durations_ignore_the_seed() {
    let mut topology = TopologyConfig::reference();
    for ws in &mut topology.workstations {
        ws.processing = DurationSource::Fixed { value: 5.0 };
    }
    for insp in &mut topology.inspectors {
        for entry in &mut insp.components {
            entry.inspection = DurationSource::Fixed { value: 4.0 };
        }
    }
    let mut config = small_experiment();
    config.topology = topology;

    // Only the choice of component at Inspector 2 is random
    let report = run_once(&config, 5).unwrap();
    let ws1 = report.workstation("Workstation 1").unwrap();
    assert!(ws1.products_made > 0);
    assert!(report.is_conserved());
}

#[test]
fn test_experiment_config_json_round_trip() {
    let config = small_experiment();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: ExperimentConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let path = std::env::temp_dir().join(format!("experiment_{}.json", std::process::id()));
    std::fs::write(&path, &json).unwrap();
    let loaded = ExperimentConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_json_takes_defaults() {
    let parsed: ExperimentConfig =
        serde_json::from_str(r#"{"replications": 3, "simulation": {"horizon": 400.0}}"#).unwrap();
    assert_eq!(parsed.replications, 3);
    assert_eq!(parsed.simulation.horizon, 400.0);
    assert_eq!(parsed.simulation.deletion_point, 300.0);
    assert_eq!(parsed.simulation.buffer_capacity, 2);
    assert_eq!(parsed.topology, TopologyConfig::reference());
}

#[test]
fn test_sensitivity_sweep_points() {
    let config = small_experiment();
    let sweep = SensitivitySweep {
        steps: 5,
        deviation: 0.5,
    };
    let points = run_sweep(&config, "Inspector 1/Component 1", &sweep).unwrap();

    assert_eq!(points.len(), 5);
    let changes: Vec<f64> = points.iter().map(|p| p.change_percent).collect();
    assert_eq!(changes, vec![-50.0, -25.0, 0.0, 25.0, 50.0]);
    for point in &points {
        assert_eq!(point.label, "Inspector 1/Component 1");
        assert_eq!(point.blocked_fraction.len(), 2);
        assert_eq!(point.utilization.len(), 3);
        assert_eq!(point.throughput.len(), 3);
    }
}
