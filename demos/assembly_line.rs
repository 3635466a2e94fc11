use std::env;
use std::path::Path;

use assembly_sim::experiment::{run_replications, ExperimentConfig, ExperimentReport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let json_output = args.iter().any(|a| a == "--json");
    let config = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => ExperimentConfig::from_json_file(Path::new(path))?,
        None => ExperimentConfig::new(),
    };

    let report = run_replications(&config)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Assembly line experiment");
    println!(
        "  {} replications, horizon {} min, deletion point {} min, buffer capacity {}",
        config.replications,
        config.simulation.horizon,
        config.simulation.deletion_point,
        config.simulation.buffer_capacity
    );
    println!("  Routing policy: {:?}", config.simulation.routing_policy);
    println!();
    print_summaries(&report, config.confidence);
    print_conservation(&report);
    Ok(())
}

fn print_summaries(report: &ExperimentReport, confidence: f64) {
    println!(
        "{:<14} {:<18} {:>12} {:>12} {:>26}",
        "Entity",
        "Metric",
        "Mean",
        "Std dev",
        format!("{:.0}% interval", confidence * 100.0)
    );
    println!("{}", "-".repeat(86));
    for entry in &report.summaries {
        let s = &entry.summary;
        println!(
            "{:<14} {:<18} {:>12.4} {:>12.4} {:>12.4} .. {:<12.4}",
            entry.entity, entry.metric, s.mean, s.std_dev, s.ci_low, s.ci_high
        );
    }
    println!();
}

fn print_conservation(report: &ExperimentReport) {
    let violations: Vec<usize> = report
        .replications
        .iter()
        .filter(|r| !r.report.is_conserved())
        .map(|r| r.index)
        .collect();
    if violations.is_empty() {
        println!(
            "Component flows conserved in all {} replications",
            report.replications.len()
        );
    } else {
        println!("Component flows NOT conserved in replications {:?}", violations);
    }
}
