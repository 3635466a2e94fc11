use std::env;
use std::path::Path;

use assembly_sim::experiment::{run_sweep, ExperimentConfig, SensitivityPoint, SensitivitySweep};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => ExperimentConfig::from_json_file(Path::new(&path))?,
        None => ExperimentConfig::new(),
    };
    let sweep = SensitivitySweep::default();

    println!(
        "Sensitivity sweep: {} points, +/-{:.0}% around each mean",
        sweep.steps,
        sweep.deviation * 100.0
    );

    for label in config.topology.duration_labels() {
        let points = run_sweep(&config, &label, &sweep)?;
        println!();
        println!("== {} ==", label);
        print_points(&points);
    }
    Ok(())
}

fn print_points(points: &[SensitivityPoint]) {
    let Some(first) = points.first() else {
        return;
    };

    let mut header = format!("{:>9}", "change %");
    for entry in &first.blocked_fraction {
        header.push_str(&format!(" {:>22}", format!("{} blocked", entry.name)));
    }
    for entry in &first.utilization {
        header.push_str(&format!(" {:>22}", format!("{} util", entry.name)));
    }
    for entry in &first.throughput {
        header.push_str(&format!(" {:>22}", format!("{} thr", entry.name)));
    }
    println!("{}", header);

    for point in points {
        let mut row = format!("{:>9.1}", point.change_percent);
        let values = point
            .blocked_fraction
            .iter()
            .chain(&point.utilization)
            .chain(&point.throughput);
        for entry in values {
            row.push_str(&format!(" {:>22.4}", entry.value));
        }
        println!("{}", row);
    }
}
