use serde::{Deserialize, Serialize};

use super::types::SimTime;

/// A per-component counter, keyed by component name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCount {
    pub component: String,
    pub count: u64,
}

/// Final counters of one workstation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstationReport {
    pub name: String,
    pub product: String,
    /// Time spent acquiring components after the deletion point
    pub wait_time: SimTime,
    /// Products completed after the deletion point
    pub products_made: u64,
    /// Completions per simulated minute, index = `floor(minute)`
    pub production_histogram: Vec<u64>,
    /// Units taken from each buffer over the whole run
    pub components_used: Vec<ComponentCount>,
}

/// Final counters of one inspector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorReport {
    pub name: String,
    /// Time spent blocked on full buffers after the deletion point
    pub blocked_time: SimTime,
    /// Units delivered per component over the whole run
    pub components_delivered: Vec<ComponentCount>,
}

/// End-of-run state of one buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferReport {
    pub workstation: String,
    pub component: String,
    pub level: u32,
    pub capacity: u32,
    pub total_puts: u64,
    pub total_gets: u64,
}

/// Where every unit of one component type ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFlow {
    pub component: String,
    /// Units put into buffers by inspectors
    pub delivered: u64,
    /// Units taken out of buffers by workstations
    pub consumed: u64,
    /// Units still resting in buffers at the end
    pub resting: u64,
}

impl ComponentFlow {
    /// Delivered units equal consumed plus resting units
    pub fn is_conserved(&self) -> bool {
        self.delivered == self.consumed + self.resting
    }
}

/// Everything one run exposes to statistics and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub horizon: SimTime,
    pub deletion_point: SimTime,
    /// Number of clock advances performed
    pub steps: u64,
    pub workstations: Vec<WorkstationReport>,
    pub inspectors: Vec<InspectorReport>,
    pub buffers: Vec<BufferReport>,
    pub flows: Vec<ComponentFlow>,
}

impl RunReport {
    /// Length of the window statistics were collected over
    pub fn measured_window(&self) -> SimTime {
        (self.horizon - self.deletion_point).max(0.0)
    }

    /// Check unit conservation for every component type
    pub fn is_conserved(&self) -> bool {
        self.flows.iter().all(ComponentFlow::is_conserved)
    }

    pub fn workstation(&self, name: &str) -> Option<&WorkstationReport> {
        self.workstations.iter().find(|ws| ws.name == name)
    }

    pub fn inspector(&self, name: &str) -> Option<&InspectorReport> {
        self.inspectors.iter().find(|insp| insp.name == name)
    }

    /// Products per minute of the measured window
    pub fn throughput(&self, workstation: &WorkstationReport) -> f64 {
        ratio(workstation.products_made as f64, self.measured_window())
    }

    /// Fraction of the measured window a workstation was not waiting
    pub fn utilization(&self, workstation: &WorkstationReport) -> f64 {
        let window = self.measured_window();
        ratio(window - workstation.wait_time, window)
    }

    /// Busy time per product
    pub fn mean_service_time(&self, workstation: &WorkstationReport) -> f64 {
        ratio(
            self.measured_window() - workstation.wait_time,
            workstation.products_made as f64,
        )
    }

    /// Fraction of the measured window an inspector was blocked
    pub fn blocked_fraction(&self, inspector: &InspectorReport) -> f64 {
        ratio(inspector.blocked_time, self.measured_window())
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            horizon: 110.0,
            deletion_point: 10.0,
            steps: 0,
            workstations: vec![WorkstationReport {
                name: "Workstation 1".to_string(),
                product: "Product 1".to_string(),
                wait_time: 20.0,
                products_made: 40,
                production_histogram: vec![],
                components_used: vec![],
            }],
            inspectors: vec![InspectorReport {
                name: "Inspector 1".to_string(),
                blocked_time: 25.0,
                components_delivered: vec![],
            }],
            buffers: vec![],
            flows: vec![ComponentFlow {
                component: "Component 1".to_string(),
                delivered: 10,
                consumed: 8,
                resting: 2,
            }],
        }
    }

    #[test]
    fn test_derived_metrics() {
        let report = report();
        let ws = &report.workstations[0];
        assert_eq!(report.measured_window(), 100.0);
        assert_eq!(report.throughput(ws), 0.4);
        assert_eq!(report.utilization(ws), 0.8);
        assert_eq!(report.mean_service_time(ws), 2.0);
        assert_eq!(report.blocked_fraction(&report.inspectors[0]), 0.25);
        assert!(report.is_conserved());
    }

    #[test]
    fn test_missing_units_break_conservation() {
        let mut report = report();
        report.flows[0].resting = 1;
        assert!(!report.is_conserved());
    }

    #[test]
    fn test_no_products_means_zero_service_time() {
        let mut report = report();
        report.workstations[0].products_made = 0;
        let ws = report.workstations[0].clone();
        assert_eq!(report.mean_service_time(&ws), 0.0);
    }
}
