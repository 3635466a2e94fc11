pub mod core;
pub mod experiment;

// Re-export commonly used types
pub use crate::core::config::{RoutingPolicy, SimulationConfig};
pub use crate::core::errors::SimError;
pub use crate::core::pool::DurationPool;
pub use crate::core::report::RunReport;
pub use crate::core::simulation_engine::{AdvanceOutcome, SimulationEngine, SimulationObserver};
pub use crate::core::topology::Topology;
pub use crate::core::types::{ComponentId, InspectorId, ProductId, SimTime, WorkstationId};
