use serde::{Deserialize, Serialize};

/// Simulated time in minutes
pub type SimTime = f64;

/// Handle identifying one component type inside a topology.
///
/// Components are compared by identity: two components created with the
/// same name are still distinct buffer keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    /// Get the position of this component in its topology
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle identifying a product definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub(crate) usize);

impl ProductId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle identifying a workstation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkstationId(pub(crate) usize);

impl WorkstationId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle identifying an inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InspectorId(pub(crate) usize);

impl InspectorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A schedulable process: either a workstation or an inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessId {
    Workstation(WorkstationId),
    Inspector(InspectorId),
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessId::Workstation(id) => write!(f, "workstation#{}", id.0),
            ProcessId::Inspector(id) => write!(f, "inspector#{}", id.0),
        }
    }
}

/// Key of one bounded buffer: the component slot inside a workstation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferKey {
    pub workstation: WorkstationId,
    pub component: ComponentId,
}

impl BufferKey {
    pub fn new(workstation: WorkstationId, component: ComponentId) -> Self {
        Self {
            workstation,
            component,
        }
    }
}

/// Portion of the interval `[since, now]` that lies at or after the deletion point.
///
/// Returns zero while `now` is still inside the warm-up period.
pub fn measured_span(since: SimTime, now: SimTime, deletion_point: SimTime) -> SimTime {
    if now < deletion_point {
        return 0.0;
    }
    (now - since.max(deletion_point)).max(0.0)
}
