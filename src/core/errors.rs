/// Errors raised while building or running an assembly line simulation.
///
/// Temporary buffer shortages are never errors: they are the queueing
/// behaviour being measured. Everything here is fatal for the run.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A process tried to draw a duration from an empty sample pool
    PoolExhausted { owner: String, pool: String },
    /// An inspector produces a component no candidate workstation buffers
    UnroutableComponent { inspector: String, component: String },
    /// A component handle or name that the topology does not know
    UnknownComponent(String),
    /// A product handle or name that the topology does not know
    UnknownProduct(String),
    /// A workstation handle or name that the topology does not know
    UnknownWorkstation(String),
    /// A product that requires no components
    EmptyProduct(String),
    /// An inspector configured without any component to inspect
    EmptyInspector(String),
    /// Two entities of the same kind share a name in a named configuration
    DuplicateName(String),
    /// A negative, NaN or infinite duration sample
    InvalidDuration { owner: String, value: f64 },
    /// Any other inconsistent configuration value
    InvalidConfig(String),
    /// Reading an empirical data file failed
    Io(String),
    /// An empirical data file contained something that is not a number
    Parse(String),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::PoolExhausted { owner, pool } => write!(
                f,
                "Duration pool '{}' of '{}' is exhausted; pool too small for the horizon",
                pool, owner
            ),
            SimError::UnroutableComponent {
                inspector,
                component,
            } => write!(
                f,
                "Inspector '{}' produces '{}' but no candidate workstation buffers it",
                inspector, component
            ),
            SimError::UnknownComponent(name) => write!(f, "Unknown component: {}", name),
            SimError::UnknownProduct(name) => write!(f, "Unknown product: {}", name),
            SimError::UnknownWorkstation(name) => write!(f, "Unknown workstation: {}", name),
            SimError::EmptyProduct(name) => {
                write!(f, "Product '{}' requires no components", name)
            }
            SimError::EmptyInspector(name) => {
                write!(f, "Inspector '{}' has no components to inspect", name)
            }
            SimError::DuplicateName(name) => write!(f, "Duplicate name: {}", name),
            SimError::InvalidDuration { owner, value } => {
                write!(f, "Invalid duration {} for '{}'", value, owner)
            }
            SimError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            SimError::Io(msg) => write!(f, "I/O error: {}", msg),
            SimError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Parse(err.to_string())
    }
}
