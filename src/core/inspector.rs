use log::debug;
use rand::Rng;

use super::buffer::BufferRegistry;
use super::config::RoutingPolicy;
use super::errors::SimError;
use super::pool::DurationPool;
use super::process::{Process, ProcessContext, Yield};
use super::types::{measured_span, BufferKey, ComponentId, InspectorId, SimTime, WorkstationId};

/// One inspected component with its sample pool and eligible destinations
#[derive(Debug, Clone)]
pub struct InspectedComponent {
    pub component: ComponentId,
    pub name: String,
    pub inspection_times: DurationPool,
    /// Candidate workstations buffering this component, in priority order
    pub routes: Vec<WorkstationId>,
    /// Rotation cursor for `RoutingPolicy::Alternate`
    cursor: usize,
}

impl InspectedComponent {
    pub fn new(
        component: ComponentId,
        name: &str,
        inspection_times: DurationPool,
        routes: Vec<WorkstationId>,
    ) -> Self {
        Self {
            component,
            name: name.to_string(),
            inspection_times,
            routes,
            cursor: 0,
        }
    }
}

/// Stored continuation of an inspector between two resumptions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InspectorState {
    /// About to pick and inspect a new component
    Inspecting,
    /// Inspection delay running for the component at this index
    Routing { slot: usize },
    /// `put` issued at `since` into `target`
    Delivering {
        slot: usize,
        target: WorkstationId,
        since: SimTime,
    },
}

/// Process that inspects randomly chosen components and routes each one
/// to a downstream workstation buffer, blocking while the target is full.
#[derive(Debug, Clone)]
pub struct Inspector {
    id: InspectorId,
    name: String,
    components: Vec<InspectedComponent>,
    policy: RoutingPolicy,
    state: InspectorState,
    blocked_time: SimTime,
    components_delivered: Vec<u64>,
}

impl Inspector {
    /// Create an inspector; every entry must have at least one route
    pub fn new(
        id: InspectorId,
        name: &str,
        components: Vec<InspectedComponent>,
        policy: RoutingPolicy,
    ) -> Result<Self, SimError> {
        if components.is_empty() {
            return Err(SimError::EmptyInspector(name.to_string()));
        }
        if let Some(unroutable) = components.iter().find(|c| c.routes.is_empty()) {
            return Err(SimError::UnroutableComponent {
                inspector: name.to_string(),
                component: unroutable.name.clone(),
            });
        }
        let components_delivered = vec![0; components.len()];
        Ok(Self {
            id,
            name: name.to_string(),
            components,
            policy,
            state: InspectorState::Inspecting,
            blocked_time: 0.0,
            components_delivered,
        })
    }

    pub fn id(&self) -> InspectorId {
        self.id
    }

    pub fn state(&self) -> InspectorState {
        self.state
    }

    /// Time spent blocked on full buffers after the deletion point
    pub fn blocked_time(&self) -> SimTime {
        self.blocked_time
    }

    /// Inspected components, in configuration order
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.iter().map(|c| c.component)
    }

    /// Units delivered over the whole run, parallel to `components`
    pub fn components_delivered(&self) -> &[u64] {
        &self.components_delivered
    }

    fn choose_target(&mut self, slot: usize, buffers: &BufferRegistry) -> WorkstationId {
        let entry = &mut self.components[slot];
        match self.policy {
            RoutingPolicy::LeastLoaded => least_loaded(&entry.routes, entry.component, buffers),
            RoutingPolicy::Alternate => {
                let count = entry.routes.len();
                let start = entry.cursor % count;
                // First non-full candidate in rotation, else block on the next in line
                let offset = (0..count)
                    .find(|offset| {
                        let ws = entry.routes[(start + offset) % count];
                        !buffers
                            .get(&BufferKey::new(ws, entry.component))
                            .map_or(true, |b| b.is_full())
                    })
                    .unwrap_or(0);
                let index = (start + offset) % count;
                entry.cursor = index + 1;
                entry.routes[index]
            }
        }
    }
}

/// Least-filled candidate for `component`, ties going to the earliest candidate
pub fn least_loaded(
    routes: &[WorkstationId],
    component: ComponentId,
    buffers: &BufferRegistry,
) -> WorkstationId {
    let level = |ws: &WorkstationId| {
        buffers
            .level(&BufferKey::new(*ws, component))
            .unwrap_or(u32::MAX)
    };
    let min_level = routes.iter().map(level).min().unwrap_or(u32::MAX);
    routes
        .iter()
        .copied()
        .find(|ws| level(ws) == min_level)
        .unwrap_or(routes[0])
}

impl Process for Inspector {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Yield, SimError> {
        loop {
            match self.state {
                InspectorState::Inspecting => {
                    let slot = ctx.rng.gen_range(0..self.components.len());
                    let entry = &mut self.components[slot];
                    let delay = entry.inspection_times.draw(&mut *ctx.rng).ok_or_else(|| {
                        SimError::PoolExhausted {
                            owner: self.name.clone(),
                            pool: format!("{} inspection times", entry.name),
                        }
                    })?;
                    self.state = InspectorState::Routing { slot };
                    return Ok(Yield::Timeout(delay));
                }
                InspectorState::Routing { slot } => {
                    let target = self.choose_target(slot, ctx.buffers);
                    let entry = &self.components[slot];
                    let component = entry.component;
                    debug!(
                        "{} sent {} to workstation #{} at {:.2} minutes",
                        self.name,
                        entry.name,
                        target.index(),
                        ctx.now
                    );
                    self.state = InspectorState::Delivering {
                        slot,
                        target,
                        since: ctx.now,
                    };
                    return Ok(Yield::Put(BufferKey::new(target, component)));
                }
                InspectorState::Delivering { slot, since, .. } => {
                    self.blocked_time += measured_span(since, ctx.now, ctx.deletion_point);
                    self.components_delivered[slot] += 1;
                    self.state = InspectorState::Inspecting;
                }
            }
        }
    }
}
