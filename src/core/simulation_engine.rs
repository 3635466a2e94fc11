use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::buffer::{BoundedBuffer, BufferOutcome, BufferRegistry};
use super::config::SimulationConfig;
use super::errors::SimError;
use super::event_scheduler::EventScheduler;
use super::inspector::{InspectedComponent, Inspector};
use super::process::{Process, ProcessContext, Yield};
use super::report::{
    BufferReport, ComponentCount, ComponentFlow, InspectorReport, RunReport, WorkstationReport,
};
use super::topology::Topology;
use super::types::{BufferKey, ComponentId, InspectorId, ProcessId, SimTime, WorkstationId};
use super::workstation::Workstation;

/// Observer trait for simulation progress
pub trait SimulationObserver {
    /// Called when the simulated clock moves forward
    fn on_time_advance(&mut self, _old_time: SimTime, _new_time: SimTime) {}

    /// Called after every process due at `time` has been resumed
    fn on_step_complete(&mut self, engine: &SimulationEngine, time: SimTime, resumed: usize);
}

/// Result of one `advance` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceOutcome {
    /// The clock moved to `time` and `resumed` processes ran
    Advanced { time: SimTime, resumed: usize },
    /// Nothing is pending: every process is parked on a buffer
    Idle,
}

/// Discrete-event kernel for one assembly line run.
///
/// Single-threaded and cooperative: exactly one process runs at a time and
/// buffers only change inside the engine's handling of a yielded request.
pub struct SimulationEngine {
    config: SimulationConfig,
    component_names: Vec<String>,
    scheduler: EventScheduler,
    buffers: BufferRegistry,
    workstations: Vec<Workstation>,
    inspectors: Vec<Inspector>,
    rng: StdRng,
    steps: u64,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl SimulationEngine {
    /// Build every process and buffer of `topology` and schedule all
    /// processes to start at time zero, workstations first
    pub fn new(topology: Topology, config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;

        let component_names: Vec<String> = topology
            .components()
            .iter()
            .map(|c| c.name.clone())
            .collect();

        let mut buffers = BufferRegistry::new();
        let mut workstations = Vec::with_capacity(topology.workstations().len());
        for spec in topology.workstations() {
            let product = topology
                .product(spec.product)
                .ok_or_else(|| SimError::UnknownProduct(format!("#{}", spec.product.index())))?;
            for component in &product.required_components {
                buffers.insert(BufferKey::new(spec.id, *component), config.buffer_capacity);
            }
            workstations.push(Workstation::new(
                spec.id,
                &spec.name,
                &product.name,
                product.required_components.clone(),
                spec.processing_times.clone(),
            ));
        }

        let mut inspectors = Vec::with_capacity(topology.inspectors().len());
        for spec in topology.inspectors() {
            let components = spec
                .components
                .iter()
                .map(|(component, pool)| {
                    InspectedComponent::new(
                        *component,
                        &component_names[component.index()],
                        pool.clone(),
                        topology.eligible_workstations(&spec.candidates, *component),
                    )
                })
                .collect();
            inspectors.push(Inspector::new(
                spec.id,
                &spec.name,
                components,
                config.routing_policy,
            )?);
        }

        let mut scheduler = EventScheduler::new();
        for ws in &workstations {
            scheduler.schedule(ProcessId::Workstation(ws.id()), 0.0);
        }
        for insp in &inspectors {
            scheduler.schedule(ProcessId::Inspector(insp.id()), 0.0);
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            component_names,
            scheduler,
            buffers,
            workstations,
            inspectors,
            steps: 0,
            observers: Vec::new(),
        })
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// Move the clock to the earliest pending instant and resume every
    /// process due then, in the order they were scheduled
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SimError> {
        let old_time = self.scheduler.now();
        let Some((time, processes)) = self.scheduler.pop_next_instant() else {
            return Ok(AdvanceOutcome::Idle);
        };

        if time != old_time {
            self.notify_time_advance(old_time, time);
        }
        debug!("=== Simulation time {:.3} ===", time);

        let resumed = processes.len();
        for process in processes {
            self.resume_process(process)?;
        }
        self.steps += 1;

        self.notify_step_complete(time, resumed);
        Ok(AdvanceOutcome::Advanced { time, resumed })
    }

    /// Advance until the next pending instant would reach `horizon`, then
    /// stop the clock at `horizon`. Wake-ups at or after the horizon are
    /// left pending and never run.
    ///
    /// `horizon` may not exceed the configured horizon, which fixes the
    /// window every report is measured over.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<(), SimError> {
        if !horizon.is_finite() || horizon < self.scheduler.now() {
            return Err(SimError::InvalidConfig(format!(
                "horizon {} lies before the current time {}",
                horizon,
                self.scheduler.now()
            )));
        }
        if horizon > self.config.horizon {
            return Err(SimError::InvalidConfig(format!(
                "horizon {} lies beyond the configured horizon {}",
                horizon, self.config.horizon
            )));
        }

        while let Some(next) = self.scheduler.peek_next_time() {
            if next >= horizon {
                break;
            }
            self.advance()?;
        }
        if !self.scheduler.has_pending() {
            warn!(
                "Line went idle at {:.3} before the horizon {:.3}; every process is parked",
                self.scheduler.now(),
                horizon
            );
        }
        self.scheduler.advance_to(horizon);
        Ok(())
    }

    /// Run to the configured horizon and return the final counters
    pub fn run(&mut self) -> Result<RunReport, SimError> {
        info!(
            "Starting run: horizon {}, deletion point {}, seed {}",
            self.config.horizon, self.config.deletion_point, self.config.seed
        );
        self.run_until(self.config.horizon)?;
        info!("Run finished after {} steps", self.steps);
        Ok(self.report())
    }

    fn resume_process(&mut self, process: ProcessId) -> Result<(), SimError> {
        loop {
            let mut ctx = ProcessContext {
                now: self.scheduler.now(),
                deletion_point: self.config.deletion_point,
                buffers: &self.buffers,
                rng: &mut self.rng,
            };
            let yielded = match process {
                ProcessId::Workstation(id) => self.workstations[id.index()].resume(&mut ctx)?,
                ProcessId::Inspector(id) => self.inspectors[id.index()].resume(&mut ctx)?,
            };

            let (key, outcome) = match yielded {
                Yield::Timeout(delay) => {
                    if !delay.is_finite() || delay < 0.0 {
                        return Err(SimError::InvalidDuration {
                            owner: self.process_name(process).to_string(),
                            value: delay,
                        });
                    }
                    self.scheduler.schedule_in(process, delay);
                    return Ok(());
                }
                Yield::Get(key) => (key, self.buffer_mut(key)?.get(process)),
                Yield::Put(key) => (key, self.buffer_mut(key)?.put(process)),
            };

            match outcome {
                // Completed without blocking: keep running the same process
                BufferOutcome::Ready { woken } => {
                    if let Some(woken) = woken {
                        self.scheduler.schedule_in(woken, 0.0);
                    }
                }
                BufferOutcome::Suspended => {
                    debug!(
                        "{} parked on workstation #{} component #{}",
                        self.process_name(process),
                        key.workstation.index(),
                        key.component.index()
                    );
                    return Ok(());
                }
            }
        }
    }

    fn buffer_mut(&mut self, key: BufferKey) -> Result<&mut BoundedBuffer, SimError> {
        self.buffers.get_mut(&key).ok_or_else(|| {
            SimError::InvalidConfig(format!(
                "workstation #{} has no buffer for component #{}",
                key.workstation.index(),
                key.component.index()
            ))
        })
    }

    fn process_name(&self, process: ProcessId) -> &str {
        match process {
            ProcessId::Workstation(id) => self.workstations[id.index()].name(),
            ProcessId::Inspector(id) => self.inspectors[id.index()].name(),
        }
    }

    fn notify_time_advance(&mut self, old_time: SimTime, new_time: SimTime) {
        for observer in &mut self.observers {
            observer.on_time_advance(old_time, new_time);
        }
    }

    fn notify_step_complete(&mut self, time: SimTime, resumed: usize) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer.on_step_complete(self, time, resumed);
        }
        self.observers = observers;
    }

    /// Snapshot of every counter the run exposes
    pub fn report(&self) -> RunReport {
        let minutes = self.config.horizon.ceil().max(0.0) as usize;
        let count = |component: &ComponentId, count: u64| ComponentCount {
            component: self.component_names[component.index()].clone(),
            count,
        };

        let workstations = self
            .workstations
            .iter()
            .map(|ws| {
                let mut histogram = ws.production_histogram().to_vec();
                if histogram.len() < minutes {
                    histogram.resize(minutes, 0);
                }
                WorkstationReport {
                    name: ws.name().to_string(),
                    product: ws.product_name().to_string(),
                    wait_time: ws.wait_time(),
                    products_made: ws.products_made(),
                    production_histogram: histogram,
                    components_used: ws
                        .required_components()
                        .iter()
                        .zip(ws.components_used())
                        .map(|(c, used)| count(c, *used))
                        .collect(),
                }
            })
            .collect();

        let inspectors = self
            .inspectors
            .iter()
            .map(|insp| InspectorReport {
                name: insp.name().to_string(),
                blocked_time: insp.blocked_time(),
                components_delivered: insp
                    .components()
                    .zip(insp.components_delivered())
                    .map(|(c, delivered)| count(&c, *delivered))
                    .collect(),
            })
            .collect();

        let buffers = self
            .buffers
            .iter()
            .map(|(key, buffer)| BufferReport {
                workstation: self.workstations[key.workstation.index()].name().to_string(),
                component: self.component_names[key.component.index()].clone(),
                level: buffer.level(),
                capacity: buffer.capacity(),
                total_puts: buffer.total_puts(),
                total_gets: buffer.total_gets(),
            })
            .collect();

        RunReport {
            horizon: self.config.horizon,
            deletion_point: self.config.deletion_point,
            steps: self.steps,
            workstations,
            inspectors,
            buffers,
            flows: self.component_flows(),
        }
    }

    fn component_flows(&self) -> Vec<ComponentFlow> {
        let mut flows: Vec<ComponentFlow> = self
            .component_names
            .iter()
            .map(|name| ComponentFlow {
                component: name.clone(),
                delivered: 0,
                consumed: 0,
                resting: 0,
            })
            .collect();

        for insp in &self.inspectors {
            for (component, delivered) in insp.components().zip(insp.components_delivered()) {
                flows[component.index()].delivered += delivered;
            }
        }
        for ws in &self.workstations {
            for (component, used) in ws.required_components().iter().zip(ws.components_used()) {
                flows[component.index()].consumed += used;
            }
        }
        for (key, buffer) in self.buffers.iter() {
            flows[key.component.index()].resting += u64::from(buffer.level());
        }
        flows
    }

    /// Get current simulation time
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Number of clock advances performed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Check if any process is waiting on a timed wake-up
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_pending()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn buffers(&self) -> &BufferRegistry {
        &self.buffers
    }

    pub fn workstations(&self) -> &[Workstation] {
        &self.workstations
    }

    pub fn inspectors(&self) -> &[Inspector] {
        &self.inspectors
    }

    pub fn workstation(&self, id: WorkstationId) -> Option<&Workstation> {
        self.workstations.get(id.index())
    }

    pub fn inspector(&self, id: InspectorId) -> Option<&Inspector> {
        self.inspectors.get(id.index())
    }
}
