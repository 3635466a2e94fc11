use log::debug;

use super::errors::SimError;
use super::pool::DurationPool;
use super::process::{Process, ProcessContext, Yield};
use super::types::{measured_span, BufferKey, ComponentId, SimTime, WorkstationId};

/// Stored continuation of a workstation between two resumptions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkstationState {
    /// About to start a new acquisition phase
    Idle,
    /// Collecting components; `next` indexes the next one to request
    Acquiring { next: usize, started_at: SimTime },
    /// Waiting for the processing delay to elapse
    Producing,
}

/// Process that consumes one unit of each required component and then
/// spends a sampled processing time assembling a product.
#[derive(Debug, Clone)]
pub struct Workstation {
    id: WorkstationId,
    name: String,
    product_name: String,
    required: Vec<ComponentId>,
    processing_times: DurationPool,
    state: WorkstationState,
    wait_time: SimTime,
    products_made: u64,
    production_histogram: Vec<u64>,
    components_used: Vec<u64>,
}

impl Workstation {
    /// Create a workstation building a product from `required` components
    pub fn new(
        id: WorkstationId,
        name: &str,
        product_name: &str,
        required: Vec<ComponentId>,
        processing_times: DurationPool,
    ) -> Self {
        let components_used = vec![0; required.len()];
        Self {
            id,
            name: name.to_string(),
            product_name: product_name.to_string(),
            required,
            processing_times,
            state: WorkstationState::Idle,
            wait_time: 0.0,
            products_made: 0,
            production_histogram: Vec::new(),
            components_used,
        }
    }

    pub fn id(&self) -> WorkstationId {
        self.id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Components this workstation buffers, in acquisition order
    pub fn required_components(&self) -> &[ComponentId] {
        &self.required
    }

    pub fn state(&self) -> WorkstationState {
        self.state
    }

    /// Time spent acquiring components after the deletion point
    pub fn wait_time(&self) -> SimTime {
        self.wait_time
    }

    /// Products completed after the deletion point
    pub fn products_made(&self) -> u64 {
        self.products_made
    }

    /// Completions per simulated minute, indexed by `floor(time)`
    pub fn production_histogram(&self) -> &[u64] {
        &self.production_histogram
    }

    /// Units taken from each buffer over the whole run, parallel to
    /// `required_components`
    pub fn components_used(&self) -> &[u64] {
        &self.components_used
    }

    fn buffer_key(&self, component: ComponentId) -> BufferKey {
        BufferKey::new(self.id, component)
    }

    fn record_product(&mut self, now: SimTime) {
        self.products_made += 1;
        let minute = now.floor() as usize;
        if self.production_histogram.len() <= minute {
            self.production_histogram.resize(minute + 1, 0);
        }
        self.production_histogram[minute] += 1;
    }
}

impl Process for Workstation {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Yield, SimError> {
        loop {
            match self.state {
                WorkstationState::Idle => {
                    self.state = WorkstationState::Acquiring {
                        next: 0,
                        started_at: ctx.now,
                    };
                }
                WorkstationState::Acquiring { next, started_at } => {
                    // Being resumed here means the previous get completed
                    if next > 0 {
                        self.components_used[next - 1] += 1;
                    }
                    if let Some(component) = self.required.get(next).copied() {
                        self.state = WorkstationState::Acquiring {
                            next: next + 1,
                            started_at,
                        };
                        return Ok(Yield::Get(self.buffer_key(component)));
                    }

                    self.wait_time += measured_span(started_at, ctx.now, ctx.deletion_point);
                    let duration = self.processing_times.draw(&mut *ctx.rng).ok_or_else(|| {
                        SimError::PoolExhausted {
                            owner: self.name.clone(),
                            pool: "processing times".to_string(),
                        }
                    })?;
                    self.state = WorkstationState::Producing;
                    return Ok(Yield::Timeout(duration));
                }
                WorkstationState::Producing => {
                    debug!(
                        "{} created {} at {:.2} minutes",
                        self.name, self.product_name, ctx.now
                    );
                    if ctx.is_measuring() {
                        self.record_product(ctx.now);
                    }
                    self.state = WorkstationState::Idle;
                }
            }
        }
    }
}
