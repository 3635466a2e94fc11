use rand::rngs::StdRng;

use super::buffer::BufferRegistry;
use super::errors::SimError;
use super::types::{BufferKey, SimTime};

/// What a process hands back to the engine when it gives up control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Yield {
    /// Resume me after this much simulated time
    Timeout(SimTime),
    /// Take one unit from this buffer, parking me while it is empty
    Get(BufferKey),
    /// Store one unit in this buffer, parking me while it is full
    Put(BufferKey),
}

/// Everything a process may look at while it runs one step.
///
/// Buffers are read-only here: all mutation goes through the engine's
/// handling of `Yield::Get` and `Yield::Put`.
pub struct ProcessContext<'a> {
    /// Current simulated time
    pub now: SimTime,
    /// Statistics only accumulate at or after this time
    pub deletion_point: SimTime,
    /// Levels of every buffer in the line
    pub buffers: &'a BufferRegistry,
    /// The run's random stream
    pub rng: &'a mut StdRng,
}

impl ProcessContext<'_> {
    /// Whether the warm-up period is over
    pub fn is_measuring(&self) -> bool {
        self.now >= self.deletion_point
    }
}

/// A cooperative process driven by the engine.
///
/// Each call to `resume` runs the state machine from its stored state up to
/// the next suspension point. The engine calls `resume` again once the
/// yielded request is satisfied: immediately when a buffer operation
/// completes without blocking, later for timeouts and parked operations.
pub trait Process {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Advance to the next suspension point
    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Yield, SimError>;
}
