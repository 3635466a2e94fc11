use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::SimError;
use super::types::SimTime;

/// A finite pool of pre-generated durations, sampled without replacement.
///
/// Each draw removes one uniformly chosen element. The pool has to be sized
/// for the whole run; drawing from an empty pool is a configuration error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationPool {
    samples: Vec<SimTime>,
}

impl DurationPool {
    /// Create a pool, rejecting negative or non-finite samples
    pub fn new(owner: &str, samples: Vec<SimTime>) -> Result<Self, SimError> {
        if let Some(bad) = samples.iter().find(|d| !d.is_finite() || **d < 0.0) {
            return Err(SimError::InvalidDuration {
                owner: owner.to_string(),
                value: *bad,
            });
        }
        Ok(Self { samples })
    }

    /// Create a pool of `count` copies of the same duration
    pub fn constant(owner: &str, value: SimTime, count: usize) -> Result<Self, SimError> {
        Self::new(owner, vec![value; count])
    }

    /// Remove and return one uniformly chosen duration
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<SimTime> {
        if self.samples.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.samples.len());
        Some(self.samples.swap_remove(index))
    }

    /// Number of durations left
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
