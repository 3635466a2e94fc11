//! Configuration for one assembly line run
//!
//! This module provides the configuration types that control a single
//! simulation run: the time horizon, the warm-up deletion point, the buffer
//! capacity, the random stream and the inspectors' routing policy.

use serde::{Deserialize, Serialize};

use super::errors::SimError;
use super::types::SimTime;

/// Capacity of every component buffer in the reference line
pub const DEFAULT_BUFFER_CAPACITY: u32 = 2;

/// Enumeration of the supported inspector routing policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingPolicy {
    /// Send to the least-filled eligible buffer, ties broken by candidate order
    LeastLoaded,
    /// Rotate through the eligible candidates, skipping full buffers when possible
    Alternate,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        RoutingPolicy::LeastLoaded
    }
}

/// Configuration for a simulation run
///
/// Times are in simulated minutes. Statistics only accumulate once the
/// clock has reached `deletion_point`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated time at which the run stops
    pub horizon: SimTime,
    /// Warm-up period excluded from the statistics
    pub deletion_point: SimTime,
    /// Capacity of every workstation buffer
    pub buffer_capacity: u32,
    /// Seed of the run's random stream (component choice and pool sampling)
    pub seed: u64,
    /// How inspectors pick a destination workstation
    pub routing_policy: RoutingPolicy,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration runs 3300 minutes with a 300 minute warm-up
    pub fn new() -> Self {
        Self {
            horizon: 3300.0,
            deletion_point: 300.0,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            seed: 0,
            routing_policy: RoutingPolicy::default(),
        }
    }

    /// Set the run horizon
    ///
    /// # Arguments
    /// * `horizon` - Simulated time at which the run stops
    pub fn with_horizon(mut self, horizon: SimTime) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the warm-up deletion point
    ///
    /// # Arguments
    /// * `deletion_point` - Time before which statistics are discarded
    pub fn with_deletion_point(mut self, deletion_point: SimTime) -> Self {
        self.deletion_point = deletion_point;
        self
    }

    /// Set the capacity used for every buffer
    pub fn with_buffer_capacity(mut self, capacity: u32) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the seed of the run's random stream
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the routing policy used by every inspector
    pub fn with_routing_policy(mut self, policy: RoutingPolicy) -> Self {
        self.routing_policy = policy;
        self
    }

    /// Length of the measured window, `horizon - deletion_point`
    pub fn measured_window(&self) -> SimTime {
        (self.horizon - self.deletion_point).max(0.0)
    }

    /// Check that the times are usable
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.horizon.is_finite() || self.horizon < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "horizon must be a non-negative finite time, got {}",
                self.horizon
            )));
        }
        if !self.deletion_point.is_finite() || self.deletion_point < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "deletion point must be a non-negative finite time, got {}",
                self.deletion_point
            )));
        }
        if self.deletion_point > self.horizon {
            return Err(SimError::InvalidConfig(format!(
                "deletion point {} lies beyond the horizon {}",
                self.deletion_point, self.horizon
            )));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
