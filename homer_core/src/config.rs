//! Scheduler configuration.

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing parameters of a [`crate::SimManager`], fixed at construction.
///
/// The real period (how often the trigger fires) and the simulated step
/// (how much virtual time one firing represents at rate 1) are independent:
/// the simulation runs faster than real time by raising the time rate, not
/// by firing more often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimManagerConfig {
    /// Real-world period between trigger firings (default: 10 ms)
    pub real_step_period: Duration,
    
    /// Virtual time per firing at rate 1 (default: 10 ms)
    pub sim_step_period: Duration,
    
    /// Lowest accepted time rate (default: 1)
    pub min_time_rate: u32,
    
    /// Rate in effect at construction (default: 1)
    pub initial_time_rate: u32,
}

impl Default for SimManagerConfig {
    fn default() -> Self {
        Self {
            real_step_period: Duration::from_millis(10),
            sim_step_period: Duration::from_millis(10),
            min_time_rate: 1,
            initial_time_rate: 1,
        }
    }
}

impl SimManagerConfig {
    /// Sets the real trigger period.
    pub fn with_real_step_period(mut self, period: Duration) -> Self {
        self.real_step_period = period;
        self
    }
    
    /// Sets the virtual step size.
    pub fn with_sim_step_period(mut self, period: Duration) -> Self {
        self.sim_step_period = period;
        self
    }
    
    /// Sets the minimum time rate.
    pub fn with_min_time_rate(mut self, rate: u32) -> Self {
        self.min_time_rate = rate;
        self
    }
    
    /// Sets the initial time rate (clamped at construction).
    pub fn with_initial_time_rate(mut self, rate: u32) -> Self {
        self.initial_time_rate = rate;
        self
    }
    
    /// Checks the parameters a scheduler cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.real_step_period.is_zero() {
            return Err(SimError::InvalidConfig("real_step_period must be non-zero".into()));
        }
        if self.sim_step_period.is_zero() {
            return Err(SimError::InvalidConfig("sim_step_period must be non-zero".into()));
        }
        if self.min_time_rate == 0 {
            return Err(SimError::InvalidConfig("min_time_rate must be at least 1".into()));
        }
        Ok(())
    }
    
    /// Clamps a requested rate to the minimum.
    pub fn clamp_rate(&self, rate: u32) -> u32 {
        rate.max(self.min_time_rate).max(1)
    }
    
    /// Virtual delta of one firing at `rate`.
    pub fn step_delta(&self, rate: u32) -> Duration {
        self.sim_step_period.saturating_mul(rate)
    }
}
