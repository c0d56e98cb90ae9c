//! Error types for the simulation core.

use crate::state::PositionBounds;
use homer_env::{DeviceId, EnvError};
use thiserror::Error;

/// Errors raised by device models and the device registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// A state-set received a state of another device kind
    #[error("State expected {expected} but got {actual}")]
    InvalidStateType {
        expected: &'static str,
        actual: &'static str,
    },
    
    /// Actuator commanded outside its declared range
    #[error("Position {position} outside bounds {bounds}")]
    OutOfBounds { position: f64, bounds: PositionBounds },
    
    /// Bounds with min > max or non-finite limits
    #[error("Invalid bounds [{min}, {max}]")]
    InvalidBounds { min: f64, max: f64 },
    
    /// Actuator speed must be finite and non-negative
    #[error("Invalid actuator speed: {0}")]
    InvalidSpeed(f64),
    
    /// Outlet power negative, non-finite or above the outlet maximum
    #[error("Invalid power {power} W (max {max} W)")]
    InvalidPower { power: f64, max: f64 },
    
    /// No device registered under this id
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),
}

/// Errors raised while advancing an entity by a tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("Device error during tick: {0}")]
    Device(#[from] DeviceError),
    
    #[error("Tick fault: {0}")]
    Fault(String),
}

impl TickError {
    /// Creates a generic tick fault.
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into())
    }
}

/// Errors raised by the scheduler.
#[derive(Debug, Error)]
pub enum SimError {
    /// The periodic trigger could not be started
    #[error("Environment error: {0}")]
    Env(#[from] EnvError),
    
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
