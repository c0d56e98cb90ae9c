//! Actuated-device adapter.
//!
//! Wraps a single [`Actuator`] behind the generic [`Device`] contract so
//! that heterogeneous devices can be driven by the tick loop and by state
//! get/set alike. The adapter holds no state of its own: reads come from the
//! actuator, writes become actuator commands, ticks are delegated.

use crate::actuator::Actuator;
use crate::device::Device;
use crate::error::{DeviceError, TickError};
use crate::state::{ActuatedDeviceState, DeviceState};
use crate::tick::Tickable;
use std::time::Duration;

/// A device whose observable state is the position of an actuator.
#[derive(Debug)]
pub struct ActuatedDevice<A> {
    name: String,
    actuator: A,
}

impl<A: Actuator> ActuatedDevice<A> {
    /// Creates a device controlled by `actuator`.
    pub fn new(name: impl Into<String>, actuator: A) -> Self {
        Self {
            name: name.into(),
            actuator,
        }
    }
    
    /// Returns the underlying actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
    
    /// Typed snapshot of `(position, bounds)`.
    pub fn actuated_state(&self) -> ActuatedDeviceState {
        ActuatedDeviceState::new(self.actuator.position(), self.actuator.bounds())
    }
}

impl<A: Actuator> Device for ActuatedDevice<A> {
    fn name(&self) -> &str {
        &self.name
    }
    
    fn state(&self) -> DeviceState {
        DeviceState::Actuated(self.actuated_state())
    }
    
    fn set_state(&self, state: DeviceState) -> Result<(), DeviceError> {
        match state {
            DeviceState::Actuated(state) => self.actuator.command(state.position()),
            other => Err(DeviceError::InvalidStateType {
                expected: ActuatedDeviceState::KIND,
                actual: other.kind(),
            }),
        }
    }
    
    fn as_tickable(&self) -> Option<&dyn Tickable> {
        Some(self)
    }
}

impl<A: Actuator> Tickable for ActuatedDevice<A> {
    fn update_tick(&self, delta: Duration) -> Result<(), TickError> {
        self.actuator.update_tick(delta)
    }
}
