//! Positional actuators.
//!
//! An actuator owns a position inside fixed bounds. Commands set a target;
//! the position then travels toward it as virtual time passes.

use crate::error::{DeviceError, TickError};
use crate::state::PositionBounds;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A positional actuator driven by commands and virtual time.
pub trait Actuator: Send + Sync {
    /// Current position.
    fn position(&self) -> f64;
    
    /// Valid position range.
    fn bounds(&self) -> PositionBounds;
    
    /// Commands the actuator toward `target`.
    ///
    /// What happens for a target outside [`Actuator::bounds`] is up to the
    /// implementation.
    fn command(&self, target: f64) -> Result<(), DeviceError>;
    
    /// Advances the actuator's motion by `delta` of virtual time.
    fn update_tick(&self, delta: Duration) -> Result<(), TickError>;
}

/// Actuator moving at constant speed toward its target.
///
/// Out-of-bounds commands are rejected with [`DeviceError::OutOfBounds`]
/// and leave the current target untouched.
#[derive(Debug)]
pub struct LinearActuator {
    bounds: PositionBounds,
    
    /// Travel speed in position units per virtual second
    speed: f64,
    
    motion: Mutex<Motion>,
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    position: f64,
    target: f64,
}

impl LinearActuator {
    /// Creates an actuator at rest at `initial`.
    pub fn new(bounds: PositionBounds, speed: f64, initial: f64) -> Result<Self, DeviceError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(DeviceError::InvalidSpeed(speed));
        }
        if !bounds.contains(initial) {
            return Err(DeviceError::OutOfBounds {
                position: initial,
                bounds,
            });
        }
        
        Ok(Self {
            bounds,
            speed,
            motion: Mutex::new(Motion {
                position: initial,
                target: initial,
            }),
        })
    }
    
    fn lock(&self) -> MutexGuard<'_, Motion> {
        self.motion.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Position the actuator is travelling to.
    pub fn target(&self) -> f64 {
        self.lock().target
    }
    
    /// Returns true while the position has not reached the target.
    pub fn is_moving(&self) -> bool {
        let motion = self.lock();
        motion.position != motion.target
    }
    
    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl Actuator for LinearActuator {
    fn position(&self) -> f64 {
        self.lock().position
    }
    
    fn bounds(&self) -> PositionBounds {
        self.bounds
    }
    
    fn command(&self, target: f64) -> Result<(), DeviceError> {
        if !self.bounds.contains(target) {
            return Err(DeviceError::OutOfBounds {
                position: target,
                bounds: self.bounds,
            });
        }
        self.lock().target = target;
        Ok(())
    }
    
    fn update_tick(&self, delta: Duration) -> Result<(), TickError> {
        let mut motion = self.lock();
        let remaining = motion.target - motion.position;
        let step = self.speed * delta.as_secs_f64();
        
        // Land exactly on the target instead of overshooting it
        if remaining.abs() <= step {
            motion.position = motion.target;
        } else {
            motion.position += step.copysign(remaining);
        }
        Ok(())
    }
}
