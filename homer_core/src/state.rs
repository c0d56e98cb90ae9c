//! Device state snapshots.
//!
//! States are immutable values: reading a device produces one, and setting a
//! device consumes one. [`DeviceState`] is the polymorphic envelope passed
//! through the generic device contract; each device accepts only its own
//! variant.

use crate::error::DeviceError;
use serde::{Deserialize, Serialize};

/// Inclusive range of valid actuator positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionBounds {
    min: f64,
    max: f64,
}

impl PositionBounds {
    /// Creates bounds, rejecting non-finite limits and `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, DeviceError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(DeviceError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }
    
    /// The `[0, 1]` range used for fractional openings.
    pub fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
    
    pub fn min(&self) -> f64 {
        self.min
    }
    
    pub fn max(&self) -> f64 {
        self.max
    }
    
    /// Returns true if `position` lies within the bounds.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.min && position <= self.max
    }
    
    /// Clamps `position` into the bounds.
    pub fn clamp(&self, position: f64) -> f64 {
        position.clamp(self.min, self.max)
    }
}

impl std::fmt::Display for PositionBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Snapshot of an actuated device: current position and valid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatedDeviceState {
    position: f64,
    bounds: PositionBounds,
}

impl ActuatedDeviceState {
    pub fn new(position: f64, bounds: PositionBounds) -> Self {
        Self { position, bounds }
    }
    
    pub fn position(&self) -> f64 {
        self.position
    }
    
    pub fn bounds(&self) -> PositionBounds {
        self.bounds
    }
    
    /// Returns a copy of this state asking for another position.
    pub fn with_position(&self, position: f64) -> Self {
        Self {
            position,
            bounds: self.bounds,
        }
    }
}

/// Snapshot of a power outlet. Zero power means switched off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutletState {
    /// Current draw in watts
    power: f64,
    
    /// Maximum draw the outlet accepts, in watts
    max_power: f64,
}

impl OutletState {
    pub fn new(power: f64, max_power: f64) -> Self {
        Self { power, max_power }
    }
    
    pub fn power(&self) -> f64 {
        self.power
    }
    
    pub fn max_power(&self) -> f64 {
        self.max_power
    }
    
    pub fn is_on(&self) -> bool {
        self.power > 0.0
    }
}

/// State of any device, tagged by device kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceState {
    Actuated(ActuatedDeviceState),
    Outlet(OutletState),
}

impl DeviceState {
    /// Returns the variant name, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceState::Actuated(_) => ActuatedDeviceState::KIND,
            DeviceState::Outlet(_) => OutletState::KIND,
        }
    }
    
    pub fn as_actuated(&self) -> Option<&ActuatedDeviceState> {
        match self {
            DeviceState::Actuated(state) => Some(state),
            _ => None,
        }
    }
    
    pub fn as_outlet(&self) -> Option<&OutletState> {
        match self {
            DeviceState::Outlet(state) => Some(state),
            _ => None,
        }
    }
}

impl ActuatedDeviceState {
    pub const KIND: &'static str = "actuated";
}

impl OutletState {
    pub const KIND: &'static str = "outlet";
}

impl From<ActuatedDeviceState> for DeviceState {
    fn from(state: ActuatedDeviceState) -> Self {
        DeviceState::Actuated(state)
    }
}

impl From<OutletState> for DeviceState {
    fn from(state: OutletState) -> Self {
        DeviceState::Outlet(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_bounds_reject_inverted_range() {
        assert!(PositionBounds::new(0.0, 1.0).is_ok());
        assert!(PositionBounds::new(1.0, 1.0).is_ok());
        assert_eq!(
            PositionBounds::new(2.0, 1.0),
            Err(DeviceError::InvalidBounds { min: 2.0, max: 1.0 })
        );
        assert!(PositionBounds::new(f64::NAN, 1.0).is_err());
    }
    
    #[test]
    fn test_bounds_contains_and_clamp() {
        let bounds = PositionBounds::new(-1.0, 1.0).unwrap();
        assert!(bounds.contains(-1.0));
        assert!(bounds.contains(1.0));
        assert!(!bounds.contains(1.5));
        assert_eq!(bounds.clamp(3.0), 1.0);
        assert_eq!(bounds.clamp(-3.0), -1.0);
    }
    
    #[test]
    fn test_device_state_kind() {
        let actuated = DeviceState::from(ActuatedDeviceState::new(0.5, PositionBounds::unit()));
        let outlet = DeviceState::from(OutletState::new(100.0, 2000.0));
        
        assert_eq!(actuated.kind(), "actuated");
        assert_eq!(outlet.kind(), "outlet");
        assert!(actuated.as_actuated().is_some());
        assert!(actuated.as_outlet().is_none());
    }
}
