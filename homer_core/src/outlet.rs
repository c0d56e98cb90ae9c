//! Switchable power outlets.

use crate::device::Device;
use crate::error::DeviceError;
use crate::state::{DeviceState, OutletState};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A power outlet with a connected load.
///
/// The outlet remembers the load it last delivered, so switching it back on
/// after a cut restores the previous draw.
#[derive(Debug)]
pub struct Outlet {
    name: String,
    max_power: f64,
    supply: Mutex<Supply>,
}

#[derive(Debug, Clone, Copy)]
struct Supply {
    /// Current draw in watts (0 when off)
    power: f64,
    
    /// Draw restored by `switch_on`
    load: f64,
}

impl Outlet {
    /// Creates a switched-on outlet drawing `load` watts.
    pub fn new(name: impl Into<String>, load: f64, max_power: f64) -> Result<Self, DeviceError> {
        if !max_power.is_finite() || max_power < 0.0 {
            return Err(DeviceError::InvalidPower {
                power: load,
                max: max_power,
            });
        }
        check_power(load, max_power)?;
        
        Ok(Self {
            name: name.into(),
            max_power,
            supply: Mutex::new(Supply { power: load, load }),
        })
    }
    
    fn lock(&self) -> MutexGuard<'_, Supply> {
        self.supply.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Current draw in watts.
    pub fn power(&self) -> f64 {
        self.lock().power
    }
    
    pub fn max_power(&self) -> f64 {
        self.max_power
    }
    
    pub fn is_on(&self) -> bool {
        self.power() > 0.0
    }
    
    /// Cuts power to the connected load.
    pub fn switch_off(&self) {
        self.lock().power = 0.0;
    }
    
    /// Restores the last delivered load.
    pub fn switch_on(&self) {
        let mut supply = self.lock();
        supply.power = supply.load;
    }
    
    /// Typed snapshot of the outlet.
    pub fn outlet_state(&self) -> OutletState {
        OutletState::new(self.power(), self.max_power)
    }
}

fn check_power(power: f64, max: f64) -> Result<(), DeviceError> {
    if !power.is_finite() || power < 0.0 || power > max {
        return Err(DeviceError::InvalidPower { power, max });
    }
    Ok(())
}

impl Device for Outlet {
    fn name(&self) -> &str {
        &self.name
    }
    
    fn state(&self) -> DeviceState {
        DeviceState::Outlet(self.outlet_state())
    }
    
    fn set_state(&self, state: DeviceState) -> Result<(), DeviceError> {
        let state = match state {
            DeviceState::Outlet(state) => state,
            other => {
                return Err(DeviceError::InvalidStateType {
                    expected: OutletState::KIND,
                    actual: other.kind(),
                })
            }
        };
        check_power(state.power(), self.max_power)?;
        
        let mut supply = self.lock();
        supply.power = state.power();
        if state.is_on() {
            supply.load = state.power();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActuatedDeviceState, PositionBounds};
    
    #[test]
    fn test_outlet_switching_restores_load() {
        let outlet = Outlet::new("fridge", 150.0, 2000.0).unwrap();
        assert!(outlet.is_on());
        
        outlet.switch_off();
        assert_eq!(outlet.power(), 0.0);
        assert!(!outlet.is_on());
        
        outlet.switch_on();
        assert_eq!(outlet.power(), 150.0);
    }
    
    #[test]
    fn test_outlet_set_state_changes_load() {
        let outlet = Outlet::new("tv", 80.0, 500.0).unwrap();
        
        outlet.set_state(OutletState::new(120.0, 500.0).into()).unwrap();
        assert_eq!(outlet.power(), 120.0);
        
        outlet.set_state(OutletState::new(0.0, 500.0).into()).unwrap();
        outlet.switch_on();
        assert_eq!(outlet.power(), 120.0);
    }
    
    #[test]
    fn test_outlet_rejects_overload() {
        let outlet = Outlet::new("tv", 80.0, 500.0).unwrap();
        let err = outlet
            .set_state(OutletState::new(900.0, 500.0).into())
            .unwrap_err();
        
        assert_eq!(err, DeviceError::InvalidPower { power: 900.0, max: 500.0 });
        assert_eq!(outlet.power(), 80.0);
    }
    
    #[test]
    fn test_outlet_rejects_actuated_state() {
        let outlet = Outlet::new("tv", 80.0, 500.0).unwrap();
        let state = ActuatedDeviceState::new(0.5, PositionBounds::unit());
        
        assert!(matches!(
            outlet.set_state(state.into()),
            Err(DeviceError::InvalidStateType { expected: "outlet", actual: "actuated" })
        ));
    }
    
    #[test]
    fn test_outlet_is_not_tickable() {
        let outlet = Outlet::new("lamp", 10.0, 60.0).unwrap();
        assert!(outlet.as_tickable().is_none());
    }
}
