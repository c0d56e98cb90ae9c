//! DemoHome - the simulated house used by scenarios and the CLI.

use homer_core::{
    ActuatedDevice, Controller, Device, DeviceError, DeviceId, ElectricalMeter, HomeController,
    HomeElectricalMeter, LinearActuator, Outlet, PositionBounds,
};
use std::sync::Arc;

/// Blinds travel 0-100 % at 5 %/s
const BLINDS_SPEED: f64 = 5.0;

/// Garage door travels 0-1 (closed-open) in 20 s
const GARAGE_SPEED: f64 = 0.05;

/// A small house: two actuated devices and three metered outlets.
///
/// Every device is registered in the controller's device manager under a
/// seeded id, in a fixed order, so runs are reproducible.
pub struct DemoHome {
    pub controller: Arc<HomeController>,
    pub meter: Arc<HomeElectricalMeter>,
    pub blinds: Arc<ActuatedDevice<LinearActuator>>,
    pub garage_door: Arc<ActuatedDevice<LinearActuator>>,
    pub fridge: Arc<Outlet>,
    pub tv: Arc<Outlet>,
    pub washer: Arc<Outlet>,
}

impl DemoHome {
    /// Builds the house with every actuator closed and every outlet on.
    pub fn build() -> Result<Self, DeviceError> {
        let controller = HomeController::shared();
        
        let blinds = Arc::new(ActuatedDevice::new(
            "blinds",
            LinearActuator::new(PositionBounds::new(0.0, 100.0)?, BLINDS_SPEED, 0.0)?,
        ));
        let garage_door = Arc::new(ActuatedDevice::new(
            "garage_door",
            LinearActuator::new(PositionBounds::unit(), GARAGE_SPEED, 0.0)?,
        ));
        
        let fridge = Arc::new(Outlet::new("fridge", 150.0, 1000.0)?);
        let tv = Arc::new(Outlet::new("tv", 100.0, 500.0)?);
        let washer = Arc::new(Outlet::new("washer", 2000.0, 3500.0)?);
        
        let devices: [Arc<dyn Device>; 5] = [
            blinds.clone(),
            garage_door.clone(),
            fridge.clone(),
            tv.clone(),
            washer.clone(),
        ];
        for (seed, device) in devices.into_iter().enumerate() {
            controller.device_manager().insert(DeviceId::from_seed(seed as u64), device);
        }
        
        let meter = Arc::new(HomeElectricalMeter::new(vec![
            fridge.clone(),
            tv.clone(),
            washer.clone(),
        ]));
        
        Ok(Self {
            controller,
            meter,
            blinds,
            garage_door,
            fridge,
            tv,
            washer,
        })
    }
    
    /// Commands blinds and garage door fully open.
    pub fn open_everything(&self) -> Result<(), DeviceError> {
        for device in [&self.blinds, &self.garage_door] {
            let state = device.actuated_state();
            device.set_state(state.with_position(state.bounds().max()).into())?;
        }
        Ok(())
    }
    
    /// Instantaneous draw of the house, in watts.
    pub fn consumption(&self) -> f64 {
        self.meter.global_consumption()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homer_core::Actuator;
    
    #[test]
    fn test_demo_home_registers_devices_in_order() {
        let home = DemoHome::build().unwrap();
        let names: Vec<String> = home
            .controller
            .device_manager()
            .devices()
            .iter()
            .map(|(_, device)| device.name().to_string())
            .collect();
        
        assert_eq!(names, vec!["blinds", "garage_door", "fridge", "tv", "washer"]);
        assert_eq!(home.controller.device_manager().ids()[0], DeviceId::from_seed(0));
    }
    
    #[test]
    fn test_demo_home_initial_consumption() {
        let home = DemoHome::build().unwrap();
        assert_eq!(home.consumption(), 2250.0);
    }
    
    #[test]
    fn test_open_everything_sets_targets() {
        let home = DemoHome::build().unwrap();
        home.open_everything().unwrap();
        
        assert_eq!(home.blinds.actuator().target(), 100.0);
        assert_eq!(home.garage_door.actuator().target(), 1.0);
        assert_eq!(home.blinds.actuator().position(), 0.0);
    }
}
