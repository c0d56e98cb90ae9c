//! Device registry and home controller.

use crate::clock::VirtualClock;
use crate::device::Device;
use crate::error::{DeviceError, TickError};
use crate::state::DeviceState;
use crate::tick::Tickable;
use chrono::NaiveDateTime;
use homer_env::DeviceId;
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Insertion-ordered registry of the devices in a home.
///
/// Iteration order is registration order; removing a device keeps the
/// relative order of the others.
#[derive(Default)]
pub struct DeviceManager {
    devices: RwLock<IndexMap<DeviceId, Arc<dyn Device>>>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }
    
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<DeviceId, Arc<dyn Device>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }
    
    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<DeviceId, Arc<dyn Device>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Registers `device` under `id`, returning the device it replaced.
    pub fn insert(&self, id: DeviceId, device: Arc<dyn Device>) -> Option<Arc<dyn Device>> {
        self.write().insert(id, device)
    }
    
    /// Registers `device` under a fresh id.
    pub fn add(&self, device: Arc<dyn Device>) -> DeviceId {
        let id = DeviceId::new();
        self.insert(id, device);
        id
    }
    
    /// Unregisters a device.
    pub fn remove(&self, id: &DeviceId) -> Option<Arc<dyn Device>> {
        self.write().shift_remove(id)
    }
    
    pub fn get(&self, id: &DeviceId) -> Option<Arc<dyn Device>> {
        self.read().get(id).cloned()
    }
    
    /// Snapshot of all devices in registration order.
    ///
    /// The snapshot is detached from the registry, so devices may be added
    /// or removed while a caller iterates it.
    pub fn devices(&self) -> Vec<(DeviceId, Arc<dyn Device>)> {
        self.read()
            .iter()
            .map(|(id, device)| (*id, Arc::clone(device)))
            .collect()
    }
    
    pub fn ids(&self) -> Vec<DeviceId> {
        self.read().keys().copied().collect()
    }
    
    pub fn len(&self) -> usize {
        self.read().len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.devices().iter().map(|(id, device)| (id.to_string(), device.name().to_string())))
            .finish()
    }
}

/// Domain controller driven by the scheduler.
///
/// The scheduler advances the controller first on every tick, then reads
/// its clock and device collection.
pub trait Controller: Tickable {
    /// The virtual clock of the simulated home.
    fn clock(&self) -> &VirtualClock;
    
    /// The devices of the simulated home.
    fn device_manager(&self) -> &DeviceManager;
}

/// Controller of a simulated home: a virtual clock plus a device registry.
#[derive(Debug, Default)]
pub struct HomeController {
    clock: VirtualClock,
    devices: DeviceManager,
}

impl HomeController {
    /// Creates a controller whose clock starts at `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            clock: VirtualClock::new(start),
            devices: DeviceManager::new(),
        }
    }
    
    /// Creates an Arc-wrapped controller starting at the default epoch.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
    
    /// Reads the state of a registered device.
    pub fn device_state(&self, id: &DeviceId) -> Result<DeviceState, DeviceError> {
        self.devices
            .get(id)
            .map(|device| device.state())
            .ok_or(DeviceError::UnknownDevice(*id))
    }
    
    /// Applies a state to a registered device.
    pub fn set_device_state(&self, id: &DeviceId, state: DeviceState) -> Result<(), DeviceError> {
        let device = self.devices.get(id).ok_or(DeviceError::UnknownDevice(*id))?;
        device.set_state(state)
    }
}

impl Tickable for HomeController {
    fn update_tick(&self, delta: Duration) -> Result<(), TickError> {
        self.clock.advance(delta);
        Ok(())
    }
}

impl Controller for HomeController {
    fn clock(&self) -> &VirtualClock {
        &self.clock
    }
    
    fn device_manager(&self) -> &DeviceManager {
        &self.devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outlet::Outlet;
    use crate::state::OutletState;
    
    fn outlet(name: &str) -> Arc<dyn Device> {
        Arc::new(Outlet::new(name, 10.0, 100.0).unwrap())
    }
    
    #[test]
    fn test_device_manager_keeps_registration_order() {
        let manager = DeviceManager::new();
        let a = manager.add(outlet("a"));
        let b = manager.add(outlet("b"));
        let c = manager.add(outlet("c"));
        
        assert_eq!(manager.ids(), vec![a, b, c]);
        
        manager.remove(&b);
        let names: Vec<String> = manager
            .devices()
            .iter()
            .map(|(_, device)| device.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(manager.ids(), vec![a, c]);
    }
    
    #[test]
    fn test_device_manager_insert_replaces() {
        let manager = DeviceManager::new();
        let id = DeviceId::from_seed(1);
        
        assert!(manager.insert(id, outlet("old")).is_none());
        let replaced = manager.insert(id, outlet("new")).unwrap();
        
        assert_eq!(replaced.name(), "old");
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get(&id).unwrap().name(), "new");
    }
    
    #[test]
    fn test_controller_tick_advances_clock() {
        let controller = HomeController::default();
        controller.update_tick(Duration::from_secs(90)).unwrap();
        
        assert_eq!(controller.clock().elapsed(), Duration::from_secs(90));
        assert_eq!(controller.clock().date_time().to_string(), "2024-01-01 00:01:30");
    }
    
    #[test]
    fn test_controller_device_commands() {
        let controller = HomeController::default();
        let id = controller.device_manager().add(outlet("lamp"));
        
        controller
            .set_device_state(&id, OutletState::new(0.0, 100.0).into())
            .unwrap();
        assert_eq!(
            controller.device_state(&id).unwrap(),
            DeviceState::Outlet(OutletState::new(0.0, 100.0))
        );
        
        let unknown = DeviceId::from_seed(99);
        assert_eq!(
            controller.device_state(&unknown),
            Err(DeviceError::UnknownDevice(unknown))
        );
    }
}
