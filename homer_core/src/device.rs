//! Generic device contract.

use crate::error::DeviceError;
use crate::state::DeviceState;
use crate::tick::Tickable;

/// A device in the simulated home.
///
/// Devices are manipulated uniformly through state snapshots. Devices that
/// evolve over virtual time opt into the tick loop by returning themselves
/// from [`Device::as_tickable`]; the scheduler never inspects concrete
/// types.
pub trait Device: Send + Sync {
    /// Human-readable name, used in logs and exports.
    fn name(&self) -> &str;
    
    /// Returns a snapshot of the device state.
    fn state(&self) -> DeviceState;
    
    /// Applies a state to the device.
    ///
    /// Fails with [`DeviceError::InvalidStateType`] if `state` is not the
    /// device's own variant.
    fn set_state(&self, state: DeviceState) -> Result<(), DeviceError>;
    
    /// Returns the tickable capability, if the device has one.
    fn as_tickable(&self) -> Option<&dyn Tickable> {
        None
    }
}
