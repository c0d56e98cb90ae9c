//! HOMER Core - Smart-Home Simulation Engine
//!
//! A population of stateful devices evolves over simulated time, driven by a
//! periodic real-time loop:
//! 1. **Scheduling**: [`SimManager`] turns each real trigger firing into a
//!    virtual time delta (`sim_step_period * time_rate`) and applies it to
//!    the controller, the electrical meter, every tickable device and every
//!    registered observer, in that order
//! 2. **Devices**: actuated devices, outlets and the electrical meter share
//!    the [`Tickable`] and [`Device`] contracts
//! 3. **Presentation**: a [`SimManagerView`] receives the clock and the time
//!    rate; it drives the simulation only through the scheduler's commands

pub mod actuated;
pub mod actuator;
pub mod clock;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod meter;
pub mod outlet;
pub mod sim_manager;
pub mod state;
pub mod tick;
pub mod view;

// Re-export key types for convenience
pub use actuated::ActuatedDevice;
pub use actuator::{Actuator, LinearActuator};
pub use clock::VirtualClock;
pub use config::SimManagerConfig;
pub use controller::{Controller, DeviceManager, HomeController};
pub use device::Device;
pub use error::{DeviceError, SimError, TickError};
pub use meter::{ElectricalMeter, HomeElectricalMeter};
pub use outlet::Outlet;
pub use sim_manager::SimManager;
pub use state::{ActuatedDeviceState, DeviceState, OutletState, PositionBounds};
pub use tick::Tickable;
pub use view::SimManagerView;

pub use homer_env::DeviceId;
