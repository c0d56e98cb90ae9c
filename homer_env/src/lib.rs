//! HOMER Environment Abstraction Layer
//!
//! This crate provides the seam between the simulation core and the
//! "real world" it runs in. The only environmental input the scheduler
//! needs is a **periodic real-time trigger**: something that calls a task
//! at a fixed real period until it is cancelled.
//!
//! # Implementations
//!
//! - **Production**: [`TokioTrigger`] - a single tokio task driving a
//!   fixed-rate `tokio::time::interval`
//! - **Simulation**: [`ManualTrigger`] - fires only when told to, so tests
//!   and scripted scenarios advance the loop one firing at a time
//!
//! # Example
//!
//! ```ignore
//! use homer_env::{PeriodicTrigger, TokioTrigger};
//! use std::{sync::Arc, time::Duration};
//!
//! let trigger = TokioTrigger::current()?;
//! let handle = trigger.start("sim-loop", Duration::from_millis(10), Arc::new(|| tick()))?;
//! // ...
//! handle.cancel();
//! ```

mod error;
mod manual;
mod tokio_impl;
mod trigger;
mod types;

pub use error::EnvError;
pub use manual::ManualTrigger;
pub use tokio_impl::TokioTrigger;
pub use trigger::{PeriodicTrigger, TickTask, TriggerHandle};
pub use types::DeviceId;
