//! Simulation scheduler - drives virtual time from a real-time trigger.
//!
//! # Tick Pipeline
//!
//! ```text
//!  trigger fires
//!       │
//!       ▼
//!  delta = sim_step_period * time_rate
//!       │
//!       ├──► 1. controller.update_tick(delta)      (advances the clock)
//!       ├──► 2. meter.update_tick(delta)
//!       ├──► 3. tickable devices, registry order
//!       ├──► 4. view.set_date_time(clock)
//!       └──► 5. observers
//! ```
//!
//! Every step runs sequentially inside a single firing. Firings hold a
//! guard for their whole duration, so two firings never overlap, even when
//! a pause/resume starts a new loop while the previous one is mid-tick.
//! Effects within a tick are therefore ordered deterministically.
//!
//! # Faults
//!
//! An entity whose update fails (returns an error or panics) is logged and
//! skipped; the remaining entities of that tick still run and the loop keeps
//! going. [`SimManager::fault_count`] exposes how many updates were skipped.
//!
//! # Usage
//!
//! ```ignore
//! use homer_core::{SimManager, SimManagerConfig, HomeController};
//!
//! let manager = SimManager::with_tokio(SimManagerConfig::default(), view, controller, meter)?;
//! manager.set_time_rate(60); // one virtual minute per real second
//! manager.pause();
//! manager.resume()?;
//! ```

use crate::config::SimManagerConfig;
use crate::controller::Controller;
use crate::error::{SimError, TickError};
use crate::meter::ElectricalMeter;
use crate::tick::Tickable;
use crate::view::SimManagerView;

use homer_env::{DeviceId, PeriodicTrigger, TickTask, TokioTrigger, TriggerHandle};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

const LOOP_NAME: &str = "homer-sim-loop";

/// Running state of the scheduler.
///
/// The trigger handle only exists while running, so "handle present"
/// and "running" cannot disagree.
enum LoopState {
    Paused,
    Running(Box<dyn TriggerHandle>),
}

/// The simulation scheduler.
///
/// `resume`, `pause`, `set_time_rate` and `add_observer` may be called from
/// any thread, including from inside a tick. Control calls are serialized:
/// once one returns, [`SimManager::is_running`] reflects its effect.
///
/// Dropping the manager pauses it.
pub struct SimManager {
    /// State shared with the tick task
    shared: Arc<TickShared>,

    /// Source of real-time firings
    trigger: Arc<dyn PeriodicTrigger>,

    /// Loop state; also serializes control calls
    control: Mutex<LoopState>,
}

/// Everything a firing needs, shared between the manager and its loop.
struct TickShared {
    config: SimManagerConfig,
    view: Arc<dyn SimManagerView>,
    controller: Arc<dyn Controller>,
    meter: Arc<dyn ElectricalMeter>,

    /// Non-owning observer set, unique by allocation
    observers: RwLock<Vec<Weak<dyn Tickable>>>,

    time_rate: AtomicU32,
    ticks: AtomicU64,
    faults: AtomicU64,

    /// Held for the duration of a firing, across loop generations
    firing: Mutex<()>,
}

/// Which entity a tick step is updating, for fault reports.
enum TickStage<'a> {
    Controller,
    Meter,
    Device(DeviceId, &'a str),
    View,
    Observer(usize),
}

impl std::fmt::Display for TickStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickStage::Controller => write!(f, "controller"),
            TickStage::Meter => write!(f, "electrical meter"),
            TickStage::Device(id, name) => write!(f, "device {} ({})", id, name),
            TickStage::View => write!(f, "view"),
            TickStage::Observer(index) => write!(f, "observer #{}", index),
        }
    }
}

impl SimManager {
    /// Creates a scheduler and starts running it.
    ///
    /// The initial (clamped) time rate is pushed to the view before the
    /// loop starts.
    pub fn new(
        config: SimManagerConfig,
        trigger: Arc<dyn PeriodicTrigger>,
        view: Arc<dyn SimManagerView>,
        controller: Arc<dyn Controller>,
        meter: Arc<dyn ElectricalMeter>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let rate = config.clamp_rate(config.initial_time_rate);

        let shared = Arc::new(TickShared {
            config,
            view,
            controller,
            meter,
            observers: RwLock::new(Vec::new()),
            time_rate: AtomicU32::new(rate),
            ticks: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            firing: Mutex::new(()),
        });
        shared.view.set_time_rate(rate);

        let manager = Self {
            shared,
            trigger,
            control: Mutex::new(LoopState::Paused),
        };
        manager.resume()?;

        info!(
            real_step = ?manager.shared.config.real_step_period,
            sim_step = ?manager.shared.config.sim_step_period,
            rate,
            "simulation manager started"
        );
        Ok(manager)
    }

    /// Creates a scheduler driven by the tokio runtime of the caller.
    pub fn with_tokio(
        config: SimManagerConfig,
        view: Arc<dyn SimManagerView>,
        controller: Arc<dyn Controller>,
        meter: Arc<dyn ElectricalMeter>,
    ) -> Result<Self, SimError> {
        let trigger: Arc<dyn PeriodicTrigger> = TokioTrigger::shared()?;
        Self::new(config, trigger, view, controller, meter)
    }

    fn lock_control(&self) -> MutexGuard<'_, LoopState> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the periodic loop. No-op if already running.
    pub fn resume(&self) -> Result<(), SimError> {
        let mut state = self.lock_control();
        if let LoopState::Running(_) = *state {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let task: TickTask = Arc::new(move || shared.run_tick());
        let handle = self
            .trigger
            .start(LOOP_NAME, self.shared.config.real_step_period, task)?;

        *state = LoopState::Running(handle);
        debug!(clock = %self.shared.controller.clock().date_time(), "simulation resumed");
        Ok(())
    }

    /// Stops the periodic loop. No-op if already paused.
    ///
    /// Returns without waiting for a firing in progress; that firing
    /// completes, and no further firing starts.
    pub fn pause(&self) {
        let mut state = self.lock_control();
        if let LoopState::Running(handle) = std::mem::replace(&mut *state, LoopState::Paused) {
            handle.cancel();
            debug!(clock = %self.shared.controller.clock().date_time(), "simulation paused");
        }
    }

    /// Sets the time rate, clamped to the configured minimum.
    ///
    /// The effective rate is pushed to the view immediately and used from
    /// the next firing on.
    pub fn set_time_rate(&self, rate: u32) {
        // Held so that concurrent callers push to the view in store order
        let _state = self.lock_control();
        let rate = self.shared.config.clamp_rate(rate);
        self.shared.time_rate.store(rate, Ordering::SeqCst);
        self.shared.view.set_time_rate(rate);
        debug!(rate, "time rate set");
    }

    /// Registers an observer for per-tick updates.
    ///
    /// Only a weak reference is kept: the observer is dropped from the set
    /// once its owner releases it. Returns false if the same observer is
    /// already registered.
    pub fn add_observer(&self, observer: Arc<dyn Tickable>) -> bool {
        let candidate = Arc::downgrade(&observer);
        let mut observers = self.shared.write_observers();
        observers.retain(|weak| weak.strong_count() > 0);

        if observers.iter().any(|weak| same_allocation(weak.as_ptr(), candidate.as_ptr())) {
            return false;
        }
        observers.push(candidate);
        true
    }

    /// Unregisters an observer. Returns false if it was not registered.
    ///
    /// A tick already iterating the observers may still update it once.
    pub fn remove_observer<T: Tickable + ?Sized>(&self, observer: &Arc<T>) -> bool {
        let target = Arc::as_ptr(observer);
        let mut observers = self.shared.write_observers();
        let registered = observers
            .iter()
            .any(|weak| same_allocation(weak.as_ptr(), target));
        observers.retain(|weak| weak.strong_count() > 0 && !same_allocation(weak.as_ptr(), target));
        registered
    }

    /// Returns true while the periodic loop is live.
    pub fn is_running(&self) -> bool {
        matches!(*self.lock_control(), LoopState::Running(_))
    }

    /// Current (clamped) time rate.
    pub fn time_rate(&self) -> u32 {
        self.shared.time_rate.load(Ordering::SeqCst)
    }

    /// Virtual delta the next firing will apply.
    pub fn next_delta(&self) -> Duration {
        self.shared.config.step_delta(self.time_rate())
    }

    /// Number of firings executed so far.
    pub fn tick_count(&self) -> u64 {
        self.shared.ticks.load(Ordering::SeqCst)
    }

    /// Number of entity updates skipped because they failed.
    pub fn fault_count(&self) -> u64 {
        self.shared.faults.load(Ordering::SeqCst)
    }

    /// Number of live registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared
            .read_observers()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn config(&self) -> &SimManagerConfig {
        &self.shared.config
    }

    pub fn controller(&self) -> &Arc<dyn Controller> {
        &self.shared.controller
    }

    pub fn meter(&self) -> &Arc<dyn ElectricalMeter> {
        &self.shared.meter
    }
}

impl Drop for SimManager {
    fn drop(&mut self) {
        self.pause();
    }
}

impl TickShared {
    fn read_observers(&self) -> std::sync::RwLockReadGuard<'_, Vec<Weak<dyn Tickable>>> {
        self.observers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_observers(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Weak<dyn Tickable>>> {
        self.observers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// One firing of the loop.
    fn run_tick(&self) {
        // A loop started by resume() waits here for a firing of the
        // previous loop that pause() did not wait for
        let _firing = self.firing.lock().unwrap_or_else(PoisonError::into_inner);

        let rate = self.time_rate.load(Ordering::SeqCst);
        let delta = self.config.step_delta(rate);
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        self.isolate(TickStage::Controller, || self.controller.update_tick(delta));
        self.isolate(TickStage::Meter, || self.meter.update_tick(delta));

        for (id, device) in self.controller.device_manager().devices() {
            if let Some(tickable) = device.as_tickable() {
                self.isolate(TickStage::Device(id, device.name()), || tickable.update_tick(delta));
            }
        }

        self.isolate(TickStage::View, || {
            self.view.set_date_time(self.controller.clock().date_time());
            Ok(())
        });

        // Snapshot, so observers can be added or removed mid-iteration
        let observers: Vec<Arc<dyn Tickable>> =
            self.read_observers().iter().filter_map(Weak::upgrade).collect();
        for (index, observer) in observers.iter().enumerate() {
            self.isolate(TickStage::Observer(index), || observer.update_tick(delta));
        }

        trace!(tick, rate, ?delta, "tick complete");
    }

    /// Runs one entity update, logging and counting it if it fails.
    fn isolate<F>(&self, stage: TickStage<'_>, update: F)
    where
        F: FnOnce() -> Result<(), TickError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(update)) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                self.faults.fetch_add(1, Ordering::SeqCst);
                warn!(entity = %stage, %error, "tick update failed, skipping");
            }
            Err(payload) => {
                self.faults.fetch_add(1, Ordering::SeqCst);
                warn!(entity = %stage, panic = panic_message(&*payload), "tick update panicked, skipping");
            }
        }
    }
}

/// Compares the data addresses of two possibly-unsized pointers.
fn same_allocation<T: ?Sized, U: ?Sized>(a: *const T, b: *const U) -> bool {
    a as *const () == b as *const ()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
