//! Manually driven trigger for deterministic tests and scripted runs.

use crate::error::EnvError;
use crate::trigger::{PeriodicTrigger, TickTask, TriggerHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Trigger that fires only when [`ManualTrigger::fire`] is called.
///
/// Real time plays no part: the configured period is recorded but never
/// waited on. Unlike [`crate::TokioTrigger`], starting a loop does not fire
/// it; the first firing is the first explicit `fire()`.
///
/// Clones share state, so a test can keep one clone and hand another to
/// the code under test.
#[derive(Clone, Default)]
pub struct ManualTrigger {
    state: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    /// Live loop, tagged with the generation that started it
    active: Option<(u64, TickTask)>,
    
    /// Period requested by the most recent start
    period: Option<Duration>,
    
    /// Number of loops ever started
    starts: u64,
    
    /// Number of firings delivered
    fired: u64,
}

impl ManualTrigger {
    /// Creates an idle trigger.
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Creates an Arc-wrapped trigger for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
    
    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Fires the live loop once.
    ///
    /// Returns false if no loop is live. The task runs without the
    /// trigger's lock held, so it may freely start or cancel loops.
    pub fn fire(&self) -> bool {
        let task = {
            let mut state = self.lock();
            match &state.active {
                Some((_, task)) => {
                    let task = Arc::clone(task);
                    state.fired += 1;
                    task
                }
                None => return false,
            }
        };
        (task)();
        true
    }
    
    /// Fires the live loop up to `n` times, returning how many firings ran.
    pub fn fire_n(&self, n: u64) -> u64 {
        let mut count = 0;
        for _ in 0..n {
            if !self.fire() {
                break;
            }
            count += 1;
        }
        count
    }
    
    /// Returns true while a started loop has not been cancelled.
    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }
    
    /// Number of loops ever started on this trigger.
    pub fn start_count(&self) -> u64 {
        self.lock().starts
    }
    
    /// Number of firings delivered so far.
    pub fn fire_count(&self) -> u64 {
        self.lock().fired
    }
    
    /// Period requested by the most recent start.
    pub fn period(&self) -> Option<Duration> {
        self.lock().period
    }
}

impl PeriodicTrigger for ManualTrigger {
    fn start(
        &self,
        name: &str,
        period: Duration,
        task: TickTask,
    ) -> Result<Box<dyn TriggerHandle>, EnvError> {
        if period.is_zero() {
            return Err(EnvError::InvalidPeriod(period));
        }
        
        let mut state = self.lock();
        state.starts += 1;
        let generation = state.starts;
        state.active = Some((generation, task));
        state.period = Some(period);
        tracing::trace!(loop_name = name, generation, "manual loop started");
        
        Ok(Box::new(ManualLoopHandle {
            state: Arc::clone(&self.state),
            generation,
        }))
    }
}

/// Handle to a loop started on a [`ManualTrigger`].
struct ManualLoopHandle {
    state: Arc<Mutex<ManualState>>,
    generation: u64,
}

impl ManualLoopHandle {
    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // A newer start replaced this loop; leave it alone
        if matches!(&state.active, Some((generation, _)) if *generation == self.generation) {
            state.active = None;
        }
    }
}

impl TriggerHandle for ManualLoopHandle {
    fn cancel(self: Box<Self>) {
        self.release();
    }
    
    fn is_active(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(&state.active, Some((generation, _)) if *generation == self.generation)
    }
}

impl Drop for ManualLoopHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    
    fn counting_task() -> (Arc<AtomicU64>, TickTask) {
        let fired = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&fired);
        let task: TickTask = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (fired, task)
    }
    
    #[test]
    fn test_manual_trigger_fires_only_on_demand() {
        let trigger = ManualTrigger::new();
        let (fired, task) = counting_task();
        
        let handle = trigger.start("test", Duration::from_millis(10), task).unwrap();
        assert!(handle.is_active());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        
        assert_eq!(trigger.fire_n(5), 5);
        assert_eq!(fired.load(Ordering::SeqCst), 5);
        assert_eq!(trigger.fire_count(), 5);
        assert_eq!(trigger.period(), Some(Duration::from_millis(10)));
    }
    
    #[test]
    fn test_manual_trigger_cancel_stops_firing() {
        let trigger = ManualTrigger::new();
        let (fired, task) = counting_task();
        
        let handle = trigger.start("test", Duration::from_millis(10), task).unwrap();
        trigger.fire();
        handle.cancel();
        
        assert!(!trigger.is_active());
        assert!(!trigger.fire());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
    
    #[test]
    fn test_manual_trigger_stale_handle_does_not_cancel_newer_loop() {
        let trigger = ManualTrigger::new();
        let (_, first) = counting_task();
        let (fired, second) = counting_task();
        
        let old = trigger.start("test", Duration::from_millis(10), first).unwrap();
        let new = trigger.start("test", Duration::from_millis(10), second).unwrap();
        assert!(!old.is_active());
        
        old.cancel();
        assert!(new.is_active());
        assert!(trigger.fire());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(trigger.start_count(), 2);
    }
    
    #[test]
    fn test_manual_trigger_clone_shares_state() {
        let trigger = ManualTrigger::new();
        let other = trigger.clone();
        let (fired, task) = counting_task();
        
        let _handle = other.start("test", Duration::from_millis(10), task).unwrap();
        assert!(trigger.fire());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
