//! Production implementation of PeriodicTrigger using Tokio.

use crate::error::EnvError;
use crate::trigger::{PeriodicTrigger, TickTask, TriggerHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Production trigger backed by a tokio runtime.
///
/// Each started loop is one spawned task owning a `tokio::time::interval`.
/// The interval's first tick completes immediately, so the task fires as
/// soon as it is scheduled and then once per period. Missed ticks burst
/// (fixed-rate catch-up) instead of being skipped.
pub struct TokioTrigger {
    /// Runtime the loops are spawned on
    runtime: Handle,
}

impl TokioTrigger {
    /// Creates a trigger spawning onto the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
    
    /// Creates a trigger on the runtime the caller is running in.
    pub fn current() -> Result<Self, EnvError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| EnvError::NoRuntime)
    }
    
    /// Creates an Arc-wrapped trigger on the current runtime.
    pub fn shared() -> Result<Arc<Self>, EnvError> {
        Self::current().map(Arc::new)
    }
}

impl PeriodicTrigger for TokioTrigger {
    fn start(
        &self,
        name: &str,
        period: Duration,
        task: TickTask,
    ) -> Result<Box<dyn TriggerHandle>, EnvError> {
        if period.is_zero() {
            return Err(EnvError::InvalidPeriod(period));
        }
        
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let name = name.to_string();
        
        let join = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            tracing::debug!(loop_name = %name, ?period, "periodic loop started");
            
            loop {
                // Stop wins over a ready tick, so nothing fires after cancel()
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => (task)(),
                }
            }
            
            tracing::debug!(loop_name = %name, "periodic loop stopped");
        });
        
        Ok(Box::new(TokioLoopHandle {
            stop: Some(stop_tx),
            task: join,
        }))
    }
}

/// Handle to a loop spawned by [`TokioTrigger`].
struct TokioLoopHandle {
    /// Stop signal; dropping it also ends the loop
    stop: Option<oneshot::Sender<()>>,
    
    /// The spawned loop task (never joined, only observed)
    task: JoinHandle<()>,
}

impl TriggerHandle for TokioLoopHandle {
    fn cancel(mut self: Box<Self>) {
        if let Some(stop) = self.stop.take() {
            // Receiver already gone means the loop is over anyway
            let _ = stop.send(());
        }
    }
    
    fn is_active(&self) -> bool {
        self.stop.is_some() && !self.task.is_finished()
    }
}
