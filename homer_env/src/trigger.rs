//! Periodic real-time trigger abstraction.

use crate::error::EnvError;
use std::sync::Arc;
use std::time::Duration;

/// Unit of work invoked on every trigger firing.
pub type TickTask = Arc<dyn Fn() + Send + Sync + 'static>;

/// Source of periodic real-time firings.
///
/// A trigger runs exactly one worker per started loop, so two firings of
/// the same loop never execute concurrently. When a firing takes longer
/// than the period, the next one is queued behind it (fixed-rate,
/// catch-up semantics) rather than overlapping it.
///
/// ```text
/// start() ──► fire ──► fire ──► fire ──► ... ──► cancel()
///             t=0      t=P      t=2P
/// ```
pub trait PeriodicTrigger: Send + Sync + 'static {
    /// Starts a new periodic loop calling `task` every `period`.
    ///
    /// # Arguments
    /// * `name` - Loop name, used for logging only
    /// * `period` - Real-world period between firings (must be non-zero)
    /// * `task` - Work executed on each firing
    ///
    /// # Returns
    /// * `Ok(handle)` - The loop is live until `handle.cancel()` is called
    /// * `Err(EnvError)` - The loop could not be started
    fn start(
        &self,
        name: &str,
        period: Duration,
        task: TickTask,
    ) -> Result<Box<dyn TriggerHandle>, EnvError>;
}

/// Handle to a live periodic loop.
///
/// Dropping the handle without calling [`TriggerHandle::cancel`] also stops
/// the loop.
pub trait TriggerHandle: Send + Sync {
    /// Stops scheduling further firings.
    ///
    /// Does not wait for, or interrupt, a firing that is already executing.
    fn cancel(self: Box<Self>);
    
    /// Returns true while the loop can still fire.
    fn is_active(&self) -> bool;
}
