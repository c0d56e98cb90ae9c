//! Virtual clock - the simulation's notion of the current date-time.

use crate::error::TickError;
use crate::tick::Tickable;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Monotonically non-decreasing logical date-time.
///
/// The clock never reads the wall clock. It only moves when advanced, and
/// an advance that would overflow the representable range saturates at the
/// current value instead of wrapping.
#[derive(Debug)]
pub struct VirtualClock {
    /// Date-time at construction
    start: NaiveDateTime,
    
    /// Current date-time
    now: Mutex<NaiveDateTime>,
}

impl VirtualClock {
    /// Creates a clock reading `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            now: Mutex::new(start),
        }
    }
    
    /// Default simulation epoch: 2024-01-01 00:00:00.
    pub fn default_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }
    
    fn lock(&self) -> MutexGuard<'_, NaiveDateTime> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Returns the current date-time.
    pub fn date_time(&self) -> NaiveDateTime {
        *self.lock()
    }
    
    /// Returns the date-time the clock started at.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }
    
    /// Returns the virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        (self.date_time() - self.start).to_std().unwrap_or_default()
    }
    
    /// Advances the clock by `delta` and returns the new date-time.
    pub fn advance(&self, delta: Duration) -> NaiveDateTime {
        let mut now = self.lock();
        let advanced = chrono::Duration::from_std(delta)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta));
        
        match advanced {
            Some(next) => *now = next,
            None => tracing::warn!(?delta, "virtual clock advance out of range, holding"),
        }
        *now
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new(Self::default_start())
    }
}

impl Tickable for VirtualClock {
    fn update_tick(&self, delta: Duration) -> Result<(), TickError> {
        self.advance(delta);
        Ok(())
    }
}
