//! Presentation-side contract of the scheduler.

use chrono::NaiveDateTime;

/// Receives scalar updates pushed by the scheduler.
///
/// Pushes are one-way and happen on the scheduler's threads (the tick loop
/// for the date-time, the caller of `set_time_rate` for the rate).
/// Implementations must return quickly and must not call back into the
/// scheduler from inside a push.
pub trait SimManagerView: Send + Sync {
    /// The controller clock after a tick.
    fn set_date_time(&self, date_time: NaiveDateTime);
    
    /// The effective (clamped) time rate.
    fn set_time_rate(&self, rate: u32);
}
