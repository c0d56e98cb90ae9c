//! Headless views for the simulator.
//!
//! The core only pushes scalars to its view. These views either log them
//! (real-time runs) or keep them for later inspection (scripted runs).

use chrono::NaiveDateTime;
use homer_core::SimManagerView;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// View logging the clock through `tracing`, once every `log_every` pushes.
pub struct ConsoleView {
    log_every: u64,
    pushes: AtomicU64,
}

impl ConsoleView {
    pub fn new(log_every: u64) -> Self {
        Self {
            log_every: log_every.max(1),
            pushes: AtomicU64::new(0),
        }
    }
    
    /// Number of date-time pushes received.
    pub fn pushes(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }
}

impl SimManagerView for ConsoleView {
    fn set_date_time(&self, date_time: NaiveDateTime) {
        let count = self.pushes.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.log_every == 0 {
            info!("  🕒 {} (tick {})", date_time, count);
        }
    }
    
    fn set_time_rate(&self, rate: u32) {
        info!("  ⏩ time rate x{}", rate);
    }
}

/// View recording every push.
#[derive(Debug, Default)]
pub struct RecordingView {
    pushed: Mutex<Pushed>,
}

#[derive(Debug, Default)]
struct Pushed {
    date_times: Vec<NaiveDateTime>,
    rates: Vec<u32>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }
    
    fn lock(&self) -> MutexGuard<'_, Pushed> {
        self.pushed.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Every date-time pushed, oldest first.
    pub fn date_times(&self) -> Vec<NaiveDateTime> {
        self.lock().date_times.clone()
    }
    
    /// Every rate pushed, oldest first.
    pub fn rates(&self) -> Vec<u32> {
        self.lock().rates.clone()
    }
    
    pub fn last_date_time(&self) -> Option<NaiveDateTime> {
        self.lock().date_times.last().copied()
    }
    
    pub fn last_rate(&self) -> Option<u32> {
        self.lock().rates.last().copied()
    }
}

impl SimManagerView for RecordingView {
    fn set_date_time(&self, date_time: NaiveDateTime) {
        self.lock().date_times.push(date_time);
    }
    
    fn set_time_rate(&self, rate: u32) {
        self.lock().rates.push(rate);
    }
}
