//! JSON exporter for simulation runs.
//!
//! A [`FrameRecorder`] registers as a scheduler observer and snapshots the
//! house every N ticks; [`SimExport`] collects those frames for one run.

use crate::view::RecordingView;
use chrono::NaiveDateTime;
use homer_core::{
    Controller, DeviceId, DeviceState, ElectricalMeter, SimManagerConfig, TickError, Tickable,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Observer tick count when the frame was taken
    pub tick: u64,
    
    /// Controller clock
    pub date_time: NaiveDateTime,
    
    /// Time rate last pushed to the view
    pub time_rate: u32,
    
    /// Instantaneous house draw in watts
    pub consumption_w: f64,
    
    /// Energy metered so far in watt-hours
    pub energy_wh: f64,
    
    /// Every device, in registry order
    pub devices: Vec<DeviceFrame>,
}

/// State of one device in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFrame {
    pub id: DeviceId,
    pub name: String,
    pub state: DeviceState,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,
    
    /// Real trigger period in milliseconds
    pub real_step_ms: u64,
    
    /// Virtual step at rate 1 in milliseconds
    pub sim_step_ms: u64,
    
    /// All frames
    pub frames: Vec<SimFrame>,
    
    /// Final results
    pub passed: bool,
    
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, config: &SimManagerConfig) -> Self {
        Self {
            scenario: scenario.to_string(),
            real_step_ms: config.real_step_period.as_millis() as u64,
            sim_step_ms: config.sim_step_period.as_millis() as u64,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }
    
    /// Adds frames.
    pub fn extend_frames(&mut self, frames: impl IntoIterator<Item = SimFrame>) {
        self.frames.extend(frames);
    }
    
    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }
    
    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
    
    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Observer snapshotting the house every `every` ticks.
pub struct FrameRecorder {
    controller: Arc<dyn Controller>,
    meter: Arc<dyn ElectricalMeter>,
    view: Arc<RecordingView>,
    every: u64,
    ticks: AtomicU64,
    frames: Mutex<Vec<SimFrame>>,
}

impl FrameRecorder {
    pub fn new(
        controller: Arc<dyn Controller>,
        meter: Arc<dyn ElectricalMeter>,
        view: Arc<RecordingView>,
        every: u64,
    ) -> Self {
        Self {
            controller,
            meter,
            view,
            every: every.max(1),
            ticks: AtomicU64::new(0),
            frames: Mutex::new(Vec::new()),
        }
    }
    
    /// Builds a frame from the current state of the house.
    pub fn capture(&self, tick: u64) -> SimFrame {
        let devices = self
            .controller
            .device_manager()
            .devices()
            .into_iter()
            .map(|(id, device)| DeviceFrame {
                id,
                name: device.name().to_string(),
                state: device.state(),
            })
            .collect();
        
        SimFrame {
            tick,
            date_time: self.controller.clock().date_time(),
            time_rate: self.view.last_rate().unwrap_or(1),
            consumption_w: self.meter.global_consumption(),
            energy_wh: self.meter.total_energy_wh(),
            devices,
        }
    }
    
    /// Removes and returns the recorded frames.
    pub fn take_frames(&self) -> Vec<SimFrame> {
        std::mem::take(&mut *self.frames.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Tickable for FrameRecorder {
    fn update_tick(&self, _delta: Duration) -> Result<(), TickError> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        if tick % self.every == 0 {
            let frame = self.capture(tick);
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(frame);
        }
        Ok(())
    }
}
