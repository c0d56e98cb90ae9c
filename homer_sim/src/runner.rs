//! Scenario runner - executes scripted simulation scenarios.
//!
//! Scripted runs drive the scheduler through a [`ManualTrigger`], so the
//! number of firings is exact and every virtual-time assertion can be an
//! equality. [`run_realtime`] runs the same house on the tokio trigger.

use crate::exporter::{FrameRecorder, SimExport};
use crate::home::DemoHome;
use crate::scenarios::ScenarioId;
use crate::view::{ConsoleView, RecordingView};

use chrono::NaiveDateTime;
use homer_core::{
    Actuator, Controller, DeviceError, ElectricalMeter, SimError, SimManager, SimManagerConfig,
};
use homer_env::ManualTrigger;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SECS_PER_HOUR: f64 = 3600.0;

/// Errors that prevent a scenario from running at all.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total firings executed
    pub total_ticks: u64,

    /// Virtual time elapsed on the controller clock
    pub virtual_elapsed: Duration,

    /// Controller clock at the end of the run
    pub final_date_time: NaiveDateTime,

    /// Energy metered during the run, in watt-hours
    pub energy_wh: f64,

    /// Entity updates skipped because they failed
    pub faults: u64,

    /// Failure messages, joined
    pub failure_reason: Option<String>,
}

/// Collected assertion failures of one run.
#[derive(Default)]
struct Checks {
    failures: Vec<String>,
}

impl Checks {
    fn check(&mut self, ok: bool, msg: impl FnOnce() -> String) {
        if !ok {
            let msg = msg();
            warn!("  ✗ {}", msg);
            self.failures.push(msg);
        }
    }

    fn into_reason(self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures.join("; "))
        }
    }
}

/// A house wired to a manually triggered scheduler.
struct Session {
    home: DemoHome,
    trigger: ManualTrigger,
    view: Arc<RecordingView>,
    manager: SimManager,
    recorder: Option<Arc<FrameRecorder>>,
}

/// Runs scripted scenarios.
pub struct ScenarioRunner {
    /// Scheduler timing
    config: SimManagerConfig,

    /// Firings per run
    ticks: u64,

    /// Base time rate
    time_rate: u32,
}

impl ScenarioRunner {
    /// Creates a runner firing `ticks` times per scenario.
    pub fn new(ticks: u64) -> Self {
        Self {
            config: SimManagerConfig::default(),
            ticks,
            time_rate: 1,
        }
    }

    /// Sets the scheduler configuration.
    pub fn with_config(mut self, config: SimManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base time rate.
    pub fn with_time_rate(mut self, rate: u32) -> Self {
        self.time_rate = rate;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult, HarnessError> {
        let session = self.session(None)?;
        self.execute(scenario, &session)
    }

    /// Runs a scenario, sampling a frame every `every` ticks for export.
    pub fn run_with_export(
        &self,
        scenario: ScenarioId,
        every: u64,
    ) -> Result<(ScenarioResult, SimExport), HarnessError> {
        let session = self.session(Some(every))?;
        let result = self.execute(scenario, &session)?;

        let mut export = SimExport::new(scenario.name(), session.manager.config());
        if let Some(recorder) = &session.recorder {
            export.extend_frames(recorder.take_frames());
        }
        export.finalize(result.passed, result.failure_reason.clone());
        Ok((result, export))
    }

    fn session(&self, export_every: Option<u64>) -> Result<Session, HarnessError> {
        let home = DemoHome::build()?;
        let trigger = ManualTrigger::new();
        let view = Arc::new(RecordingView::new());

        let manager = SimManager::new(
            self.config.clone().with_initial_time_rate(self.time_rate),
            Arc::new(trigger.clone()),
            view.clone(),
            home.controller.clone(),
            home.meter.clone(),
        )?;

        let recorder = export_every.map(|every| {
            let recorder = Arc::new(FrameRecorder::new(
                home.controller.clone(),
                home.meter.clone(),
                view.clone(),
                every,
            ));
            manager.add_observer(recorder.clone());
            recorder
        });

        Ok(Session {
            home,
            trigger,
            view,
            manager,
            recorder,
        })
    }

    fn execute(&self, scenario: ScenarioId, session: &Session) -> Result<ScenarioResult, HarnessError> {
        info!("Starting scenario: {} - {}", scenario.name(), scenario.description());

        let mut checks = Checks::default();
        match scenario {
            ScenarioId::Steady => self.run_steady(session, &mut checks),
            ScenarioId::FastForward => self.run_fast_forward(session, &mut checks)?,
            ScenarioId::PauseResume => self.run_pause_resume(session, &mut checks)?,
            ScenarioId::RateRamp => self.run_rate_ramp(session, &mut checks),
            ScenarioId::PowerCut => self.run_power_cut(session, &mut checks),
        }

        let clock = session.home.controller.clock();
        let faults = session.manager.fault_count();
        checks.check(faults == 0, || format!("{} entity updates faulted", faults));

        let result = ScenarioResult {
            scenario,
            total_ticks: session.manager.tick_count(),
            virtual_elapsed: clock.elapsed(),
            final_date_time: clock.date_time(),
            energy_wh: session.home.meter.total_energy_wh(),
            faults,
            passed: checks.failures.is_empty(),
            failure_reason: checks.into_reason(),
        };

        info!(
            "  {} ticks, virtual {:.1}s, clock {}, {:.2} Wh",
            result.total_ticks,
            result.virtual_elapsed.as_secs_f64(),
            result.final_date_time,
            result.energy_wh
        );
        Ok(result)
    }

    /// Fires `ticks` times, checking the clock moved by exactly `ticks * delta`.
    fn fire_segment(&self, session: &Session, ticks: u64, checks: &mut Checks) {
        let clock = session.home.controller.clock();
        let before = clock.elapsed();
        let delta = session.manager.next_delta();

        let fired = session.trigger.fire_n(ticks);
        checks.check(fired == ticks, || format!("fired {} of {} ticks", fired, ticks));

        let expected = before + span(delta, ticks);
        let actual = clock.elapsed();
        checks.check(actual == expected, || {
            format!("clock at {:?}, expected {:?}", actual, expected)
        });
        debug!("  segment: {} ticks x {:?} -> {:?}", ticks, delta, actual);
    }

    fn run_steady(&self, session: &Session, checks: &mut Checks) {
        self.fire_segment(session, self.ticks, checks);

        let pushes = session.view.date_times().len() as u64;
        checks.check(pushes == self.ticks, || {
            format!("view saw {} clock pushes for {} ticks", pushes, self.ticks)
        });
    }

    fn run_fast_forward(&self, session: &Session, checks: &mut Checks) -> Result<(), HarnessError> {
        let home = &session.home;
        session.manager.set_time_rate(self.time_rate.saturating_mul(360));
        home.open_everything()?;

        self.fire_segment(session, self.ticks, checks);

        let elapsed = home.controller.clock().elapsed().as_secs_f64();
        for device in [&home.blinds, &home.garage_door] {
            let actuator = device.actuator();
            let travel = actuator.bounds().max() - actuator.bounds().min();
            let expected = (actuator.speed() * elapsed).min(travel);
            let position = actuator.position();
            checks.check((position - expected).abs() < 1e-6, || {
                format!("actuator at {:.3}, expected {:.3}", position, expected)
            });
        }
        Ok(())
    }

    fn run_pause_resume(&self, session: &Session, checks: &mut Checks) -> Result<(), HarnessError> {
        let clock = session.home.controller.clock();
        let first_half = self.ticks / 2;
        self.fire_segment(session, first_half, checks);

        session.manager.pause();
        session.manager.pause();
        let frozen = clock.date_time();

        let fired_while_paused = session.trigger.fire_n(10);
        checks.check(fired_while_paused == 0, || {
            format!("{} ticks fired while paused", fired_while_paused)
        });
        checks.check(clock.date_time() == frozen, || "clock moved while paused".to_string());

        session.manager.resume()?;
        session.manager.resume()?;
        checks.check(clock.date_time() == frozen, || "clock moved on resume".to_string());

        let starts = session.trigger.start_count();
        checks.check(starts == 2, || format!("trigger started {} times, expected 2", starts));

        self.fire_segment(session, self.ticks - first_half, checks);
        Ok(())
    }

    fn run_rate_ramp(&self, session: &Session, checks: &mut Checks) {
        let quarter = (self.ticks / 4).max(1);
        let mut expected_rates = Vec::new();

        for shift in 0..4 {
            let rate = self.time_rate.saturating_mul(1 << shift);
            session.manager.set_time_rate(rate);
            expected_rates.push(session.manager.time_rate());
            self.fire_segment(session, quarter, checks);
        }

        let pushed = session.view.rates();
        let tail = &pushed[pushed.len().saturating_sub(4)..];
        checks.check(tail == expected_rates.as_slice(), || {
            format!("view saw rates {:?}, expected {:?}", tail, expected_rates)
        });
    }

    fn run_power_cut(&self, session: &Session, checks: &mut Checks) {
        let home = &session.home;
        let first_half = self.ticks / 2;
        let full_load = home.consumption();

        self.fire_segment(session, first_half, checks);
        let before_cut = home.controller.clock().elapsed();

        let cut = home.meter.cut_power_to(&home.washer);
        checks.check(cut, || "washer is not metered".to_string());
        let reduced_load = home.consumption();
        checks.check(reduced_load < full_load, || {
            format!("load {:.1} W did not drop after cut", reduced_load)
        });

        self.fire_segment(session, self.ticks - first_half, checks);
        let after_cut = home.controller.clock().elapsed() - before_cut;

        let expected_wh = (full_load * before_cut.as_secs_f64()
            + reduced_load * after_cut.as_secs_f64())
            / SECS_PER_HOUR;
        let energy_wh = home.meter.total_energy_wh();
        checks.check((energy_wh - expected_wh).abs() <= 1e-9 * expected_wh.max(1.0), || {
            format!("metered {:.4} Wh, expected {:.4} Wh", energy_wh, expected_wh)
        });
    }
}

/// Virtual time covered by `ticks` firings of `delta`.
fn span(delta: Duration, ticks: u64) -> Duration {
    let nanos = u64::try_from(delta.as_nanos())
        .unwrap_or(u64::MAX)
        .saturating_mul(ticks);
    Duration::from_nanos(nanos)
}

/// Summary of a real-time run.
#[derive(Debug, Clone)]
pub struct RealtimeSummary {
    pub ticks: u64,
    pub virtual_elapsed: Duration,
    pub blinds_position: f64,
    pub energy_wh: f64,
}

/// Runs the demo house on the tokio trigger for `duration` of real time.
///
/// The run pauses for a moment halfway through, to exercise pause/resume
/// against a live loop.
pub async fn run_realtime(
    config: SimManagerConfig,
    duration: Duration,
    log_every: u64,
) -> Result<RealtimeSummary, HarnessError> {
    let home = DemoHome::build()?;
    let view = Arc::new(ConsoleView::new(log_every));
    let manager = SimManager::with_tokio(
        config,
        view,
        home.controller.clone(),
        home.meter.clone(),
    )?;
    home.open_everything()?;

    tokio::time::sleep(duration / 2).await;
    manager.pause();
    info!("  ⏸ paused at {}", home.controller.clock().date_time());

    tokio::time::sleep(Duration::from_millis(200)).await;
    manager.resume()?;
    info!("  ▶ resumed");

    tokio::time::sleep(duration - duration / 2).await;
    manager.pause();

    Ok(RealtimeSummary {
        ticks: manager.tick_count(),
        virtual_elapsed: home.controller.clock().elapsed(),
        blinds_position: home.blinds.actuator().position(),
        energy_wh: home.meter.total_energy_wh(),
    })
}
