//! HOMER Simulation Harness
//!
//! Runs the smart-home core end to end: a demo home (actuated blinds and
//! garage door, three metered outlets) driven by a [`homer_core::SimManager`].
//!
//! # Two Ways to Drive Time
//!
//! - **Scripted**: scenarios run on a [`homer_env::ManualTrigger`], so every
//!   firing is explicit and every assertion about virtual time is exact
//! - **Real time**: the CLI's `--realtime` mode runs the same home on the
//!   tokio trigger and watches it through a [`ConsoleView`]
//!
//! ```text
//! ┌──────────────┐  fire()   ┌────────────┐  delta   ┌──────────────────┐
//! │ScenarioRunner│──────────►│ SimManager │─────────►│ DemoHome devices │
//! └──────────────┘           └─────┬──────┘          └──────────────────┘
//!                                  │ clock / rate
//!                            ┌─────▼────────┐   frames   ┌───────────┐
//!                            │RecordingView │──────────► │ SimExport │
//!                            └──────────────┘            └───────────┘
//! ```

mod exporter;
mod home;
mod runner;
mod view;
pub mod scenarios;

pub use exporter::{DeviceFrame, FrameRecorder, SimExport, SimFrame};
pub use home::DemoHome;
pub use runner::{run_realtime, HarnessError, RealtimeSummary, ScenarioResult, ScenarioRunner};
pub use view::{ConsoleView, RecordingView};
