//! Homer simulation CLI
//!
//! Runs scripted scenarios against the demo house, or drives it in real time.

use clap::Parser;
use homer_core::SimManagerConfig;
use homer_sim::scenarios::ScenarioId;
use homer_sim::{run_realtime, HarnessError, ScenarioResult, ScenarioRunner};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Homer home-automation simulation CLI
#[derive(Parser, Debug)]
#[command(name = "homer-sim")]
#[command(about = "Run simulation scenarios against a demo house", long_about = None)]
struct Args {
    /// Scenario to run (steady, fast_forward, pause_resume, rate_ramp, power_cut, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Trigger firings per scenario
    #[arg(short, long, default_value = "200")]
    ticks: u64,

    /// Base time rate (virtual steps per firing)
    #[arg(short = 'r', long, default_value = "1")]
    time_rate: u32,

    /// Real period between firings, in milliseconds
    #[arg(long, default_value = "10")]
    real_step_ms: u64,

    /// Virtual step at rate 1, in milliseconds
    #[arg(long, default_value = "10")]
    sim_step_ms: u64,

    /// Drive the house with the tokio trigger instead of running scenarios
    #[arg(long)]
    realtime: bool,

    /// Real-time run length in seconds
    #[arg(short, long, default_value = "2")]
    duration: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,
}

impl Args {
    fn config(&self) -> SimManagerConfig {
        SimManagerConfig::default()
            .with_real_step_period(Duration::from_millis(self.real_step_ms))
            .with_sim_step_period(Duration::from_millis(self.sim_step_ms))
            .with_initial_time_rate(self.time_rate)
    }
}

/// Frames are sampled this often in export mode.
const EXPORT_EVERY: u64 = 10;

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Homer Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let code = if args.realtime {
        realtime(&args)
    } else {
        scripted(&args)
    };

    // Exit with proper code for CI
    if code != 0 {
        std::process::exit(code);
    }
}

fn realtime(args: &Args) -> i32 {
    let duration = match Duration::try_from_secs_f64(args.duration) {
        Ok(duration) if !duration.is_zero() => duration,
        _ => {
            eprintln!("Error: --duration must be a positive number of seconds");
            return 1;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start tokio runtime: {}", e);
            return 1;
        }
    };

    let log_every = (1000 / args.real_step_ms.max(1)).max(1);
    match runtime.block_on(run_realtime(args.config(), duration, log_every)) {
        Ok(summary) => {
            if args.json {
                let summary = serde_json::json!({
                    "ticks": summary.ticks,
                    "virtual_secs": summary.virtual_elapsed.as_secs_f64(),
                    "blinds_position": summary.blinds_position,
                    "energy_wh": summary.energy_wh,
                });
                print_json(&summary);
            } else {
                info!(
                    "✓ realtime: {} ticks, virtual {:.1}s, blinds at {:.1}, {:.3} Wh",
                    summary.ticks,
                    summary.virtual_elapsed.as_secs_f64(),
                    summary.blinds_position,
                    summary.energy_wh
                );
            }
            0
        }
        Err(e) => {
            error!("✗ realtime run failed: {}", e);
            1
        }
    }
}

fn scripted(args: &Args) -> i32 {
    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: steady, fast_forward, pause_resume, rate_ramp, power_cut, all");
                return 1;
            }
        }
    };

    let runner = ScenarioRunner::new(args.ticks)
        .with_config(args.config())
        .with_time_rate(args.time_rate);

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            return 1;
        }
        return match export(&runner, scenarios[0], export_path) {
            Ok(true) => 0,
            Ok(false) => 1,
            Err(e) => {
                error!("✗ {} could not run: {}", scenarios[0].name(), e);
                1
            }
        };
    }

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for scenario in &scenarios {
        let result = match runner.run(*scenario) {
            Ok(result) => result,
            Err(e) => {
                error!("✗ {} could not run: {}", scenario.name(), e);
                return 1;
            }
        };

        if !args.json {
            if result.passed {
                info!("✓ {} PASSED", scenario.name());
            } else {
                error!(
                    "✗ {} FAILED: {}",
                    scenario.name(),
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }

        if !result.passed {
            failed_count += 1;
        }
        all_results.push(result);
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "virtual_secs": r.virtual_elapsed.as_secs_f64(),
                    "final_date_time": r.final_date_time,
                    "energy_wh": r.energy_wh,
                    "faults": r.faults,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        print_json(&summary);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
        }
    }

    if failed_count > 0 { 1 } else { 0 }
}

/// Runs one scenario with frame export. Returns whether it passed.
fn export(runner: &ScenarioRunner, scenario: ScenarioId, path: &str) -> Result<bool, HarnessError> {
    info!("Running with export to: {}", path);

    let (result, export) = runner.run_with_export(scenario, EXPORT_EVERY)?;
    export.write_to_file(path)?;
    info!("Exported {} frames to {}", export.frames.len(), path);

    if result.passed {
        info!("✓ {} PASSED - exported to {}", scenario.name(), path);
    } else {
        error!(
            "✗ {} FAILED: {}",
            scenario.name(),
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
    Ok(result.passed)
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Failed to encode summary: {}", e),
    }
}
