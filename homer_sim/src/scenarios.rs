//! Scripted simulation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: Run at a constant rate, check exact virtual time
    Steady,
    
    /// SIM-002: x360 rate, actuators must finish travelling
    FastForward,
    
    /// SIM-003: Pause mid-run, clock must freeze, resume must not double-start
    PauseResume,
    
    /// SIM-004: Rate doubles every quarter of the run
    RateRamp,
    
    /// SIM-005: Meter cuts the washer mid-run, energy must follow
    PowerCut,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Steady,
            ScenarioId::FastForward,
            ScenarioId::PauseResume,
            ScenarioId::RateRamp,
            ScenarioId::PowerCut,
        ]
    }
    
    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Steady => "steady",
            ScenarioId::FastForward => "fast_forward",
            ScenarioId::PauseResume => "pause_resume",
            ScenarioId::RateRamp => "rate_ramp",
            ScenarioId::PowerCut => "power_cut",
        }
    }
    
    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Steady => "Constant time rate, virtual clock must match ticks x step x rate",
            ScenarioId::FastForward => "x360 time rate, blinds and garage door must reach fully open",
            ScenarioId::PauseResume => "Pause halfway, clock frozen while paused, single restart",
            ScenarioId::RateRamp => "Rate x1, x2, x4, x8 per quarter, clock must sum the segments",
            ScenarioId::PowerCut => "Washer cut halfway, consumed energy must drop accordingly",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steady" | "sim-001" => Ok(ScenarioId::Steady),
            "fast_forward" | "fastforward" | "sim-002" => Ok(ScenarioId::FastForward),
            "pause_resume" | "pauseresume" | "sim-003" => Ok(ScenarioId::PauseResume),
            "rate_ramp" | "rateramp" | "sim-004" => Ok(ScenarioId::RateRamp),
            "power_cut" | "powercut" | "sim-005" => Ok(ScenarioId::PowerCut),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
