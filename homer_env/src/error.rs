//! Error types for the HOMER environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No async runtime is reachable from the calling context
    #[error("No tokio runtime available to drive the trigger")]
    NoRuntime,
    
    /// A periodic trigger needs a non-zero period
    #[error("Invalid trigger period: {0:?}")]
    InvalidPeriod(std::time::Duration),
}
