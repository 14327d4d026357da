//! Driver configuration and validation.

use std::path::PathBuf;
use std::time::Duration;

use trotter_core::ConfigError;

/// Name of the sentinel file that requests a soft exit.
pub const EXIT_SENTINEL: &str = "EXIT";

/// Builder-input for a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Step index at which the run ends. Default: 1000.
    pub total_steps: u64,
    /// Wall-clock budget; the run stops after the first step that exceeds
    /// it. Default: unlimited.
    pub max_wall_time: Option<Duration>,
    /// Path polled for existence after every step. Default: `EXIT` in the
    /// working directory.
    pub sentinel: Option<PathBuf>,
    /// Where the terminal checkpoint is written. Default: none.
    pub checkpoint_path: Option<PathBuf>,
    /// Steps between timing summaries in the log. Default: 100.
    pub log_interval: u64,
    /// Label stored in written checkpoints.
    pub label: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_steps: 1000,
            max_wall_time: None,
            sentinel: Some(PathBuf::from(EXIT_SENTINEL)),
            checkpoint_path: None,
            log_interval: 100,
            label: "trotter".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_interval == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "log_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_wall_time.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidParameter {
                name: "max_wall_time",
                reason: "a zero budget would stop before the first step".to_string(),
            });
        }
        if self
            .checkpoint_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidParameter {
                name: "checkpoint_path",
                reason: "path is empty".to_string(),
            });
        }
        Ok(())
    }
}
