//! Driver error types.

use std::error::Error;
use std::fmt;
use std::io;

use trotter_core::{ConfigError, ForceError};
use trotter_ensemble::StepError;
use trotter_replay::ReplayError;

/// Failure of an [`Output`](crate::Output) while writing.
#[derive(Debug)]
pub enum OutputError {
    /// The sink could not be written.
    Io(io::Error),
    /// A property needed a force evaluation that failed.
    Force(ForceError),
    /// The trajectory encoder failed.
    Replay(ReplayError),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Force(e) => write!(f, "{e}"),
            Self::Replay(e) => write!(f, "{e}"),
        }
    }
}

impl Error for OutputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Force(e) => Some(e),
            Self::Replay(e) => Some(e),
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ForceError> for OutputError {
    fn from(e: ForceError) -> Self {
        Self::Force(e)
    }
}

impl From<ReplayError> for OutputError {
    fn from(e: ReplayError) -> Self {
        Self::Replay(e)
    }
}

/// Errors returned from [`Simulation::run`](crate::Simulation::run) and the
/// checkpoint helpers.
#[derive(Debug)]
pub enum RunError {
    /// The simulation could not be assembled.
    Config(ConfigError),
    /// A force component failed to start.
    Start(ForceError),
    /// An ensemble step failed. The systems are rolled back to `step`.
    Step {
        /// Last fully committed step.
        step: u64,
        /// Index of the failing system.
        system: usize,
        /// The underlying failure.
        source: StepError,
    },
    /// An output failed.
    Output {
        /// Name of the output.
        name: String,
        /// The underlying failure.
        source: OutputError,
    },
    /// A checkpoint could not be written or read.
    Checkpoint(ReplayError),
    /// A checkpoint does not fit the simulation it is restored into.
    CheckpointMismatch {
        /// Description of the mismatch.
        reason: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Start(e) => write!(f, "force start failed: {e}"),
            Self::Step {
                step,
                system,
                source,
            } => write!(f, "system {system} failed after step {step}: {source}"),
            Self::Output { name, source } => write!(f, "output '{name}' failed: {source}"),
            Self::Checkpoint(e) => write!(f, "checkpoint I/O failed: {e}"),
            Self::CheckpointMismatch { reason } => write!(f, "checkpoint mismatch: {reason}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Start(e) => Some(e),
            Self::Step { source, .. } => Some(source),
            Self::Output { source, .. } => Some(source),
            Self::Checkpoint(e) => Some(e),
            Self::CheckpointMismatch { .. } => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ReplayError> for RunError {
    fn from(e: ReplayError) -> Self {
        Self::Checkpoint(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_reports_the_committed_step() {
        let err = RunError::Step {
            step: 41,
            system: 1,
            source: StepError::Force(ForceError::EvaluationFailed {
                component: "lj".into(),
                reason: "nan".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("41"));
        assert!(msg.contains("system 1"));
        assert!(err.source().is_some());
    }

    #[test]
    fn output_io_error_chains() {
        let err = RunError::Output {
            name: "properties".into(),
            source: io::Error::other("disk full").into(),
        };
        assert!(err.to_string().contains("properties"));
        let inner = err.source().and_then(Error::source);
        assert!(inner.is_some());
    }
}
