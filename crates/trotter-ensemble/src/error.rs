//! Errors raised while an ensemble advances a step.

use std::error::Error;
use std::fmt;

use trotter_core::ForceError;
use trotter_replay::ReplayError;

/// Failure inside [`Ensemble::step`](crate::Ensemble::step).
///
/// The system may be left half-updated; the driver rolls back to the
/// checkpoint taken before the step.
#[derive(Debug)]
pub enum StepError {
    /// A force component failed to evaluate.
    Force(ForceError),
    /// The replay source could not be read.
    Trajectory(ReplayError),
    /// A replay frame does not match the system it is applied to.
    FrameShape {
        /// Which array was malformed.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Length found in the frame.
        found: usize,
    },
    /// A checkpoint frame appeared where a bead frame was expected.
    UnexpectedCheckpoint {
        /// Index of the bead being read.
        bead: usize,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Force(e) => write!(f, "force evaluation failed: {e}"),
            Self::Trajectory(e) => write!(f, "trajectory unreadable: {e}"),
            Self::FrameShape {
                what,
                expected,
                found,
            } => write!(
                f,
                "replay frame {what} has {found} values, system needs {expected}"
            ),
            Self::UnexpectedCheckpoint { bead } => {
                write!(f, "checkpoint frame found while reading bead {bead}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Force(e) => Some(e),
            Self::Trajectory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ForceError> for StepError {
    fn from(e: ForceError) -> Self {
        Self::Force(e)
    }
}

impl From<ReplayError> for StepError {
    fn from(e: ReplayError) -> Self {
        Self::Trajectory(e)
    }
}
