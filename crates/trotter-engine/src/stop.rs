//! Soft-exit conditions polled between steps.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag another thread can set to stop a running simulation.
///
/// The flag is only read between steps, so the step in flight always
/// completes.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of steps was reached.
    Completed,
    /// The cancellation token was set.
    Cancelled,
    /// The sentinel file appeared.
    Sentinel,
    /// The wall-clock budget ran out.
    WallClock,
    /// A replay source ran out of frames.
    Exhausted,
    /// A replay source ended with a checkpoint.
    Finished,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "step budget reached",
            Self::Cancelled => "cancelled",
            Self::Sentinel => "sentinel file found",
            Self::WallClock => "wall-clock budget exhausted",
            Self::Exhausted => "trajectory exhausted",
            Self::Finished => "trajectory checkpoint reached",
        })
    }
}

/// The external stop conditions of one run.
#[derive(Debug)]
pub(crate) struct StopConditions {
    pub(crate) token: CancellationToken,
    pub(crate) sentinel: Option<PathBuf>,
    pub(crate) budget: Option<Duration>,
}

impl StopConditions {
    /// First condition that holds, checked in order: token, sentinel, clock.
    pub(crate) fn poll(&self, started: Instant) -> Option<StopReason> {
        if self.token.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        if self.sentinel.as_ref().is_some_and(|p| p.exists()) {
            return Some(StopReason::Sentinel);
        }
        if self.budget.is_some_and(|b| started.elapsed() >= b) {
            return Some(StopReason::WallClock);
        }
        None
    }
}
