//! Simulation driver for trotter.
//!
//! Provides the top-level [`Simulation`] that steps one or more bound
//! systems, feeds [`Output`]s, keeps a rollback checkpoint, and stops on a
//! step budget, a cancellation token, a sentinel file, or a wall-clock
//! budget.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod simulation;
pub mod stop;

pub use config::{SimulationConfig, EXIT_SENTINEL};
pub use error::{OutputError, RunError};
pub use metrics::StepMetrics;
pub use output::{Output, PropertyLog, TrajectoryOutput};
pub use simulation::{BoundSystem, RunSummary, Simulation};
pub use stop::{CancellationToken, StopReason};
