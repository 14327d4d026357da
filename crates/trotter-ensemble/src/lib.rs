//! Ring-polymer ensembles for trotter simulations.
//!
//! An [`Ensemble`] is bound once to a [`System`](trotter_core::System) and
//! then advances it one outer step at a time. The step ordering for each
//! flavour (NVE, NVT, NPT, NST, MTS, replay) lives here; the physics of
//! thermostats, barostats and force fields is supplied by collaborators
//! implementing the `trotter-core` traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod constraints;
pub mod ensemble;
pub mod error;
mod replay;
pub mod schedule;

pub use config::{EnsembleConfig, EnsembleMode};
pub use constraints::MomentumConstraints;
pub use ensemble::{EconsParts, Ensemble, EnsembleKind, StepOutcome, StepTimings};
pub use error::StepError;
pub use schedule::{MtsOp, MtsSchedule};
