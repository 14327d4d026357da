//! Data types for trajectory frames and checkpoints.

use trotter_core::{BarostatState, LengthUnit, Matrix3, ThermostatState};

/// Producer metadata stored in the stream header.
///
/// # Examples
///
/// ```
/// use trotter_replay::BuildMetadata;
///
/// let meta = BuildMetadata::current("water-64");
/// assert_eq!(meta.label, "water-64");
/// assert!(!meta.trotter_version.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildMetadata {
    /// Version of the crate that wrote the stream.
    pub trotter_version: String,
    /// Free-form label (system name, run id).
    pub label: String,
}

impl BuildMetadata {
    /// Metadata for the running build.
    pub fn current(label: impl Into<String>) -> Self {
        Self {
            trotter_version: env!("CARGO_PKG_VERSION").to_string(),
            label: label.into(),
        }
    }
}

/// One record in a trajectory stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// Positions of a single replica, `3N` values in `unit`.
    Positions {
        /// Length unit of `q`.
        unit: LengthUnit,
        /// Flattened coordinates.
        q: Vec<f64>,
    },
    /// Positions of a single replica plus the box, both in `unit`.
    PositionsWithCell {
        /// Length unit of `q` and `cell`.
        unit: LengthUnit,
        /// Flattened coordinates.
        q: Vec<f64>,
        /// Upper-triangular box matrix.
        cell: Matrix3,
    },
    /// A complete restart state.
    Checkpoint(Box<Checkpoint>),
}

/// Energy bookkeeping an ensemble needs to resume exactly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnsembleLedger {
    /// Energy absorbed by momentum constraints.
    pub eens: f64,
    /// Bead thermostat state, if the ensemble has one.
    pub thermostat: Option<ThermostatState>,
    /// Barostat state, if the ensemble has one.
    pub barostat: Option<BarostatState>,
    /// Frames consumed by a replay ensemble.
    pub replay_frames: u64,
}

/// State of one system at a step boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemSnapshot {
    /// Number of replicas.
    pub nbeads: u32,
    /// Per-atom masses.
    pub masses: Vec<f64>,
    /// Positions, bead-major, in bohr.
    pub q: Vec<f64>,
    /// Momenta, bead-major.
    pub p: Vec<f64>,
    /// Box matrix, in bohr.
    pub cell: Matrix3,
    /// Ensemble bookkeeping.
    pub ledger: EnsembleLedger,
}

/// Restart state of a whole simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    /// Number of completed outer steps.
    pub step: u64,
    /// One snapshot per system, in driver order.
    pub systems: Vec<SystemSnapshot>,
}

// ── Frame tag constants ─────────────────────────────────────────

/// Tag for [`Frame::Positions`].
pub const FRAME_POSITIONS: u8 = 0;
/// Tag for [`Frame::PositionsWithCell`].
pub const FRAME_POSITIONS_WITH_CELL: u8 = 1;
/// Tag for [`Frame::Checkpoint`].
pub const FRAME_CHECKPOINT: u8 = 2;
