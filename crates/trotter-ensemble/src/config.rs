//! Ensemble configuration and validation.

use std::fmt;

use trotter_core::{Barostat, ConfigError, Matrix3, Thermostat};
use trotter_replay::TrajectorySource;

/// Which ensemble to integrate, with the collaborators it needs.
pub enum EnsembleMode {
    /// Constant energy.
    Nve,
    /// Constant temperature.
    Nvt {
        /// Bead thermostat.
        thermostat: Box<dyn Thermostat>,
    },
    /// Constant temperature and pressure.
    Npt {
        /// Bead thermostat.
        thermostat: Box<dyn Thermostat>,
        /// Cell barostat.
        barostat: Box<dyn Barostat>,
        /// External pressure.
        pressure: f64,
    },
    /// Constant temperature and stress.
    Nst {
        /// Bead thermostat.
        thermostat: Box<dyn Thermostat>,
        /// Cell barostat.
        barostat: Box<dyn Barostat>,
        /// External stress tensor.
        stress: Matrix3,
    },
    /// Multiple-time-step NVT.
    Mts {
        /// Bead thermostat, applied around the outermost level only.
        thermostat: Box<dyn Thermostat>,
        /// Per-level subdivision factors; `None` means one per level.
        factors: Option<Vec<usize>>,
    },
    /// Positions read from a recorded trajectory.
    Replay {
        /// Frame source; binding fails without one.
        source: Option<Box<dyn TrajectorySource>>,
    },
}

impl EnsembleMode {
    /// Short lowercase name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nve => "nve",
            Self::Nvt { .. } => "nvt",
            Self::Npt { .. } => "npt",
            Self::Nst { .. } => "nst",
            Self::Mts { .. } => "mts",
            Self::Replay { .. } => "replay",
        }
    }
}

impl fmt::Debug for EnsembleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nve => f.write_str("Nve"),
            Self::Nvt { thermostat } => f
                .debug_struct("Nvt")
                .field("thermostat", &thermostat.name())
                .finish(),
            Self::Npt {
                thermostat,
                barostat,
                pressure,
            } => f
                .debug_struct("Npt")
                .field("thermostat", &thermostat.name())
                .field("barostat", &barostat.name())
                .field("pressure", pressure)
                .finish(),
            Self::Nst {
                thermostat,
                barostat,
                stress,
            } => f
                .debug_struct("Nst")
                .field("thermostat", &thermostat.name())
                .field("barostat", &barostat.name())
                .field("stress", stress)
                .finish(),
            Self::Mts {
                thermostat,
                factors,
            } => f
                .debug_struct("Mts")
                .field("thermostat", &thermostat.name())
                .field("factors", factors)
                .finish(),
            Self::Replay { source } => f
                .debug_struct("Replay")
                .field("source", &source.is_some())
                .finish(),
        }
    }
}

/// Everything needed to bind an ensemble to a system.
#[derive(Debug)]
pub struct EnsembleConfig {
    /// Outer timestep.
    pub dt: f64,
    /// Physical temperature `T`; the ring polymer runs at `P·T`.
    pub temperature: f64,
    /// Remove the centre-of-mass momentum after every kick.
    pub fixcom: bool,
    /// Atoms whose momenta are held at zero.
    pub fixatoms: Vec<usize>,
    /// Ensemble and collaborators.
    pub mode: EnsembleMode,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            temperature: 0.0,
            fixcom: false,
            fixatoms: Vec::new(),
            mode: EnsembleMode::Nve,
        }
    }
}

impl EnsembleConfig {
    /// Check the scalar parameters against a system of `natoms` atoms.
    ///
    /// Collaborator-specific checks happen when they are bound.
    pub fn validate(&self, natoms: usize) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTimestep { value: self.dt });
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ConfigError::InvalidTemperature {
                value: self.temperature,
            });
        }
        if let Some(&index) = self.fixatoms.iter().find(|&&i| i >= natoms) {
            return Err(ConfigError::FixedAtomOutOfRange { index, natoms });
        }
        match &self.mode {
            EnsembleMode::Npt { pressure, .. } if !pressure.is_finite() => {
                Err(ConfigError::InvalidParameter {
                    name: "pressure",
                    reason: format!("must be finite, got {pressure}"),
                })
            }
            EnsembleMode::Nst { stress, .. } if stress.iter().flatten().any(|s| !s.is_finite()) => {
                Err(ConfigError::InvalidParameter {
                    name: "stress",
                    reason: "every component must be finite".to_string(),
                })
            }
            EnsembleMode::Replay { source: None } => Err(ConfigError::MissingTrajectory),
            _ => Ok(()),
        }
    }
}
