//! Error types for the trotter framework.
//!
//! Split by phase: [`ConfigError`] is raised while building and binding
//! (before any step runs), [`ForceError`] while evaluating forces inside a
//! step.

use std::error::Error;
use std::fmt;

/// Errors detected while constructing or binding simulation objects.
///
/// Every variant is fatal: a configuration that fails validation never
/// produces a bound ensemble.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The replica set has zero beads or zero atoms.
    EmptySystem,
    /// An array does not have the length implied by the replica set.
    ShapeMismatch {
        /// Which array was malformed.
        what: &'static str,
        /// The expected length.
        expected: usize,
        /// The length found.
        found: usize,
    },
    /// An atom mass is not finite and positive.
    InvalidMass {
        /// Atom index.
        atom: usize,
        /// The offending mass.
        value: f64,
    },
    /// The timestep is NaN, infinite, zero, or negative.
    InvalidTimestep {
        /// The invalid value.
        value: f64,
    },
    /// The temperature is NaN, infinite, or negative.
    InvalidTemperature {
        /// The invalid value.
        value: f64,
    },
    /// A fixed-atom index is outside the replica set.
    FixedAtomOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of atoms in the system.
        natoms: usize,
    },
    /// The MTS factor list is empty or contains a zero.
    MalformedMtsFactors {
        /// Description of the problem.
        reason: String,
    },
    /// The MTS factor list does not cover every force level.
    MtsLevelMismatch {
        /// Number of configured factors.
        factors: usize,
        /// Number of levels declared by the force components.
        levels: usize,
    },
    /// Replay was requested without a trajectory source.
    MissingTrajectory,
    /// The cell matrix is not upper-triangular or has non-positive volume.
    InvalidCell {
        /// Description of the problem.
        reason: String,
    },
    /// Two force components share a name.
    DuplicateComponent {
        /// The duplicated name.
        name: String,
    },
    /// A collaborator parameter is out of range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },
    /// The ensemble/collaborator combination cannot run.
    InvalidEnsemble {
        /// Description of the problem.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySystem => write!(f, "replica set has zero beads or zero atoms"),
            Self::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what}: expected length {expected}, found {found}"),
            Self::InvalidMass { atom, value } => {
                write!(f, "mass of atom {atom} must be finite and positive, got {value}")
            }
            Self::InvalidTimestep { value } => {
                write!(f, "timestep must be finite and positive, got {value}")
            }
            Self::InvalidTemperature { value } => {
                write!(f, "temperature must be finite and non-negative, got {value}")
            }
            Self::FixedAtomOutOfRange { index, natoms } => {
                write!(f, "fixed atom {index} out of range for {natoms} atoms")
            }
            Self::MalformedMtsFactors { reason } => write!(f, "malformed MTS factors: {reason}"),
            Self::MtsLevelMismatch { factors, levels } => write!(
                f,
                "{factors} MTS factors configured but forces declare {levels} levels"
            ),
            Self::MissingTrajectory => write!(f, "replay requires a trajectory source"),
            Self::InvalidCell { reason } => write!(f, "invalid cell: {reason}"),
            Self::DuplicateComponent { name } => {
                write!(f, "force component '{name}' registered twice")
            }
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{name}': {reason}")
            }
            Self::InvalidEnsemble { reason } => write!(f, "invalid ensemble: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Errors from force evaluation during a step.
///
/// Not retried: the ensemble propagates these to the driver, which
/// persists the last committed state and stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForceError {
    /// A force component failed to produce a result.
    EvaluationFailed {
        /// Name of the failing component.
        component: String,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A force component wrote an output of the wrong size.
    ShapeMismatch {
        /// Name of the component.
        component: String,
        /// The expected number of force entries.
        expected: usize,
        /// The number produced.
        found: usize,
    },
    /// A force component could not be started.
    StartFailed {
        /// Name of the component.
        component: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for ForceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvaluationFailed { component, reason } => {
                write!(f, "force component '{component}' failed: {reason}")
            }
            Self::ShapeMismatch {
                component,
                expected,
                found,
            } => write!(
                f,
                "force component '{component}' produced {found} entries, expected {expected}"
            ),
            Self::StartFailed { component, reason } => {
                write!(f, "force component '{component}' could not start: {reason}")
            }
        }
    }
}

impl Error for ForceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_mentions_values() {
        let err = ConfigError::MtsLevelMismatch {
            factors: 1,
            levels: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains('1'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn force_error_display_names_component() {
        let err = ForceError::EvaluationFailed {
            component: "bonds".to_string(),
            reason: "engine hung up".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "force component 'bonds' failed: engine hung up"
        );
    }
}
