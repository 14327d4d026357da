//! Collaborator traits consumed by the ensembles.
//!
//! Thermostats and barostats are plugged into an ensemble at bind time.
//! The ensemble owns the step ordering; collaborators only ever perform
//! one half-step when asked and keep a running tally of the energy they
//! exchanged with the system so the conserved quantity stays constant.

use crate::cell::{Cell, Matrix3};
use crate::error::{ConfigError, ForceError};
use crate::system::System;

/// Parameters a thermostat receives when bound to an ensemble.
#[derive(Clone, Debug, PartialEq)]
pub struct ThermostatBinding {
    /// Path-integral temperature `P·T`.
    pub temperature: f64,
    /// Full outer timestep; each call to [`Thermostat::step`] covers `dt/2`.
    pub dt: f64,
    /// Degrees of freedom removed by momentum constraints.
    pub fixdof: usize,
    /// Total degrees of freedom, `3·N·P`.
    pub ndof: usize,
}

/// Serializable snapshot of a thermostat.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThermostatState {
    /// Accumulated heat exchanged with the system.
    pub ethermo: f64,
    /// Position in the random stream, for stochastic thermostats.
    pub rng_word_pos: u128,
}

/// Couples the bead momenta to a heat bath.
pub trait Thermostat: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Receive temperature and timestep. Called once, before any step.
    fn bind(&mut self, binding: &ThermostatBinding) -> Result<(), ConfigError>;

    /// Apply one half-step to the momenta `p`.
    ///
    /// `m` holds the masses of one block of `p`; it repeats across the
    /// blocks (one block per replica for bead momenta).
    fn step(&mut self, p: &mut [f64], m: &[f64]);

    /// Heat removed from the system so far.
    fn ethermo(&self) -> f64;

    /// Snapshot for checkpointing.
    fn state(&self) -> ThermostatState;

    /// Restore a snapshot taken by [`state`](Self::state).
    fn restore(&mut self, state: &ThermostatState);
}

/// External pressure or stress driving a barostat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PressureTarget {
    /// Scalar pressure (NPT).
    Pressure(f64),
    /// Full stress tensor (NST).
    Stress(Matrix3),
}

impl PressureTarget {
    /// Whether the target is `p·I` for some scalar `p`.
    pub fn is_hydrostatic(&self) -> bool {
        match self {
            Self::Pressure(_) => true,
            Self::Stress(s) => {
                let p = s[0][0];
                (0..3).all(|i| (0..3).all(|j| s[i][j] == if i == j { p } else { 0.0 }))
            }
        }
    }

    /// The scalar pressure an isotropic barostat couples to.
    ///
    /// Exactly `p` for `Pressure(p)` and for `Stress(p·I)`; the mean of the
    /// diagonal otherwise.
    pub fn hydrostatic(&self) -> f64 {
        match self {
            Self::Pressure(p) => *p,
            Self::Stress(s) if self.is_hydrostatic() => s[0][0],
            Self::Stress(s) => (s[0][0] + s[1][1] + s[2][2]) / 3.0,
        }
    }
}

/// Parameters a barostat receives when bound to an ensemble.
#[derive(Clone, Debug, PartialEq)]
pub struct BarostatBinding {
    /// Path-integral temperature `P·T`.
    pub temperature: f64,
    /// Full outer timestep.
    pub dt: f64,
    /// External pressure or stress.
    pub target: PressureTarget,
    /// Degrees of freedom removed by momentum constraints.
    pub fixdof: usize,
}

/// Serializable snapshot of a barostat.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarostatState {
    /// Cell momentum components.
    pub momentum: Vec<f64>,
    /// The barostat's own thermostat.
    pub thermostat: ThermostatState,
}

/// Propagates the cell together with the bead centroids.
pub trait Barostat: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Receive the external target and bind the internal thermostat.
    fn bind(&mut self, binding: &BarostatBinding, system: &System) -> Result<(), ConfigError>;

    /// One half-step of the barostat's own thermostat.
    fn thermostat_step(&mut self);

    /// Half momentum step for the cell and the beads (forces plus bias).
    fn pstep(&mut self, system: &mut System) -> Result<(), ForceError>;

    /// Full position step for the centroid and the cell.
    fn qcstep(&mut self, system: &mut System);

    /// Barostat contribution to the conserved quantity.
    fn ebaro(&self, cell: &Cell) -> f64;

    /// Snapshot for checkpointing.
    fn state(&self) -> BarostatState;

    /// Restore a snapshot taken by [`state`](Self::state).
    fn restore(&mut self, state: &BarostatState);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::IDENTITY;

    #[test]
    fn scalar_pressure_is_hydrostatic() {
        let t = PressureTarget::Pressure(2.5);
        assert!(t.is_hydrostatic());
        assert_eq!(t.hydrostatic(), 2.5);
    }

    #[test]
    fn isotropic_stress_reduces_exactly() {
        let p = 0.1 + 0.2;
        let mut s = IDENTITY;
        for (i, row) in s.iter_mut().enumerate() {
            row[i] = p;
        }
        let t = PressureTarget::Stress(s);
        assert!(t.is_hydrostatic());
        assert_eq!(t.hydrostatic().to_bits(), p.to_bits());
    }

    #[test]
    fn anisotropic_stress_uses_trace() {
        let s = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 6.0]];
        let t = PressureTarget::Stress(s);
        assert!(!t.is_hydrostatic());
        assert_eq!(t.hydrostatic(), 3.0);
    }
}
