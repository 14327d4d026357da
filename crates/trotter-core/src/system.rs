//! A complete simulated system: beads, cell, normal modes, forces, bias.

use crate::beads::Beads;
use crate::cell::Cell;
use crate::error::ForceError;
use crate::forces::Forces;
use crate::normal_modes::NormalModes;

/// One independent ring-polymer system.
///
/// Fields are public so integrators can borrow the force aggregate and the
/// bead arrays at the same time.
#[derive(Debug)]
pub struct System {
    /// Replica positions, momenta and masses.
    pub beads: Beads,
    /// Periodic box.
    pub cell: Cell,
    /// Normal-mode transform sized to `beads`.
    pub nm: NormalModes,
    /// Physical forces.
    pub forces: Forces,
    /// Bias potential, applied once per outer bracket.
    pub bias: Forces,
}

impl System {
    /// Assemble a system with no bias.
    pub fn new(beads: Beads, cell: Cell, forces: Forces) -> Self {
        let nm = NormalModes::new(beads.nbeads());
        Self {
            beads,
            cell,
            nm,
            forces,
            bias: Forces::new(),
        }
    }

    /// Attach a bias potential.
    pub fn with_bias(mut self, bias: Forces) -> Self {
        self.bias = bias;
        self
    }

    /// Physical potential energy summed over replicas.
    pub fn pot(&mut self) -> Result<f64, ForceError> {
        self.forces.pot(&self.beads, &self.cell)
    }

    /// Bias potential energy summed over replicas.
    pub fn bias_pot(&mut self) -> Result<f64, ForceError> {
        self.bias.pot(&self.beads, &self.cell)
    }

    /// Kinetic energy of all replicas.
    pub fn kinetic_energy(&self) -> f64 {
        self.nm.kinetic_energy(&self.beads)
    }

    /// Ring-polymer spring energy.
    pub fn spring_energy(&self) -> f64 {
        self.nm.spring_energy(&self.beads)
    }

    /// Add `h · (forces + bias)` to the momenta.
    pub fn kick(&mut self, h: f64) -> Result<(), ForceError> {
        let f = self.forces.forces(&self.beads, &self.cell)?;
        for (p, f) in self.beads.p_mut().iter_mut().zip(f) {
            *p += h * f;
        }
        if !self.bias.is_empty() {
            let fb = self.bias.forces(&self.beads, &self.cell)?;
            for (p, f) in self.beads.p_mut().iter_mut().zip(fb) {
                *p += h * f;
            }
        }
        Ok(())
    }

    /// Add `h · f_level` to the momenta, physical forces only.
    pub fn kick_level(&mut self, level: usize, h: f64) -> Result<(), ForceError> {
        let f = self.forces.level_forces(level, &self.beads, &self.cell)?;
        for (p, f) in self.beads.p_mut().iter_mut().zip(f) {
            *p += h * f;
        }
        Ok(())
    }

    /// Add `h · f_bias` to the momenta. A no-op without a bias.
    pub fn kick_bias(&mut self, h: f64) -> Result<(), ForceError> {
        if self.bias.is_empty() {
            return Ok(());
        }
        let f = self.bias.forces(&self.beads, &self.cell)?;
        for (p, f) in self.beads.p_mut().iter_mut().zip(f) {
            *p += h * f;
        }
        Ok(())
    }

    /// Move every bead by the centroid velocity over `dt`.
    ///
    /// This is the mode-0 position update expressed in bead coordinates;
    /// non-centroid modes are handled by [`NormalModes::free_qstep`].
    pub fn qcstep(&mut self, dt: f64) {
        let pc = self.beads.centroid_p();
        let n = self.beads.ndof();
        let (q, m3) = self.beads.q_and_m3_mut();
        for bead in q.chunks_exact_mut(n) {
            for ((q, p), m) in bead.iter_mut().zip(&pc).zip(m3) {
                *q += p / m * dt;
            }
        }
    }

    /// Exactly propagate the non-centroid modes over `dt`.
    pub fn free_qstep(&mut self, dt: f64) {
        self.nm.free_qstep(&mut self.beads, dt);
    }
}
