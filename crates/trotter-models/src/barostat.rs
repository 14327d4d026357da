//! Isotropic Bussi–Zykova–Parrinello barostat.
//!
//! The cell is scaled uniformly by the exponential of a single logarithmic
//! volume momentum. The momentum is kicked by the difference between the
//! internal (centroid-virial) pressure and the external target, and is
//! itself coupled to a thermostat. A stress-tensor target is reduced to its
//! hydrostatic part.

use tracing::warn;
use trotter_core::{
    Barostat, BarostatBinding, BarostatState, Cell, ConfigError, ForceError, System, Thermostat,
    ThermostatBinding,
};

/// BZP barostat with characteristic time `tau`.
pub struct BzpBarostat {
    tau: f64,
    thermostat: Box<dyn Thermostat>,
    mass: f64,
    p: f64,
    dt: f64,
    temperature: f64,
    pext: f64,
    nbeads: f64,
}

impl std::fmt::Debug for BzpBarostat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BzpBarostat")
            .field("tau", &self.tau)
            .field("thermostat", &self.thermostat.name())
            .field("mass", &self.mass)
            .field("p", &self.p)
            .field("pext", &self.pext)
            .finish()
    }
}

impl BzpBarostat {
    /// Barostat with characteristic time `tau`, whose momentum is
    /// thermostatted by `thermostat`.
    pub fn new(tau: f64, thermostat: Box<dyn Thermostat>) -> Result<Self, ConfigError> {
        if !tau.is_finite() || tau <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "tau",
                reason: format!("barostat tau must be finite and positive, got {tau}"),
            });
        }
        Ok(Self {
            tau,
            thermostat,
            mass: 0.0,
            p: 0.0,
            dt: 0.0,
            temperature: 0.0,
            pext: 0.0,
            nbeads: 1.0,
        })
    }

    /// Current logarithmic-volume momentum.
    pub fn momentum(&self) -> f64 {
        self.p
    }

    /// Barostat mass `3 N T (τ/2π)²`, set at bind time.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// External pressure the barostat couples to.
    pub fn pext(&self) -> f64 {
        self.pext
    }

    /// Internal pressure from the centroid-virial estimator.
    pub fn pressure(&self, sys: &mut System) -> Result<f64, ForceError> {
        let vir = sys.forces.virial(&sys.beads, &sys.cell)?;
        let f = sys.forces.forces(&sys.beads, &sys.cell)?;
        let beads = &sys.beads;
        let n = beads.ndof();
        let qc = beads.centroid_q();
        let pc = beads.centroid_p();

        let mut kst = 0.0;
        for b in 0..beads.nbeads() {
            let q = beads.bead_q(b);
            let fb = &f[b * n..(b + 1) * n];
            for d in 0..n {
                kst -= (q[d] - qc[d]) * fb[d];
            }
        }
        let centroid_kinetic: f64 = pc.iter().zip(beads.m3()).map(|(p, m)| p * p / m).sum();
        kst += centroid_kinetic * self.nbeads;

        let trace_vir = vir[0][0] + vir[1][1] + vir[2][2];
        Ok((kst + trace_vir / self.nbeads) / (3.0 * sys.cell.volume()))
    }
}

impl Barostat for BzpBarostat {
    fn name(&self) -> &str {
        "bzp"
    }

    fn bind(&mut self, binding: &BarostatBinding, system: &System) -> Result<(), ConfigError> {
        if !binding.target.is_hydrostatic() {
            warn!(
                target_pressure = binding.target.hydrostatic(),
                "isotropic barostat coupled to the hydrostatic part of an anisotropic stress"
            );
        }
        let natoms = system.beads.natoms() as f64;
        let w = self.tau / (2.0 * std::f64::consts::PI);
        self.mass = 3.0 * natoms * binding.temperature * w * w;
        if self.mass <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: "barostat mass vanishes at zero temperature".to_string(),
            });
        }
        self.dt = binding.dt;
        self.temperature = binding.temperature;
        self.pext = binding.target.hydrostatic();
        self.nbeads = system.beads.nbeads() as f64;
        self.thermostat.bind(&ThermostatBinding {
            temperature: binding.temperature,
            dt: binding.dt,
            fixdof: 0,
            ndof: 1,
        })
    }

    fn thermostat_step(&mut self) {
        let m = [self.mass];
        self.thermostat.step(std::slice::from_mut(&mut self.p), &m);
    }

    fn pstep(&mut self, sys: &mut System) -> Result<(), ForceError> {
        let dthalf = 0.5 * self.dt;
        let press = self.pressure(sys)?;
        let volume = sys.cell.volume();
        self.p += dthalf * 3.0 * (volume * (press - self.nbeads * self.pext) + self.temperature);

        let f = sys.forces.forces(&sys.beads, &sys.cell)?;
        let beads = &sys.beads;
        let n = beads.ndof();
        let pc = beads.centroid_p();
        let mut fc = vec![0.0; n];
        for bead in f.chunks_exact(n) {
            for (c, v) in fc.iter_mut().zip(bead) {
                *c += v / self.nbeads;
            }
        }
        let mut pf = 0.0;
        let mut ff = 0.0;
        for ((p, f), m) in pc.iter().zip(&fc).zip(beads.m3()) {
            pf += p * f / m;
            ff += f * f / m;
        }
        self.p += (dthalf * dthalf * pf + dthalf * dthalf * dthalf / 3.0 * ff) * self.nbeads;

        sys.kick(dthalf)
    }

    fn qcstep(&mut self, sys: &mut System) {
        let v = self.p / self.mass;
        let expq = (v * self.dt).exp();
        let expp = (-v * self.dt).exp();
        let drift = if v == 0.0 {
            self.dt
        } else {
            (expq - expp) / (2.0 * v)
        };

        let qc = sys.beads.centroid_q();
        let pc = sys.beads.centroid_p();
        let m3 = sys.beads.m3().to_vec();
        let dq: Vec<f64> = qc
            .iter()
            .zip(&pc)
            .zip(&m3)
            .map(|((q, p), m)| q * (expq - 1.0) + drift * p / m)
            .collect();
        let dp: Vec<f64> = pc.iter().map(|p| p * (expp - 1.0)).collect();

        let n = sys.beads.ndof();
        for bead in sys.beads.q_mut().chunks_exact_mut(n) {
            for (q, d) in bead.iter_mut().zip(&dq) {
                *q += d;
            }
        }
        for bead in sys.beads.p_mut().chunks_exact_mut(n) {
            for (p, d) in bead.iter_mut().zip(&dp) {
                *p += d;
            }
        }
        sys.cell.scale(expq);
    }

    fn ebaro(&self, cell: &Cell) -> f64 {
        let volume = cell.volume();
        self.thermostat.ethermo() + 0.5 * self.p * self.p / self.mass
            + self.nbeads * self.pext * volume
            - volume.ln() * self.temperature
    }

    fn state(&self) -> BarostatState {
        BarostatState {
            momentum: vec![self.p],
            thermostat: self.thermostat.state(),
        }
    }

    fn restore(&mut self, state: &BarostatState) {
        self.p = state.momentum.first().copied().unwrap_or(0.0);
        self.thermostat.restore(&state.thermostat);
    }
}
