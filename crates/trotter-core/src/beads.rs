//! The replica set ("beads") of a ring-polymer system.
//!
//! Positions and momenta are stored bead-major: bead `b`, atom `a`,
//! Cartesian component `d` lives at `b * 3N + 3a + d`. Masses are per atom;
//! [`Beads::m3`] repeats each mass three times to match a single bead's
//! degrees of freedom.

use crate::error::ConfigError;

/// P replicas of N atoms in three dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Beads {
    nbeads: usize,
    natoms: usize,
    masses: Vec<f64>,
    m3: Vec<f64>,
    q: Vec<f64>,
    p: Vec<f64>,
}

impl Beads {
    /// Create a replica set at rest at the origin.
    pub fn new(nbeads: usize, masses: Vec<f64>) -> Result<Self, ConfigError> {
        let len = nbeads * masses.len() * 3;
        Self::from_parts(nbeads, masses, vec![0.0; len], vec![0.0; len])
    }

    /// Create a replica set from explicit positions and momenta.
    pub fn from_parts(
        nbeads: usize,
        masses: Vec<f64>,
        q: Vec<f64>,
        p: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        let natoms = masses.len();
        if nbeads == 0 || natoms == 0 {
            return Err(ConfigError::EmptySystem);
        }
        for (atom, &m) in masses.iter().enumerate() {
            if !m.is_finite() || m <= 0.0 {
                return Err(ConfigError::InvalidMass { atom, value: m });
            }
        }
        let expected = nbeads * natoms * 3;
        if q.len() != expected {
            return Err(ConfigError::ShapeMismatch {
                what: "positions",
                expected,
                found: q.len(),
            });
        }
        if p.len() != expected {
            return Err(ConfigError::ShapeMismatch {
                what: "momenta",
                expected,
                found: p.len(),
            });
        }
        let m3 = masses.iter().flat_map(|&m| [m, m, m]).collect();
        Ok(Self {
            nbeads,
            natoms,
            masses,
            m3,
            q,
            p,
        })
    }

    /// Replicate a single classical configuration onto every bead.
    pub fn replicated(
        nbeads: usize,
        masses: Vec<f64>,
        q: &[f64],
        p: &[f64],
    ) -> Result<Self, ConfigError> {
        let q = q.repeat(nbeads);
        let p = p.repeat(nbeads);
        Self::from_parts(nbeads, masses, q, p)
    }

    /// Number of replicas.
    pub fn nbeads(&self) -> usize {
        self.nbeads
    }

    /// Number of atoms per replica.
    pub fn natoms(&self) -> usize {
        self.natoms
    }

    /// Degrees of freedom in one replica (`3N`).
    pub fn ndof(&self) -> usize {
        self.natoms * 3
    }

    /// Per-atom masses.
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Per-degree-of-freedom masses for one replica.
    pub fn m3(&self) -> &[f64] {
        &self.m3
    }

    /// Total mass of one replica.
    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    /// All positions, bead-major.
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Mutable positions, bead-major.
    pub fn q_mut(&mut self) -> &mut [f64] {
        &mut self.q
    }

    /// All momenta, bead-major.
    pub fn p(&self) -> &[f64] {
        &self.p
    }

    /// Mutable momenta, bead-major.
    pub fn p_mut(&mut self) -> &mut [f64] {
        &mut self.p
    }

    /// Mutable momenta alongside the per-dof masses.
    pub fn p_and_m3_mut(&mut self) -> (&mut [f64], &[f64]) {
        (&mut self.p, &self.m3)
    }

    /// Mutable positions alongside the per-dof masses.
    pub fn q_and_m3_mut(&mut self) -> (&mut [f64], &[f64]) {
        (&mut self.q, &self.m3)
    }

    /// Positions of one replica.
    pub fn bead_q(&self, bead: usize) -> &[f64] {
        let n = self.ndof();
        &self.q[bead * n..(bead + 1) * n]
    }

    /// Mutable positions of one replica.
    pub fn bead_q_mut(&mut self, bead: usize) -> &mut [f64] {
        let n = self.ndof();
        &mut self.q[bead * n..(bead + 1) * n]
    }

    /// Momenta of one replica.
    pub fn bead_p(&self, bead: usize) -> &[f64] {
        let n = self.ndof();
        &self.p[bead * n..(bead + 1) * n]
    }

    /// Centroid (bead-averaged) positions.
    pub fn centroid_q(&self) -> Vec<f64> {
        self.centroid_of(&self.q)
    }

    /// Centroid (bead-averaged) momenta.
    pub fn centroid_p(&self) -> Vec<f64> {
        self.centroid_of(&self.p)
    }

    fn centroid_of(&self, data: &[f64]) -> Vec<f64> {
        let n = self.ndof();
        let mut out = vec![0.0; n];
        for bead in data.chunks_exact(n) {
            for (o, v) in out.iter_mut().zip(bead) {
                *o += v;
            }
        }
        let inv = 1.0 / self.nbeads as f64;
        out.iter_mut().for_each(|v| *v *= inv);
        out
    }

    /// Kinetic energy `Σ p²/2m` over all replicas.
    pub fn kinetic_energy(&self) -> f64 {
        self.p
            .chunks_exact(self.ndof())
            .map(|bead| {
                bead.iter()
                    .zip(&self.m3)
                    .map(|(p, m)| 0.5 * p * p / m)
                    .sum::<f64>()
            })
            .sum()
    }

    /// Ring-polymer spring energy `½ Σ_b m ω_p² (q_b − q_{b+1})²`.
    ///
    /// Zero for a single replica.
    pub fn spring_energy(&self, omega_p: f64) -> f64 {
        if self.nbeads < 2 {
            return 0.0;
        }
        let n = self.ndof();
        let mut sum = 0.0;
        for b in 0..self.nbeads {
            let next = (b + 1) % self.nbeads;
            let qa = &self.q[b * n..(b + 1) * n];
            let qb = &self.q[next * n..(next + 1) * n];
            for ((a, c), m) in qa.iter().zip(qb).zip(&self.m3) {
                let d = a - c;
                sum += m * d * d;
            }
        }
        0.5 * omega_p * omega_p * sum
    }
}
