//! Harmonic potentials: an external trap and pairwise bonds.

use trotter_core::{Cell, ConfigError, ForceError, ForceField, ForceOutput};

fn check_stiffness(k: f64) -> Result<(), ConfigError> {
    if !k.is_finite() || k < 0.0 {
        return Err(ConfigError::InvalidParameter {
            name: "k",
            reason: format!("spring constant must be finite and non-negative, got {k}"),
        });
    }
    Ok(())
}

/// Isotropic harmonic well `V = ½ k Σ |q − c|²`.
#[derive(Clone, Debug)]
pub struct HarmonicTrap {
    k: f64,
    center: Option<Vec<f64>>,
}

impl HarmonicTrap {
    /// Trap of stiffness `k` centered at the origin.
    pub fn new(k: f64) -> Result<Self, ConfigError> {
        check_stiffness(k)?;
        Ok(Self { k, center: None })
    }

    /// Move the minimum to `center` (`3N` values).
    pub fn centered_at(mut self, center: Vec<f64>) -> Self {
        self.center = Some(center);
        self
    }

    /// Spring constant.
    pub fn k(&self) -> f64 {
        self.k
    }
}

impl ForceField for HarmonicTrap {
    fn name(&self) -> &str {
        "harmonic_trap"
    }

    fn compute(
        &mut self,
        q: &[f64],
        _cell: &Cell,
        out: &mut ForceOutput,
    ) -> Result<(), ForceError> {
        if let Some(c) = &self.center {
            if c.len() != q.len() {
                return Err(ForceError::ShapeMismatch {
                    component: self.name().to_string(),
                    expected: q.len(),
                    found: c.len(),
                });
            }
        }
        for (i, (&x, f)) in q.iter().zip(out.f.iter_mut()).enumerate() {
            let d = x - self.center.as_ref().map_or(0.0, |c| c[i]);
            *f = -self.k * d;
            out.pot += 0.5 * self.k * d * d;
        }
        for (atom, fa) in out.f.chunks_exact(3).enumerate() {
            let qa = &q[3 * atom..3 * atom + 3];
            for i in 0..3 {
                for j in 0..3 {
                    out.virial[i][j] += qa[i] * fa[j];
                }
            }
        }
        Ok(())
    }
}

/// Harmonic bonds `V = ½ k Σ (|r_ij| − r₀)²` under minimum image.
#[derive(Clone, Debug)]
pub struct HarmonicBonds {
    bonds: Vec<(usize, usize)>,
    k: f64,
    r0: f64,
}

impl HarmonicBonds {
    /// Bonds between the given atom pairs.
    pub fn new(bonds: Vec<(usize, usize)>, k: f64, r0: f64) -> Result<Self, ConfigError> {
        check_stiffness(k)?;
        if !r0.is_finite() || r0 < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "r0",
                reason: format!("rest length must be finite and non-negative, got {r0}"),
            });
        }
        if let Some(&(i, j)) = bonds.iter().find(|(i, j)| i == j) {
            return Err(ConfigError::InvalidParameter {
                name: "bonds",
                reason: format!("bond ({i}, {j}) connects an atom to itself"),
            });
        }
        Ok(Self { bonds, k, r0 })
    }

    /// Bonded atom pairs.
    pub fn bonds(&self) -> &[(usize, usize)] {
        &self.bonds
    }
}

impl ForceField for HarmonicBonds {
    fn name(&self) -> &str {
        "harmonic_bonds"
    }

    fn compute(
        &mut self,
        q: &[f64],
        cell: &Cell,
        out: &mut ForceOutput,
    ) -> Result<(), ForceError> {
        let natoms = q.len() / 3;
        for &(a, b) in &self.bonds {
            if a >= natoms || b >= natoms {
                return Err(ForceError::EvaluationFailed {
                    component: self.name().to_string(),
                    reason: format!("bond ({a}, {b}) out of range for {natoms} atoms"),
                });
            }
            let raw = [
                q[3 * a] - q[3 * b],
                q[3 * a + 1] - q[3 * b + 1],
                q[3 * a + 2] - q[3 * b + 2],
            ];
            let r = cell.minimum_image(raw);
            let len = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
            let stretch = len - self.r0;
            out.pot += 0.5 * self.k * stretch * stretch;
            if len == 0.0 {
                continue;
            }
            let scale = -self.k * stretch / len;
            let fa = [scale * r[0], scale * r[1], scale * r[2]];
            for d in 0..3 {
                out.f[3 * a + d] += fa[d];
                out.f[3 * b + d] -= fa[d];
            }
            for i in 0..3 {
                for j in 0..3 {
                    out.virial[i][j] += r[i] * fa[j];
                }
            }
        }
        Ok(())
    }
}
