//! Truncated and shifted Lennard-Jones pair potential.

use trotter_core::{Cell, ConfigError, ForceError, ForceField, ForceOutput};

/// `V(r) = 4ε[(σ/r)¹² − (σ/r)⁶] − V(r_c)` for `r < r_c`, zero beyond.
///
/// Pairs are evaluated under the minimum-image convention, so the cutoff
/// must not exceed half the shortest box length.
#[derive(Clone, Debug)]
pub struct LennardJones {
    epsilon: f64,
    sigma: f64,
    cutoff: f64,
    shift: f64,
}

impl LennardJones {
    /// Build the potential, validating every parameter.
    pub fn new(epsilon: f64, sigma: f64, cutoff: f64) -> Result<Self, ConfigError> {
        for (name, v) in [("epsilon", epsilon), ("sigma", sigma), ("cutoff", cutoff)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be finite and positive, got {v}"),
                });
            }
        }
        let sr6 = (sigma / cutoff).powi(6);
        Ok(Self {
            epsilon,
            sigma,
            cutoff,
            shift: 4.0 * epsilon * (sr6 * sr6 - sr6),
        })
    }

    /// Pair energy at separation `r`, including the shift.
    pub fn pair_energy(&self, r: f64) -> f64 {
        if r >= self.cutoff {
            return 0.0;
        }
        let sr6 = (self.sigma / r).powi(6);
        4.0 * self.epsilon * (sr6 * sr6 - sr6) - self.shift
    }
}

impl ForceField for LennardJones {
    fn name(&self) -> &str {
        "lennard_jones"
    }

    fn compute(
        &mut self,
        q: &[f64],
        cell: &Cell,
        out: &mut ForceOutput,
    ) -> Result<(), ForceError> {
        let h = cell.h();
        let shortest = h[0][0].min(h[1][1]).min(h[2][2]);
        if 2.0 * self.cutoff > shortest {
            return Err(ForceError::EvaluationFailed {
                component: self.name().to_string(),
                reason: format!(
                    "cutoff {} exceeds half the shortest box length {shortest}",
                    self.cutoff
                ),
            });
        }
        let natoms = q.len() / 3;
        let rc2 = self.cutoff * self.cutoff;
        for a in 0..natoms {
            for b in a + 1..natoms {
                let r = cell.minimum_image([
                    q[3 * a] - q[3 * b],
                    q[3 * a + 1] - q[3 * b + 1],
                    q[3 * a + 2] - q[3 * b + 2],
                ]);
                let r2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];
                if r2 >= rc2 {
                    continue;
                }
                let inv2 = self.sigma * self.sigma / r2;
                let sr6 = inv2 * inv2 * inv2;
                out.pot += 4.0 * self.epsilon * (sr6 * sr6 - sr6) - self.shift;
                let scale = 24.0 * self.epsilon * (2.0 * sr6 * sr6 - sr6) / r2;
                for d in 0..3 {
                    let f = scale * r[d];
                    out.f[3 * a + d] += f;
                    out.f[3 * b + d] -= f;
                }
                for i in 0..3 {
                    for j in 0..3 {
                        out.virial[i][j] += r[i] * scale * r[j];
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(r: f64) -> ForceOutput {
        let mut lj = LennardJones::new(1.0, 1.0, 3.0).unwrap();
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let mut out = ForceOutput::zeroed(6);
        lj.compute(&[0.0, 0.0, 0.0, r, 0.0, 0.0], &cell, &mut out).unwrap();
        out
    }

    #[test]
    fn force_vanishes_at_minimum() {
        let rmin = 2f64.powf(1.0 / 6.0);
        let out = pair(rmin);
        assert!(out.f[0].abs() < 1e-12);
    }

    #[test]
    fn repulsive_inside_minimum() {
        let out = pair(0.9);
        // Atom 0 at the origin is pushed towards −x.
        assert!(out.f[0] < 0.0);
        assert_eq!(out.f[0], -out.f[3]);
        assert!(out.virial[0][0] > 0.0);
    }

    #[test]
    fn energy_is_zero_beyond_cutoff() {
        let out = pair(3.5);
        assert_eq!(out.pot, 0.0);
        assert!(out.f.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn force_matches_energy_gradient() {
        let lj = LennardJones::new(1.0, 1.0, 3.0).unwrap();
        let r = 1.3;
        let h = 1e-6;
        let numeric = -(lj.pair_energy(r + h) - lj.pair_energy(r - h)) / (2.0 * h);
        let out = pair(r);
        // Force on atom 1 along +x.
        assert!((out.f[3] - numeric).abs() < 1e-6);
    }

    #[test]
    fn cutoff_larger_than_half_box_fails() {
        let mut lj = LennardJones::new(1.0, 1.0, 6.0).unwrap();
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let mut out = ForceOutput::zeroed(6);
        assert!(lj.compute(&[0.0; 6], &cell, &mut out).is_err());
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(LennardJones::new(0.0, 1.0, 2.0).is_err());
        assert!(LennardJones::new(1.0, f64::INFINITY, 2.0).is_err());
    }
}
