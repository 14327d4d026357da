//! Real orthonormal normal-mode transform of the ring polymer.
//!
//! Mode 0 is the centroid (scaled by `√P`). Modes `k ≥ 1` decouple the
//! harmonic spring network and oscillate at `ω_k = 2 ω_p sin(πk/P)`, so
//! their free evolution can be integrated exactly. The transform is
//! orthogonal: kinetic energy is the same in either representation.

use crate::beads::Beads;

/// Normal-mode transform and free ring-polymer propagator.
#[derive(Clone, Debug)]
pub struct NormalModes {
    nbeads: usize,
    /// `c[k * P + b]`: row `k` maps bead coordinates to mode `k`.
    c: Vec<f64>,
    omega_p: f64,
    qk: Vec<f64>,
    pk: Vec<f64>,
}

impl NormalModes {
    /// Build the transform for `nbeads` replicas with `ω_p = 0`.
    ///
    /// The ensemble sets the spring frequency at bind time through
    /// [`set_temperature`](Self::set_temperature).
    pub fn new(nbeads: usize) -> Self {
        let nb = nbeads.max(1);
        let pf = nb as f64;
        let mut c = vec![0.0; nb * nb];
        for k in 0..nb {
            for b in 0..nb {
                let theta = 2.0 * std::f64::consts::PI * (k * b) as f64 / pf;
                c[k * nb + b] = if k == 0 {
                    1.0 / pf.sqrt()
                } else if 2 * k < nb {
                    (2.0 / pf).sqrt() * theta.cos()
                } else if 2 * k == nb {
                    (if b % 2 == 0 { 1.0 } else { -1.0 }) / pf.sqrt()
                } else {
                    (2.0 / pf).sqrt() * theta.sin()
                };
            }
        }
        Self {
            nbeads: nb,
            c,
            omega_p: 0.0,
            qk: vec![0.0; nb],
            pk: vec![0.0; nb],
        }
    }

    /// Number of replicas the transform was built for.
    pub fn nbeads(&self) -> usize {
        self.nbeads
    }

    /// Set `ω_p = P·k_B·T/ħ` from the path-integral temperature `ntemp`.
    pub fn set_temperature(&mut self, ntemp: f64) {
        self.omega_p = ntemp;
    }

    /// The ring-polymer spring frequency.
    pub fn omega_p(&self) -> f64 {
        self.omega_p
    }

    /// Free-ring-polymer frequency of mode `k`.
    pub fn mode_frequency(&self, k: usize) -> f64 {
        2.0 * self.omega_p * (std::f64::consts::PI * k as f64 / self.nbeads as f64).sin()
    }

    /// Transform positions and momenta into normal-mode coordinates.
    ///
    /// Returns `(qnm, pnm)` in the same mode-major layout as the beads.
    pub fn to_normal_modes(&self, beads: &Beads) -> (Vec<f64>, Vec<f64>) {
        (self.transform(beads.q(), beads.ndof()), self.transform(beads.p(), beads.ndof()))
    }

    fn transform(&self, data: &[f64], n: usize) -> Vec<f64> {
        let nb = self.nbeads;
        let mut out = vec![0.0; data.len()];
        for k in 0..nb {
            let row = &self.c[k * nb..(k + 1) * nb];
            let dst = &mut out[k * n..(k + 1) * n];
            for (b, &cb) in row.iter().enumerate() {
                for (o, v) in dst.iter_mut().zip(&data[b * n..(b + 1) * n]) {
                    *o += cb * v;
                }
            }
        }
        out
    }

    /// Kinetic energy of the normal-mode momenta.
    pub fn kinetic_energy(&self, beads: &Beads) -> f64 {
        beads.kinetic_energy()
    }

    /// Harmonic spring energy of the ring polymer at the current `ω_p`.
    pub fn spring_energy(&self, beads: &Beads) -> f64 {
        beads.spring_energy(self.omega_p)
    }

    /// Exactly propagate the non-centroid modes over `dt`.
    ///
    /// The centroid is left untouched; it belongs to the ensemble's
    /// position step. A no-op for a single replica.
    pub fn free_qstep(&mut self, beads: &mut Beads, dt: f64) {
        let nb = self.nbeads;
        if nb < 2 {
            return;
        }
        let n = beads.ndof();
        let freqs: Vec<(f64, f64, f64)> = (0..nb)
            .map(|k| {
                let w = self.mode_frequency(k);
                (w, (w * dt).cos(), (w * dt).sin())
            })
            .collect();
        let m3 = beads.m3().to_vec();
        for d in 0..n {
            let m = m3[d];
            for k in 0..nb {
                let row = &self.c[k * nb..(k + 1) * nb];
                let mut qs = 0.0;
                let mut ps = 0.0;
                for b in 0..nb {
                    qs += row[b] * beads.q()[b * n + d];
                    ps += row[b] * beads.p()[b * n + d];
                }
                self.qk[k] = qs;
                self.pk[k] = ps;
            }
            for k in 1..nb {
                let (w, cw, sw) = freqs[k];
                let (q0, p0) = (self.qk[k], self.pk[k]);
                if w > 0.0 {
                    self.qk[k] = q0 * cw + p0 / (m * w) * sw;
                    self.pk[k] = p0 * cw - m * w * q0 * sw;
                } else {
                    self.qk[k] = q0 + p0 / m * dt;
                }
            }
            for b in 0..nb {
                let mut qs = 0.0;
                let mut ps = 0.0;
                for k in 0..nb {
                    let ckb = self.c[k * nb + b];
                    qs += ckb * self.qk[k];
                    ps += ckb * self.pk[k];
                }
                beads.q_mut()[b * n + d] = qs;
                beads.p_mut()[b * n + d] = ps;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} vs {b}");
    }

    #[test]
    fn transform_is_orthonormal() {
        for nb in [1, 2, 3, 4, 7] {
            let nm = NormalModes::new(nb);
            for i in 0..nb {
                for j in 0..nb {
                    let dot: f64 = (0..nb).map(|b| nm.c[i * nb + b] * nm.c[j * nb + b]).sum();
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_close(dot, expected, 1e-12);
                }
            }
        }
    }

    #[test]
    fn centroid_mode_is_scaled_mean() {
        let beads = Beads::from_parts(
            2,
            vec![1.0],
            vec![1.0, 0.0, 0.0, 3.0, 0.0, 0.0],
            vec![0.0; 6],
        )
        .unwrap();
        let nm = NormalModes::new(2);
        let (qnm, _) = nm.to_normal_modes(&beads);
        assert_close(qnm[0], 2.0 * 2f64.sqrt(), 1e-12);
    }

    #[test]
    fn free_qstep_leaves_single_bead_alone() {
        let mut beads = Beads::replicated(1, vec![1.0], &[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0]).unwrap();
        let before = beads.clone();
        let mut nm = NormalModes::new(1);
        nm.set_temperature(1.0);
        nm.free_qstep(&mut beads, 0.5);
        assert_eq!(beads, before);
    }

    #[test]
    fn free_qstep_conserves_spring_plus_kinetic() {
        let q = vec![0.1, -0.2, 0.0, 0.3, 0.1, -0.1, -0.2, 0.05, 0.2, 0.0, 0.0, 0.1];
        let p = vec![0.5, 0.0, -0.1, -0.2, 0.3, 0.0, 0.1, -0.4, 0.2, 0.0, 0.1, -0.3];
        let mut beads = Beads::from_parts(4, vec![2.0], q, p).unwrap();
        let mut nm = NormalModes::new(4);
        nm.set_temperature(3.0);
        let e0 = nm.spring_energy(&beads) + nm.kinetic_energy(&beads);
        let c0 = beads.centroid_q();
        for _ in 0..50 {
            nm.free_qstep(&mut beads, 0.1);
        }
        let e1 = nm.spring_energy(&beads) + nm.kinetic_energy(&beads);
        assert_close(e0, e1, 1e-10);
        // Centroid is not advanced by the free propagator.
        for (a, b) in c0.iter().zip(beads.centroid_q()) {
            assert_close(*a, b, 1e-12);
        }
    }

    #[test]
    fn mode_frequencies_follow_dispersion() {
        let mut nm = NormalModes::new(4);
        nm.set_temperature(1.0);
        assert_eq!(nm.mode_frequency(0), 0.0);
        assert_close(nm.mode_frequency(2), 2.0, 1e-12);
        assert_close(nm.mode_frequency(1), nm.mode_frequency(3), 1e-12);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_beads() -> impl Strategy<Value = Beads> {
            (1usize..6, 1usize..3).prop_flat_map(|(nb, na)| {
                let n = 3 * nb * na;
                (
                    prop::collection::vec(0.5f64..4.0, na),
                    prop::collection::vec(-1.0f64..1.0, n),
                    prop::collection::vec(-1.0f64..1.0, n),
                )
                    .prop_map(move |(m, q, p)| Beads::from_parts(nb, m, q, p).unwrap())
            })
        }

        proptest! {
            #[test]
            fn free_ring_polymer_energy_is_invariant(
                mut beads in arb_beads(),
                ntemp in 0.1f64..5.0,
                dt in 0.01f64..1.0,
            ) {
                let mut nm = NormalModes::new(beads.nbeads());
                nm.set_temperature(ntemp);
                let e0 = nm.spring_energy(&beads) + nm.kinetic_energy(&beads);
                nm.free_qstep(&mut beads, dt);
                let e1 = nm.spring_energy(&beads) + nm.kinetic_energy(&beads);
                prop_assert!((e0 - e1).abs() <= 1e-9 * e0.max(1.0));
            }
        }
    }
}
