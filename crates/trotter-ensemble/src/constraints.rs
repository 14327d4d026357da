//! Momentum constraints: centre-of-mass removal and frozen atoms.
//!
//! Both constraints remove kinetic energy from the system. The energy taken
//! out is returned to the caller, which books it in `eens` so the conserved
//! quantity is unaffected.

use trotter_core::Beads;

/// Which momenta the ensemble keeps pinned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MomentumConstraints {
    fixcom: bool,
    fixatoms: Vec<usize>,
}

impl MomentumConstraints {
    /// Constraints with the given switches. Indices are validated by the
    /// ensemble configuration, not here.
    pub fn new(fixcom: bool, fixatoms: Vec<usize>) -> Self {
        Self { fixcom, fixatoms }
    }

    /// Whether the centre-of-mass momentum is removed.
    pub fn fixcom(&self) -> bool {
        self.fixcom
    }

    /// Indices of atoms whose momenta are zeroed on every bead.
    pub fn fixatoms(&self) -> &[usize] {
        &self.fixatoms
    }

    /// Whether applying the constraints can change anything.
    pub fn is_empty(&self) -> bool {
        !self.fixcom && self.fixatoms.is_empty()
    }

    /// Degrees of freedom removed: `3·nfix·P`, plus 3 with `fixcom`.
    pub fn fixdof(&self, nbeads: usize) -> usize {
        3 * self.fixatoms.len() * nbeads + if self.fixcom { 3 } else { 0 }
    }

    /// Enforce the constraints on `beads` and return the kinetic energy
    /// removed.
    pub fn apply(&self, beads: &mut Beads) -> f64 {
        let mut removed = 0.0;
        let nbeads = beads.nbeads();
        let ndof = beads.ndof();

        if self.fixcom {
            let total_mass = beads.total_mass();
            let mut pcom = [0.0; 3];
            for bead in beads.p().chunks_exact(ndof) {
                for atom in bead.chunks_exact(3) {
                    for d in 0..3 {
                        pcom[d] += atom[d];
                    }
                }
            }
            let p2: f64 = pcom.iter().map(|x| x * x).sum();
            removed += 0.5 * p2 / (nbeads as f64 * total_mass);

            let (p, m3) = beads.p_and_m3_mut();
            let denom = nbeads as f64 * total_mass;
            for bead in p.chunks_exact_mut(ndof) {
                for (i, pi) in bead.iter_mut().enumerate() {
                    *pi -= m3[i] * pcom[i % 3] / denom;
                }
            }
        }

        if !self.fixatoms.is_empty() {
            let (p, m3) = beads.p_and_m3_mut();
            for bead in p.chunks_exact_mut(ndof) {
                for &atom in &self.fixatoms {
                    for d in 0..3 {
                        let i = 3 * atom + d;
                        removed += 0.5 * bead[i] * bead[i] / m3[i];
                        bead[i] = 0.0;
                    }
                }
            }
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn beads(p: Vec<f64>, nbeads: usize, masses: Vec<f64>) -> Beads {
        let q = vec![0.0; p.len()];
        Beads::from_parts(nbeads, masses, q, p).unwrap()
    }

    #[test]
    fn fixdof_counts() {
        assert_eq!(MomentumConstraints::default().fixdof(4), 0);
        assert_eq!(MomentumConstraints::new(true, vec![]).fixdof(4), 3);
        assert_eq!(MomentumConstraints::new(true, vec![0, 2]).fixdof(4), 27);
    }

    #[test]
    fn empty_constraints_do_nothing() {
        let mut b = beads(vec![1.0, 2.0, 3.0], 1, vec![1.0]);
        let removed = MomentumConstraints::default().apply(&mut b);
        assert_eq!(removed, 0.0);
        assert_eq!(b.p(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn fixed_atom_momenta_are_zeroed() {
        let mut b = beads(vec![1.0, 0.0, 0.0, 2.0, 0.0, 0.0], 1, vec![2.0, 1.0]);
        let removed = MomentumConstraints::new(false, vec![1]).apply(&mut b);
        assert_eq!(b.p(), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(removed, 2.0);
    }

    #[test]
    fn com_removal_books_its_energy() {
        // Two equal atoms moving together: all kinetic energy is COM motion.
        let mut b = beads(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0], 1, vec![1.0, 1.0]);
        let before = b.kinetic_energy();
        let removed = MomentumConstraints::new(true, vec![]).apply(&mut b);
        assert!((removed - before).abs() < 1e-15);
        assert!(b.p().iter().all(|p| p.abs() < 1e-15));
    }

    proptest! {
        #[test]
        fn com_momentum_vanishes(
            p in prop::collection::vec(-5.0f64..5.0, 18),
            masses in prop::collection::vec(0.5f64..20.0, 3),
        ) {
            let mut b = beads(p, 2, masses);
            MomentumConstraints::new(true, vec![]).apply(&mut b);
            let mut pcom = [0.0; 3];
            for atom in b.p().chunks_exact(3) {
                for d in 0..3 {
                    pcom[d] += atom[d];
                }
            }
            for c in pcom {
                prop_assert!(c.abs() < 1e-10, "residual {}", c);
            }
        }

        #[test]
        fn removed_energy_matches_kinetic_drop(
            p in prop::collection::vec(-5.0f64..5.0, 18),
            masses in prop::collection::vec(0.5f64..20.0, 3),
        ) {
            let mut b = beads(p, 2, masses);
            let before = b.kinetic_energy();
            let removed = MomentumConstraints::new(true, vec![1]).apply(&mut b);
            let after = b.kinetic_energy();
            prop_assert!((before - after - removed).abs() < 1e-9 * before.max(1.0));
        }
    }
}
