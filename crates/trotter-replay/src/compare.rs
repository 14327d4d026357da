//! Checkpoint comparison.
//!
//! Hash-first comparison (fast path) with an element-wise bit-exact
//! fallback on mismatch that pinpoints where two checkpoints diverge.

use crate::hash::checkpoint_hash;
use crate::types::{Checkpoint, SystemSnapshot};

/// What differs between two checkpoints.
#[derive(Clone, Debug, PartialEq)]
pub enum DivergenceKind {
    /// The step counters differ.
    Step {
        /// Recorded step.
        recorded: u64,
        /// Replayed step.
        replayed: u64,
    },
    /// The checkpoints hold different numbers of systems.
    SystemCount {
        /// Recorded count.
        recorded: usize,
        /// Replayed count.
        replayed: usize,
    },
    /// An array entry differs (or the arrays differ in length).
    Array {
        /// System index.
        system: usize,
        /// Which array: `"masses"`, `"q"`, `"p"` or `"cell"`.
        array: &'static str,
        /// First differing index.
        index: usize,
        /// Recorded value, `NaN` past the end of the array.
        recorded: f64,
        /// Replayed value, `NaN` past the end of the array.
        replayed: f64,
    },
    /// The ensemble ledgers differ.
    Ledger {
        /// System index.
        system: usize,
    },
}

/// All divergences found between two checkpoints.
#[derive(Clone, Debug)]
pub struct DivergenceReport {
    /// Step of the recorded checkpoint.
    pub step: u64,
    /// One entry per divergent item.
    pub divergences: Vec<DivergenceKind>,
}

fn first_difference(a: &[f64], b: &[f64]) -> Option<(usize, f64, f64)> {
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        if x.to_bits() != y.to_bits() {
            return Some((i, *x, *y));
        }
    }
    if a.len() != b.len() {
        let i = a.len().min(b.len());
        return Some((
            i,
            a.get(i).copied().unwrap_or(f64::NAN),
            b.get(i).copied().unwrap_or(f64::NAN),
        ));
    }
    None
}

fn compare_system(
    i: usize,
    rec: &SystemSnapshot,
    rep: &SystemSnapshot,
    out: &mut Vec<DivergenceKind>,
) {
    let cell_rec: Vec<f64> = rec.cell.iter().flatten().copied().collect();
    let cell_rep: Vec<f64> = rep.cell.iter().flatten().copied().collect();
    let arrays: [(&'static str, &[f64], &[f64]); 4] = [
        ("masses", &rec.masses, &rep.masses),
        ("q", &rec.q, &rep.q),
        ("p", &rec.p, &rep.p),
        ("cell", &cell_rec, &cell_rep),
    ];
    for (array, a, b) in arrays {
        if let Some((index, recorded, replayed)) = first_difference(a, b) {
            out.push(DivergenceKind::Array {
                system: i,
                array,
                index,
                recorded,
                replayed,
            });
        }
    }
    if rec.ledger != rep.ledger || rec.nbeads != rep.nbeads {
        out.push(DivergenceKind::Ledger { system: i });
    }
}

/// Compare two checkpoints bit for bit.
///
/// Returns `None` when they are identical.
pub fn compare_checkpoints(
    recorded: &Checkpoint,
    replayed: &Checkpoint,
) -> Option<DivergenceReport> {
    if checkpoint_hash(recorded) == checkpoint_hash(replayed) && recorded == replayed {
        return None;
    }
    let mut divergences = Vec::new();
    if recorded.step != replayed.step {
        divergences.push(DivergenceKind::Step {
            recorded: recorded.step,
            replayed: replayed.step,
        });
    }
    if recorded.systems.len() != replayed.systems.len() {
        divergences.push(DivergenceKind::SystemCount {
            recorded: recorded.systems.len(),
            replayed: replayed.systems.len(),
        });
    }
    for (i, (rec, rep)) in recorded.systems.iter().zip(&replayed.systems).enumerate() {
        compare_system(i, rec, rep, &mut divergences);
    }
    if divergences.is_empty() {
        // Equal bits but unequal under `==` (NaN payloads).
        return None;
    }
    Some(DivergenceReport {
        step: recorded.step,
        divergences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnsembleLedger;

    fn checkpoint() -> Checkpoint {
        Checkpoint {
            step: 10,
            systems: vec![SystemSnapshot {
                nbeads: 1,
                masses: vec![1.0, 2.0],
                q: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
                p: vec![0.5; 6],
                cell: [[8.0, 0.0, 0.0], [0.0, 8.0, 0.0], [0.0, 0.0, 8.0]],
                ledger: EnsembleLedger::default(),
            }],
        }
    }

    #[test]
    fn identical_checkpoints_match() {
        assert!(compare_checkpoints(&checkpoint(), &checkpoint()).is_none());
    }

    #[test]
    fn momentum_divergence_is_located() {
        let a = checkpoint();
        let mut b = checkpoint();
        b.systems[0].p[4] = 0.5000001;
        let report = compare_checkpoints(&a, &b).unwrap();
        assert_eq!(report.step, 10);
        assert_eq!(
            report.divergences,
            vec![DivergenceKind::Array {
                system: 0,
                array: "p",
                index: 4,
                recorded: 0.5,
                replayed: 0.5000001,
            }]
        );
    }

    #[test]
    fn ledger_and_step_divergence_reported() {
        let a = checkpoint();
        let mut b = checkpoint();
        b.step = 11;
        b.systems[0].ledger.eens = 0.25;
        let report = compare_checkpoints(&a, &b).unwrap();
        assert!(report.divergences.contains(&DivergenceKind::Step {
            recorded: 10,
            replayed: 11
        }));
        assert!(report.divergences.contains(&DivergenceKind::Ledger { system: 0 }));
    }

    #[test]
    fn length_mismatch_reported_at_end() {
        let a = checkpoint();
        let mut b = checkpoint();
        b.systems[0].masses.push(3.0);
        let report = compare_checkpoints(&a, &b).unwrap();
        match &report.divergences[0] {
            DivergenceKind::Array {
                array,
                index,
                recorded,
                ..
            } => {
                assert_eq!(*array, "masses");
                assert_eq!(*index, 2);
                assert!(recorded.is_nan());
            }
            other => panic!("unexpected divergence {other:?}"),
        }
    }
}
