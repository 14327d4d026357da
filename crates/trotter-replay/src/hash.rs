//! Bitwise fingerprints of checkpoints.
//!
//! A resumed run must reproduce an uninterrupted one exactly, so the
//! fingerprint folds in the raw bit pattern of every stored float rather
//! than a rounded value. FNV-1a is fast and stable across platforms; it is
//! not a cryptographic digest.

use crate::types::{Checkpoint, EnsembleLedger, SystemSnapshot};

/// Running 64-bit FNV-1a state.
struct StateHasher(u64);

impl StateHasher {
    const BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::BASIS)
    }

    fn word(&mut self, v: u64) {
        for b in v.to_le_bytes() {
            self.0 = (self.0 ^ u64::from(b)).wrapping_mul(Self::PRIME);
        }
    }

    fn scalar(&mut self, v: f64) {
        self.word(v.to_bits());
    }

    /// Length-prefixed, so `[a] ++ [b]` and `[a, b]` differ.
    fn array(&mut self, values: &[f64]) {
        self.word(values.len() as u64);
        values.iter().for_each(|&v| self.scalar(v));
    }

    fn ledger(&mut self, ledger: &EnsembleLedger) {
        self.scalar(ledger.eens);
        if let Some(t) = &ledger.thermostat {
            self.scalar(t.ethermo);
            self.word(t.rng_word_pos as u64);
            self.word((t.rng_word_pos >> 64) as u64);
        }
        if let Some(b) = &ledger.barostat {
            self.array(&b.momentum);
            self.scalar(b.thermostat.ethermo);
        }
        self.word(ledger.replay_frames);
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Fingerprint of one system: beads, masses, cell and ensemble ledger.
pub fn system_hash(sys: &SystemSnapshot) -> u64 {
    let mut h = StateHasher::new();
    h.word(u64::from(sys.nbeads));
    h.array(&sys.masses);
    h.array(&sys.q);
    h.array(&sys.p);
    sys.cell.iter().for_each(|row| h.array(row));
    h.ledger(&sys.ledger);
    h.finish()
}

/// Fingerprint of a whole checkpoint. The step index and the order of the
/// systems both contribute.
pub fn checkpoint_hash(chk: &Checkpoint) -> u64 {
    let mut h = StateHasher::new();
    h.word(chk.step);
    for sys in &chk.systems {
        h.word(system_hash(sys));
    }
    h.finish()
}
