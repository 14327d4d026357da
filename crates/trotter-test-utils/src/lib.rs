//! Test utilities and fixtures for trotter development.
//!
//! Provides ready-made systems, mock force fields (see [`fixtures`]), and
//! in-memory trajectory sources for exercising ensembles and the driver.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;
use std::io;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use trotter_core::{Beads, Cell, ForceComponent, Forces, LengthUnit, System};
use trotter_replay::{Frame, ReplayError, TrajectorySource};

pub use fixtures::{ConstantForce, FailingForce, SpringForce};

/// A cubic box large enough that nothing in a test ever wraps.
pub fn big_cell() -> Cell {
    Cell::orthorhombic(1000.0, 1000.0, 1000.0).expect("positive box")
}

/// One atom of mass `mass` with every bead at `q0` moving with `p0`, no
/// forces.
pub fn free_particle(nbeads: usize, mass: f64, q0: [f64; 3], p0: [f64; 3]) -> System {
    let beads = Beads::replicated(nbeads, vec![mass], &q0, &p0).expect("valid free particle");
    System::new(beads, big_cell(), Forces::new())
}

/// `natoms` unit-mass atoms in a spring well of stiffness `k`, with bead
/// positions and momenta drawn from a seeded stream.
pub fn harmonic_system(nbeads: usize, natoms: usize, k: f64, seed: u64) -> System {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = 3 * natoms * nbeads;
    let q: Vec<f64> = (0..n).map(|_| rng.random_range(-0.5..0.5)).collect();
    let p: Vec<f64> = (0..n).map(|_| rng.random_range(-0.5..0.5)).collect();
    let beads = Beads::from_parts(nbeads, vec![1.0; natoms], q, p).expect("valid beads");
    let forces = Forces::new()
        .with(ForceComponent::new("spring", Box::new(SpringForce::new("spring", k))))
        .expect("single component");
    System::new(beads, big_cell(), forces)
}

/// In-memory [`TrajectorySource`] that hands out a fixed list of frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
}

impl FrameBuffer {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// One bead frame per entry of `q`, in atomic units.
    pub fn positions(q: impl IntoIterator<Item = Vec<f64>>) -> Self {
        Self::new(q.into_iter().map(|q| Frame::Positions {
            unit: LengthUnit::AtomicUnit,
            q,
        }))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl TrajectorySource for FrameBuffer {
    fn next_frame(&mut self) -> Result<Option<Frame>, ReplayError> {
        Ok(self.frames.pop_front())
    }
}

/// A source that yields `good` frames and then fails with an I/O error.
#[derive(Debug)]
pub struct FailingSource {
    inner: FrameBuffer,
}

impl FailingSource {
    pub fn new(good: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            inner: FrameBuffer::new(good),
        }
    }
}

impl TrajectorySource for FailingSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, ReplayError> {
        match self.inner.next_frame()? {
            Some(frame) => Ok(Some(frame)),
            None => Err(ReplayError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "simulated read failure",
            ))),
        }
    }
}
