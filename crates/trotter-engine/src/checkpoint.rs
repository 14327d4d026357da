//! Capturing, restoring and persisting whole-simulation checkpoints.
//!
//! A checkpoint holds, per system, the bead arrays, the cell, and the
//! ensemble ledger. Restoring one and stepping on is bit-identical to a run
//! that was never interrupted, because every source of state the step reads
//! (including thermostat random streams) is in the ledger.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::info;
use trotter_replay::{
    BuildMetadata, Checkpoint, SystemSnapshot, TrajectoryReader, TrajectoryWriter,
};

use crate::error::RunError;
use crate::simulation::BoundSystem;

/// Snapshot every system after `step` completed steps.
pub fn capture(step: u64, systems: &[BoundSystem]) -> Checkpoint {
    let systems = systems
        .iter()
        .map(|b| {
            let beads = &b.system.beads;
            SystemSnapshot {
                nbeads: beads.nbeads() as u32,
                masses: beads.masses().to_vec(),
                q: beads.q().to_vec(),
                p: beads.p().to_vec(),
                cell: *b.system.cell.h(),
                ledger: b.ensemble.ledger(),
            }
        })
        .collect();
    Checkpoint { step, systems }
}

/// Overwrite `systems` with the state in `checkpoint`.
///
/// Every snapshot is checked against its system before anything is
/// written, so a mismatch leaves the systems untouched.
pub fn restore(checkpoint: &Checkpoint, systems: &mut [BoundSystem]) -> Result<(), RunError> {
    if checkpoint.systems.len() != systems.len() {
        return Err(RunError::CheckpointMismatch {
            reason: format!(
                "checkpoint has {} systems, simulation has {}",
                checkpoint.systems.len(),
                systems.len()
            ),
        });
    }
    for (i, (snap, bound)) in checkpoint.systems.iter().zip(systems.iter()).enumerate() {
        let beads = &bound.system.beads;
        if snap.nbeads as usize != beads.nbeads() || snap.masses != beads.masses() {
            return Err(RunError::CheckpointMismatch {
                reason: format!("system {i}: bead count or masses differ"),
            });
        }
        if snap.q.len() != beads.q().len() || snap.p.len() != beads.p().len() {
            return Err(RunError::CheckpointMismatch {
                reason: format!("system {i}: array lengths differ"),
            });
        }
    }
    for (snap, bound) in checkpoint.systems.iter().zip(systems.iter_mut()) {
        bound.system.beads.q_mut().copy_from_slice(&snap.q);
        bound.system.beads.p_mut().copy_from_slice(&snap.p);
        bound.system.cell.set_h(snap.cell);
        bound.ensemble.restore(&snap.ledger);
    }
    Ok(())
}

/// Write `checkpoint` to `path` as a one-frame stream.
pub fn write(path: &Path, checkpoint: &Checkpoint, label: &str) -> Result<(), RunError> {
    let file = File::create(path).map_err(trotter_replay::ReplayError::from)?;
    let mut writer = TrajectoryWriter::new(BufWriter::new(file), &BuildMetadata::current(label))?;
    writer.write_checkpoint(checkpoint)?;
    writer.flush()?;
    info!(path = %path.display(), step = checkpoint.step, "checkpoint written");
    Ok(())
}

/// Read the first checkpoint frame from `path`.
pub fn read(path: &Path) -> Result<Checkpoint, RunError> {
    TrajectoryReader::open_path(path)?
        .next_checkpoint()?
        .ok_or_else(|| RunError::CheckpointMismatch {
            reason: format!("{} holds no checkpoint frame", path.display()),
        })
}
