//! Determinism and file round-trip tests for trajectory streams.
//!
//! Each test drives a small ring polymer by hand with the core kick and
//! drift operations, records it, and checks the stream or the checkpoint
//! comparison against a second identical run.

use std::io::Cursor;

use trotter_core::{LengthUnit, System};
use trotter_replay::{
    checkpoint_hash, compare_checkpoints, BuildMetadata, Checkpoint, DivergenceKind,
    EnsembleLedger, Frame, SystemSnapshot, TrajectoryReader, TrajectoryWriter,
};
use trotter_test_utils::harmonic_system;

// ── Helpers ─────────────────────────────────────────────────────

fn velocity_verlet(sys: &mut System, dt: f64, steps: usize) {
    for _ in 0..steps {
        sys.kick(dt / 2.0).unwrap();
        sys.qcstep(dt);
        sys.free_qstep(dt);
        sys.kick(dt / 2.0).unwrap();
    }
}

fn snapshot(step: u64, sys: &System) -> Checkpoint {
    Checkpoint {
        step,
        systems: vec![SystemSnapshot {
            nbeads: sys.beads.nbeads() as u32,
            masses: sys.beads.masses().to_vec(),
            q: sys.beads.q().to_vec(),
            p: sys.beads.p().to_vec(),
            cell: *sys.cell.h(),
            ledger: EnsembleLedger {
                eens: 0.0,
                thermostat: None,
                barostat: None,
                replay_frames: step,
            },
        }],
    }
}

fn record(sys: &mut System, steps: usize) -> Vec<u8> {
    let mut writer = TrajectoryWriter::new(Vec::new(), &BuildMetadata::current("verlet")).unwrap();
    for _ in 0..steps {
        velocity_verlet(sys, 0.05, 1);
        writer
            .write_beads(LengthUnit::AtomicUnit, &sys.beads, &sys.cell)
            .unwrap();
    }
    writer.write_checkpoint(&snapshot(steps as u64, sys)).unwrap();
    writer.into_inner()
}

// ── Tests ───────────────────────────────────────────────────────

#[test]
fn identical_runs_produce_identical_streams() {
    let mut a = harmonic_system(4, 3, 1.0, 21);
    let mut b = harmonic_system(4, 3, 1.0, 21);
    assert_eq!(record(&mut a, 20), record(&mut b, 20));
    assert!(compare_checkpoints(&snapshot(20, &a), &snapshot(20, &b)).is_none());
}

#[test]
fn stream_reads_back_frame_for_frame() {
    let mut sys = harmonic_system(2, 2, 1.0, 3);
    let bytes = record(&mut sys, 5);

    let mut reader = TrajectoryReader::open(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.metadata().label, "verlet");
    let mut positions = 0;
    let mut last = None;
    while let Some(frame) = reader.next_frame().unwrap() {
        match frame {
            Frame::PositionsWithCell { unit, q, .. } => {
                assert_eq!(unit, LengthUnit::AtomicUnit);
                assert_eq!(q.len(), 6);
                positions += 1;
            }
            Frame::Checkpoint(chk) => last = Some(*chk),
            Frame::Positions { .. } => panic!("no bare position frames were written"),
        }
    }
    assert_eq!(positions, 5 * 2);
    assert_eq!(reader.frames_read(), 5 * 2 + 1);
    let last = last.unwrap();
    assert_eq!(checkpoint_hash(&last), checkpoint_hash(&snapshot(5, &sys)));
}

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join(format!("trotter-replay-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("run.trj");

    let mut sys = harmonic_system(3, 2, 1.0, 8);
    std::fs::write(&path, record(&mut sys, 4)).unwrap();

    let mut reader = TrajectoryReader::open_path(&path).unwrap();
    let mut count = 0;
    while reader.next_frame().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 4 * 3 + 1);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn a_single_flipped_bit_is_located() {
    let mut a = harmonic_system(2, 2, 1.0, 5);
    let mut b = harmonic_system(2, 2, 1.0, 5);
    velocity_verlet(&mut a, 0.05, 10);
    velocity_verlet(&mut b, 0.05, 10);

    let recorded = snapshot(10, &a);
    let mut replayed = snapshot(10, &b);
    let x = replayed.systems[0].p[7];
    replayed.systems[0].p[7] = f64::from_bits(x.to_bits() ^ 1);

    let report = compare_checkpoints(&recorded, &replayed).unwrap();
    assert_eq!(report.step, 10);
    assert_eq!(report.divergences.len(), 1);
    assert!(matches!(
        report.divergences[0],
        DivergenceKind::Array { system: 0, array: "p", index: 7, .. }
    ));
}

#[test]
fn different_seeds_diverge_immediately() {
    let a = harmonic_system(2, 2, 1.0, 1);
    let b = harmonic_system(2, 2, 1.0, 2);
    let report = compare_checkpoints(&snapshot(0, &a), &snapshot(0, &b)).unwrap();
    assert!(report
        .divergences
        .iter()
        .any(|d| matches!(d, DivergenceKind::Array { array: "q", index: 0, .. })));
}

#[test]
fn truncated_stream_is_an_error() {
    let mut sys = harmonic_system(2, 2, 1.0, 13);
    let mut bytes = record(&mut sys, 2);
    bytes.truncate(bytes.len() - 5);

    let mut reader = TrajectoryReader::open(Cursor::new(bytes)).unwrap();
    let mut result = reader.next_frame();
    while let Ok(Some(_)) = result {
        result = reader.next_frame();
    }
    assert!(result.is_err());
}
