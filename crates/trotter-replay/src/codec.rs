//! Binary encode/decode for the trajectory format.
//!
//! All integers and floats are little-endian. Strings are length-prefixed
//! with a `u32` length; `f64` arrays with a `u32` element count. The format
//! is intentionally simple: no compression, no alignment padding, no
//! self-describing schema.

use std::io::{Read, Write};

use trotter_core::{BarostatState, LengthUnit, Matrix3, ThermostatState};

use crate::error::ReplayError;
use crate::types::*;
use crate::{FORMAT_VERSION, MAGIC};

/// Upper bound on pre-allocation when decoding arrays from untrusted input.
const MAX_PREALLOC: usize = 1 << 16;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), ReplayError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u128.
pub fn write_u128_le(w: &mut dyn Write, v: u128) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), ReplayError> {
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Write a count-prefixed `f64` array (u32 count + values).
pub fn write_f64_slice(w: &mut dyn Write, v: &[f64]) -> Result<(), ReplayError> {
    write_u32_le(w, v.len() as u32)?;
    for &x in v {
        write_f64_le(w, x)?;
    }
    Ok(())
}

/// Write a 3×3 matrix row by row.
pub fn write_matrix3(w: &mut dyn Write, m: &Matrix3) -> Result<(), ReplayError> {
    for row in m {
        for &x in row {
            write_f64_le(w, x)?;
        }
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, ReplayError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, ReplayError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, ReplayError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian u128.
pub fn read_u128_le(r: &mut dyn Read) -> Result<u128, ReplayError> {
    let mut buf = [0u8; 16];
    r.read_exact(&mut buf)?;
    Ok(u128::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, ReplayError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, ReplayError> {
    let len = read_u32_le(r)? as usize;
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    (&mut *r).take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(ReplayError::MalformedFrame {
            detail: format!("truncated string: got {} of {len} bytes", buf.len()),
        });
    }
    String::from_utf8(buf).map_err(|e| ReplayError::MalformedFrame {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

/// Read a count-prefixed `f64` array.
pub fn read_f64_slice(r: &mut dyn Read) -> Result<Vec<f64>, ReplayError> {
    let len = read_u32_le(r)? as usize;
    let mut out = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        out.push(read_f64_le(r)?);
    }
    Ok(out)
}

/// Read a 3×3 matrix row by row.
pub fn read_matrix3(r: &mut dyn Read) -> Result<Matrix3, ReplayError> {
    let mut m = [[0.0; 3]; 3];
    for row in m.iter_mut() {
        for x in row.iter_mut() {
            *x = read_f64_le(r)?;
        }
    }
    Ok(m)
}

fn read_unit(r: &mut dyn Read) -> Result<LengthUnit, ReplayError> {
    let tag = read_u8(r)?;
    LengthUnit::from_tag(tag).ok_or(ReplayError::UnknownUnit { tag })
}

fn read_presence(r: &mut dyn Read, what: &str) -> Result<bool, ReplayError> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        flag => Err(ReplayError::MalformedFrame {
            detail: format!("invalid {what} presence flag: {flag}"),
        }),
    }
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the stream header (magic, version, build metadata).
pub fn encode_header(w: &mut dyn Write, meta: &BuildMetadata) -> Result<(), ReplayError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_length_prefixed_str(w, &meta.trotter_version)?;
    write_length_prefixed_str(w, &meta.label)?;
    Ok(())
}

/// Decode and validate the stream header.
pub fn decode_header(r: &mut dyn Read) -> Result<BuildMetadata, ReplayError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(ReplayError::InvalidMagic);
    }

    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(ReplayError::UnsupportedVersion { found: version });
    }

    Ok(BuildMetadata {
        trotter_version: read_length_prefixed_str(r)?,
        label: read_length_prefixed_str(r)?,
    })
}

// ── Frame encode/decode ─────────────────────────────────────────

/// Encode a single frame.
pub fn encode_frame(w: &mut dyn Write, frame: &Frame) -> Result<(), ReplayError> {
    match frame {
        Frame::Positions { unit, q } => {
            write_u8(w, FRAME_POSITIONS)?;
            write_u8(w, unit.tag())?;
            write_f64_slice(w, q)?;
        }
        Frame::PositionsWithCell { unit, q, cell } => {
            write_u8(w, FRAME_POSITIONS_WITH_CELL)?;
            write_u8(w, unit.tag())?;
            write_f64_slice(w, q)?;
            write_matrix3(w, cell)?;
        }
        Frame::Checkpoint(chk) => {
            write_u8(w, FRAME_CHECKPOINT)?;
            encode_checkpoint(w, chk)?;
        }
    }
    Ok(())
}

/// Decode a single frame.
///
/// Returns `Ok(None)` on clean EOF (no bytes available before the tag),
/// `Ok(Some(frame))` on success, or an error on truncated/corrupt data.
pub fn decode_frame(r: &mut dyn Read) -> Result<Option<Frame>, ReplayError> {
    let mut tag = [0u8; 1];
    loop {
        match r.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReplayError::Io(e)),
        }
    }
    let frame = match tag[0] {
        FRAME_POSITIONS => Frame::Positions {
            unit: read_unit(r)?,
            q: read_f64_slice(r)?,
        },
        FRAME_POSITIONS_WITH_CELL => Frame::PositionsWithCell {
            unit: read_unit(r)?,
            q: read_f64_slice(r)?,
            cell: read_matrix3(r)?,
        },
        FRAME_CHECKPOINT => Frame::Checkpoint(Box::new(decode_checkpoint(r)?)),
        tag => return Err(ReplayError::UnknownFrameTag { tag }),
    };
    Ok(Some(frame))
}

// ── Checkpoint encode/decode ────────────────────────────────────

fn encode_thermostat(w: &mut dyn Write, s: &ThermostatState) -> Result<(), ReplayError> {
    write_f64_le(w, s.ethermo)?;
    write_u128_le(w, s.rng_word_pos)
}

fn decode_thermostat(r: &mut dyn Read) -> Result<ThermostatState, ReplayError> {
    Ok(ThermostatState {
        ethermo: read_f64_le(r)?,
        rng_word_pos: read_u128_le(r)?,
    })
}

fn encode_ledger(w: &mut dyn Write, ledger: &EnsembleLedger) -> Result<(), ReplayError> {
    write_f64_le(w, ledger.eens)?;
    match &ledger.thermostat {
        Some(t) => {
            write_u8(w, 1)?;
            encode_thermostat(w, t)?;
        }
        None => write_u8(w, 0)?,
    }
    match &ledger.barostat {
        Some(b) => {
            write_u8(w, 1)?;
            write_f64_slice(w, &b.momentum)?;
            encode_thermostat(w, &b.thermostat)?;
        }
        None => write_u8(w, 0)?,
    }
    write_u64_le(w, ledger.replay_frames)
}

fn decode_ledger(r: &mut dyn Read) -> Result<EnsembleLedger, ReplayError> {
    let eens = read_f64_le(r)?;
    let thermostat = if read_presence(r, "thermostat")? {
        Some(decode_thermostat(r)?)
    } else {
        None
    };
    let barostat = if read_presence(r, "barostat")? {
        Some(BarostatState {
            momentum: read_f64_slice(r)?,
            thermostat: decode_thermostat(r)?,
        })
    } else {
        None
    };
    Ok(EnsembleLedger {
        eens,
        thermostat,
        barostat,
        replay_frames: read_u64_le(r)?,
    })
}

/// Encode a checkpoint body (no frame tag).
pub fn encode_checkpoint(w: &mut dyn Write, chk: &Checkpoint) -> Result<(), ReplayError> {
    write_u64_le(w, chk.step)?;
    write_u32_le(w, chk.systems.len() as u32)?;
    for sys in &chk.systems {
        write_u32_le(w, sys.nbeads)?;
        write_f64_slice(w, &sys.masses)?;
        write_f64_slice(w, &sys.q)?;
        write_f64_slice(w, &sys.p)?;
        write_matrix3(w, &sys.cell)?;
        encode_ledger(w, &sys.ledger)?;
    }
    Ok(())
}

/// Decode a checkpoint body (no frame tag).
pub fn decode_checkpoint(r: &mut dyn Read) -> Result<Checkpoint, ReplayError> {
    let step = read_u64_le(r)?;
    let count = read_u32_le(r)? as usize;
    let mut systems = Vec::with_capacity(count.min(MAX_PREALLOC));
    for system in 0..count {
        let nbeads = read_u32_le(r)?;
        let masses = read_f64_slice(r)?;
        let q = read_f64_slice(r)?;
        let p = read_f64_slice(r)?;
        let expected = nbeads as usize * masses.len() * 3;
        if q.len() != expected || p.len() != expected {
            return Err(ReplayError::InconsistentSnapshot {
                system,
                expected,
                q: q.len(),
                p: p.len(),
            });
        }
        systems.push(SystemSnapshot {
            nbeads,
            masses,
            q,
            p,
            cell: read_matrix3(r)?,
            ledger: decode_ledger(r)?,
        });
    }
    Ok(Checkpoint { step, systems })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_checkpoint() -> Checkpoint {
        Checkpoint {
            step: 17,
            systems: vec![SystemSnapshot {
                nbeads: 2,
                masses: vec![1.5],
                q: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
                p: vec![-1.0, 0.0, 1.0, 2.0, -2.0, 0.25],
                cell: [[10.0, 0.5, 0.0], [0.0, 11.0, 0.0], [0.0, 0.0, 12.0]],
                ledger: EnsembleLedger {
                    eens: 0.125,
                    thermostat: Some(ThermostatState {
                        ethermo: -3.5,
                        rng_word_pos: (1u128 << 70) + 9,
                    }),
                    barostat: Some(BarostatState {
                        momentum: vec![0.75],
                        thermostat: ThermostatState::default(),
                    }),
                    replay_frames: 0,
                },
            }],
        }
    }

    #[test]
    fn header_roundtrip() {
        let meta = BuildMetadata::current("header");
        let mut buf = Vec::new();
        encode_header(&mut buf, &meta).unwrap();
        assert_eq!(&buf[..4], b"TRTR");
        assert_eq!(decode_header(&mut buf.as_slice()).unwrap(), meta);
    }

    #[test]
    fn checkpoint_frame_roundtrip_is_bit_exact() {
        let frame = Frame::Checkpoint(Box::new(sample_checkpoint()));
        let mut buf = Vec::new();
        encode_frame(&mut buf, &frame).unwrap();
        let decoded = decode_frame(&mut buf.as_slice()).unwrap().unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn clean_eof_is_none() {
        let mut empty: &[u8] = &[];
        assert!(decode_frame(&mut empty).unwrap().is_none());
    }

    #[test]
    fn truncated_frame_is_error() {
        let frame = Frame::Positions {
            unit: LengthUnit::Angstrom,
            q: vec![1.0, 2.0, 3.0],
        };
        let mut buf = Vec::new();
        encode_frame(&mut buf, &frame).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            decode_frame(&mut buf.as_slice()),
            Err(ReplayError::Io(_))
        ));
    }

    #[test]
    fn unknown_tags_rejected() {
        let mut bad_frame: &[u8] = &[9];
        assert!(matches!(
            decode_frame(&mut bad_frame),
            Err(ReplayError::UnknownFrameTag { tag: 9 })
        ));
        let mut bad_unit: &[u8] = &[FRAME_POSITIONS, 42];
        assert!(matches!(
            decode_frame(&mut bad_unit),
            Err(ReplayError::UnknownUnit { tag: 42 })
        ));
    }

    #[test]
    fn inconsistent_checkpoint_shape_rejected() {
        let mut chk = sample_checkpoint();
        chk.systems[0].q.pop();
        let mut buf = Vec::new();
        encode_checkpoint(&mut buf, &chk).unwrap();
        assert!(matches!(
            decode_checkpoint(&mut buf.as_slice()),
            Err(ReplayError::InconsistentSnapshot { system: 0, .. })
        ));
    }

    #[test]
    fn bad_presence_flag_rejected() {
        let chk = Checkpoint {
            step: 0,
            systems: vec![SystemSnapshot {
                nbeads: 1,
                masses: vec![1.0],
                q: vec![0.0; 3],
                p: vec![0.0; 3],
                cell: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                ledger: EnsembleLedger::default(),
            }],
        };
        let mut buf = Vec::new();
        encode_checkpoint(&mut buf, &chk).unwrap();
        // Ledger starts after step, count, nbeads, three arrays and the cell.
        let flag_at = 8 + 4 + 4 + (4 + 8) + 2 * (4 + 24) + 72 + 8;
        buf[flag_at] = 7;
        assert!(matches!(
            decode_checkpoint(&mut buf.as_slice()),
            Err(ReplayError::InconsistentSnapshot { system: 0, .. })
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_unit() -> impl Strategy<Value = LengthUnit> {
            prop_oneof![
                Just(LengthUnit::AtomicUnit),
                Just(LengthUnit::Angstrom),
                Just(LengthUnit::Nanometer),
            ]
        }

        fn bits(v: &[f64]) -> Vec<u64> {
            v.iter().map(|x| x.to_bits()).collect()
        }

        proptest! {
            #[test]
            fn any_f64_survives_a_positions_frame(
                unit in arb_unit(),
                q in prop::collection::vec(any::<f64>(), 0..64),
            ) {
                let mut buf = Vec::new();
                encode_frame(&mut buf, &Frame::Positions { unit, q: q.clone() }).unwrap();
                match decode_frame(&mut buf.as_slice()).unwrap() {
                    Some(Frame::Positions { unit: u, q: got }) => {
                        prop_assert_eq!(u, unit);
                        prop_assert_eq!(bits(&got), bits(&q));
                    }
                    other => prop_assert!(false, "unexpected frame {:?}", other),
                }
            }

            #[test]
            fn cell_frames_decode_back_to_back(
                cells in prop::collection::vec(prop::array::uniform9(-50.0f64..50.0), 1..5),
            ) {
                let mut buf = Vec::new();
                for c in &cells {
                    let cell = [[c[0], c[1], c[2]], [c[3], c[4], c[5]], [c[6], c[7], c[8]]];
                    let frame = Frame::PositionsWithCell {
                        unit: LengthUnit::Angstrom,
                        q: c.to_vec(),
                        cell,
                    };
                    encode_frame(&mut buf, &frame).unwrap();
                }
                let mut r = buf.as_slice();
                let mut n = 0;
                while let Some(frame) = decode_frame(&mut r).unwrap() {
                    let Frame::PositionsWithCell { cell, q, .. } = frame else {
                        return Err(TestCaseError::fail("wrong frame kind"));
                    };
                    prop_assert_eq!(cell[1][2], cells[n][5]);
                    prop_assert_eq!(q, cells[n].to_vec());
                    n += 1;
                }
                prop_assert_eq!(n, cells.len());
            }
        }
    }
}
