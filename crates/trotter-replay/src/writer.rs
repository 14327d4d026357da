//! Recording trajectory streams.
//!
//! [`TrajectoryWriter`] writes the header as soon as it is created, then
//! appends frames. Coordinates are handed over in bohr and converted to
//! the unit the frame is tagged with.

use std::io::Write;

use trotter_core::{Beads, Cell, LengthUnit, Matrix3};

use crate::codec::{encode_checkpoint, encode_frame, encode_header, write_u8};
use crate::error::ReplayError;
use crate::types::{BuildMetadata, Checkpoint, Frame, FRAME_CHECKPOINT};

/// Appends frames to a byte sink.
///
/// # Examples
///
/// ```
/// use trotter_core::LengthUnit;
/// use trotter_replay::{BuildMetadata, Frame, TrajectoryReader, TrajectoryWriter};
///
/// let mut buf = Vec::new();
/// let mut writer = TrajectoryWriter::new(&mut buf, &BuildMetadata::current("doc")).unwrap();
/// writer.write_positions(LengthUnit::Angstrom, &[1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(writer.frames_written(), 1);
/// drop(writer);
///
/// let mut reader = TrajectoryReader::open(buf.as_slice()).unwrap();
/// let frame = reader.next_frame().unwrap().unwrap();
/// assert!(matches!(frame, Frame::Positions { unit: LengthUnit::Angstrom, .. }));
/// assert!(reader.next_frame().unwrap().is_none());
/// ```
pub struct TrajectoryWriter<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> TrajectoryWriter<W> {
    /// Write the header and return a writer positioned at the first frame.
    pub fn new(mut writer: W, metadata: &BuildMetadata) -> Result<Self, ReplayError> {
        encode_header(&mut writer, metadata)?;
        Ok(Self {
            writer,
            frames_written: 0,
        })
    }

    /// Append a frame exactly as given.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), ReplayError> {
        encode_frame(&mut self.writer, frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// One replica's positions, already expressed in `unit`.
    pub fn write_positions(&mut self, unit: LengthUnit, q: &[f64]) -> Result<(), ReplayError> {
        self.write_frame(&Frame::Positions {
            unit,
            q: q.to_vec(),
        })
    }

    /// One replica's positions and the box, already expressed in `unit`.
    pub fn write_positions_with_cell(
        &mut self,
        unit: LengthUnit,
        q: &[f64],
        cell: &Cell,
    ) -> Result<(), ReplayError> {
        self.write_frame(&Frame::PositionsWithCell {
            unit,
            q: q.to_vec(),
            cell: *cell.h(),
        })
    }

    /// Every replica of `beads` with the box, converted from bohr to `unit`.
    ///
    /// Writes one frame per bead, which is what the replay ensemble reads
    /// per step. Returns the number of frames written.
    pub fn write_beads(
        &mut self,
        unit: LengthUnit,
        beads: &Beads,
        cell: &Cell,
    ) -> Result<u64, ReplayError> {
        let factor = unit.to_internal();
        let mut h: Matrix3 = *cell.h();
        for x in h.iter_mut().flatten() {
            *x /= factor;
        }
        for b in 0..beads.nbeads() {
            let q = beads.bead_q(b).iter().map(|x| x / factor).collect();
            self.write_frame(&Frame::PositionsWithCell { unit, q, cell: h })?;
        }
        Ok(beads.nbeads() as u64)
    }

    /// Append a restart state.
    pub fn write_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), ReplayError> {
        write_u8(&mut self.writer, FRAME_CHECKPOINT)?;
        encode_checkpoint(&mut self.writer, checkpoint)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Frames appended since the header.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TrajectoryReader;

    #[test]
    fn beads_are_written_one_frame_per_replica_in_the_requested_unit() {
        let beads = Beads::from_parts(2, vec![1.0], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0.0; 6])
            .unwrap();
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let mut writer = TrajectoryWriter::new(Vec::new(), &BuildMetadata::current("beads")).unwrap();
        assert_eq!(writer.write_beads(LengthUnit::Angstrom, &beads, &cell).unwrap(), 2);
        assert_eq!(writer.frames_written(), 2);

        let bytes = writer.into_inner();
        let mut reader = TrajectoryReader::open(bytes.as_slice()).unwrap();
        let factor = LengthUnit::Angstrom.to_internal();
        for bead in 0..2 {
            let Some(Frame::PositionsWithCell { unit, q, cell: h }) = reader.next_frame().unwrap()
            else {
                panic!("expected a positions+cell frame");
            };
            assert_eq!(unit, LengthUnit::Angstrom);
            for (got, want) in q.iter().zip(beads.bead_q(bead)) {
                assert!((got * factor - want).abs() < 1e-12);
            }
            assert!((h[0][0] * factor - 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn atomic_units_are_written_unchanged() {
        let beads = Beads::from_parts(1, vec![1.0], vec![0.1, 0.2, 0.3], vec![0.0; 3]).unwrap();
        let cell = Cell::orthorhombic(3.0, 4.0, 5.0).unwrap();
        let mut writer = TrajectoryWriter::new(Vec::new(), &BuildMetadata::current("au")).unwrap();
        writer.write_beads(LengthUnit::AtomicUnit, &beads, &cell).unwrap();
        let bytes = writer.into_inner();
        let frame = TrajectoryReader::open(bytes.as_slice())
            .unwrap()
            .next_frame()
            .unwrap()
            .unwrap();
        assert_eq!(
            frame,
            Frame::PositionsWithCell {
                unit: LengthUnit::AtomicUnit,
                q: vec![0.1, 0.2, 0.3],
                cell: *cell.h(),
            }
        );
    }
}
