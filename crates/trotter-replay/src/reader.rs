//! Reading trajectory streams back.
//!
//! [`TrajectoryReader`] validates the stream header when it is opened and
//! then hands out frames one at a time. Position frames and checkpoint
//! frames are counted separately so a consumer can tell how many replica
//! configurations it has applied.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::codec::{decode_frame, decode_header};
use crate::error::ReplayError;
use crate::types::{BuildMetadata, Checkpoint, Frame};

/// Where the replay ensemble gets its frames from.
///
/// `Ok(None)` is a clean end of stream; any error means the source can no
/// longer be trusted.
pub trait TrajectorySource: Send {
    /// Next frame in stream order.
    fn next_frame(&mut self) -> Result<Option<Frame>, ReplayError>;
}

/// Decodes a trajectory from any byte source.
pub struct TrajectoryReader<R: Read> {
    reader: R,
    metadata: BuildMetadata,
    positions: u64,
    checkpoints: u64,
    done: bool,
}

impl<R: Read> TrajectoryReader<R> {
    /// Read and check the header. Fails on a wrong magic or version.
    pub fn open(mut reader: R) -> Result<Self, ReplayError> {
        let metadata = decode_header(&mut reader)?;
        Ok(Self {
            reader,
            metadata,
            positions: 0,
            checkpoints: 0,
            done: false,
        })
    }

    /// Header of the stream.
    pub fn metadata(&self) -> &BuildMetadata {
        &self.metadata
    }

    /// Decode one frame. After the end of the stream or an error, every
    /// further call returns `Ok(None)`.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ReplayError> {
        if self.done {
            return Ok(None);
        }
        let frame = match decode_frame(&mut self.reader) {
            Ok(frame) => frame,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        match &frame {
            Some(Frame::Checkpoint(_)) => self.checkpoints += 1,
            Some(_) => self.positions += 1,
            None => self.done = true,
        }
        Ok(frame)
    }

    /// Skip position frames up to and including the next checkpoint.
    pub fn next_checkpoint(&mut self) -> Result<Option<Checkpoint>, ReplayError> {
        while let Some(frame) = self.next_frame()? {
            if let Frame::Checkpoint(chk) = frame {
                return Ok(Some(*chk));
            }
        }
        Ok(None)
    }

    /// Frames of either kind decoded so far.
    pub fn frames_read(&self) -> u64 {
        self.positions + self.checkpoints
    }

    /// Position frames (with or without a cell) decoded so far.
    pub fn position_frames_read(&self) -> u64 {
        self.positions
    }

    /// Checkpoint frames decoded so far.
    pub fn checkpoints_read(&self) -> u64 {
        self.checkpoints
    }
}

impl TrajectoryReader<BufReader<File>> {
    /// Open a trajectory file through a buffered reader.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        Self::open(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Send> TrajectorySource for TrajectoryReader<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, ReplayError> {
        TrajectoryReader::next_frame(self)
    }
}

impl<R: Read> Iterator for TrajectoryReader<R> {
    type Item = Result<Frame, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnsembleLedger, SystemSnapshot};
    use crate::writer::TrajectoryWriter;
    use trotter_core::LengthUnit;

    fn bead(x: f64) -> Frame {
        Frame::Positions {
            unit: LengthUnit::Angstrom,
            q: vec![x, -x, 0.5 * x],
        }
    }

    fn checkpoint(step: u64) -> Checkpoint {
        Checkpoint {
            step,
            systems: vec![SystemSnapshot {
                nbeads: 1,
                masses: vec![1.0],
                q: vec![0.0; 3],
                p: vec![0.0; 3],
                cell: [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]],
                ledger: EnsembleLedger::default(),
            }],
        }
    }

    fn stream(frames: &[Frame]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = TrajectoryWriter::new(&mut buf, &BuildMetadata::current("reader")).unwrap();
        for f in frames {
            writer.write_frame(f).unwrap();
        }
        drop(writer);
        buf
    }

    #[test]
    fn frames_come_back_in_order() {
        let buf = stream(&[bead(1.0), bead(2.0), bead(3.0)]);
        let mut reader = TrajectoryReader::open(buf.as_slice()).unwrap();
        assert_eq!(reader.metadata().label, "reader");
        for x in [1.0, 2.0, 3.0] {
            assert_eq!(reader.next_frame().unwrap(), Some(bead(x)));
        }
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.position_frames_read(), 3);
        assert_eq!(reader.checkpoints_read(), 0);
    }

    #[test]
    fn next_checkpoint_skips_positions() {
        let buf = stream(&[
            bead(1.0),
            bead(2.0),
            Frame::Checkpoint(Box::new(checkpoint(40))),
            bead(3.0),
        ]);
        let mut reader = TrajectoryReader::open(buf.as_slice()).unwrap();
        let chk = reader.next_checkpoint().unwrap().unwrap();
        assert_eq!(chk.step, 40);
        assert_eq!(reader.frames_read(), 3);
        assert!(reader.next_checkpoint().unwrap().is_none());
        assert_eq!(reader.position_frames_read(), 3);
    }

    #[test]
    fn iterator_collects_every_frame() {
        let buf = stream(&[bead(0.0), Frame::Checkpoint(Box::new(checkpoint(1)))]);
        let reader = TrajectoryReader::open(buf.as_slice()).unwrap();
        let frames = reader.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[1], Frame::Checkpoint(_)));
    }

    #[test]
    fn error_ends_the_stream() {
        let mut buf = stream(&[bead(1.0)]);
        buf.truncate(buf.len() - 4);
        let mut reader = TrajectoryReader::open(buf.as_slice()).unwrap();
        assert!(reader.next_frame().is_err());
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 0);
    }

    #[test]
    fn foreign_magic_is_rejected() {
        let data = b"XYZ \x01trailing";
        let result = TrajectoryReader::open(data.as_slice());
        assert!(matches!(result, Err(ReplayError::InvalidMagic)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = TrajectoryReader::open_path("/nonexistent/trotter/traj.bin");
        assert!(matches!(result, Err(ReplayError::Io(_))));
    }
}
