//! Errors raised while encoding or decoding trajectory streams.

use std::fmt;
use std::io;

/// Failure to write or read a trajectory or checkpoint stream.
///
/// A clean end of stream is `Ok(None)` from the readers and never shows up
/// here. Every variant means the stream cannot be used past this point.
#[derive(Debug)]
pub enum ReplayError {
    /// The underlying reader or writer failed.
    Io(io::Error),
    /// The first four bytes are not `b"TRTR"`.
    InvalidMagic,
    /// The stream was written by an incompatible format version.
    UnsupportedVersion {
        /// Version byte in the header.
        found: u8,
    },
    /// A frame ended early or carries an impossible length.
    MalformedFrame {
        /// What the decoder tripped over.
        detail: String,
    },
    /// A frame starts with a tag this build does not know.
    UnknownFrameTag {
        /// The tag byte.
        tag: u8,
    },
    /// A position frame names a length unit this build does not know.
    UnknownUnit {
        /// The unit byte.
        tag: u8,
    },
    /// A checkpoint system whose arrays disagree with its bead and atom
    /// counts.
    InconsistentSnapshot {
        /// Index of the system within the checkpoint.
        system: usize,
        /// `3 · nbeads · natoms`.
        expected: usize,
        /// Length of the stored positions.
        q: usize,
        /// Length of the stored momenta.
        p: usize,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "trajectory I/O failed: {e}"),
            Self::InvalidMagic => write!(f, "not a trotter trajectory (bad magic)"),
            Self::UnsupportedVersion { found } => {
                write!(f, "trajectory format version {found} is not supported")
            }
            Self::MalformedFrame { detail } => write!(f, "malformed frame: {detail}"),
            Self::UnknownFrameTag { tag } => write!(f, "unknown frame tag {tag}"),
            Self::UnknownUnit { tag } => write!(f, "unknown length unit tag {tag}"),
            Self::InconsistentSnapshot {
                system,
                expected,
                q,
                p,
            } => write!(
                f,
                "checkpoint system {system}: expected {expected} coordinates, found q={q} p={p}"
            ),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_errors_chain_their_source() {
        let err = ReplayError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
        assert!(err.to_string().contains("short read"));
        assert!(err.source().is_some());
    }

    #[test]
    fn snapshot_mismatch_names_the_system() {
        let err = ReplayError::InconsistentSnapshot {
            system: 2,
            expected: 12,
            q: 12,
            p: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("system 2"));
        assert!(msg.contains("p=9"));
        assert!(err.source().is_none());
    }
}
