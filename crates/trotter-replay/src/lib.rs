//! Trajectory and checkpoint I/O for trotter simulations.
//!
//! Provides a binary stream format carrying replica coordinates (with or
//! without the box) and full restart checkpoints, a [`TrajectorySource`]
//! abstraction consumed by the replay ensemble, and hash-first checkpoint
//! comparison for verifying bit-identical resumes.
//!
//! # Architecture
//!
//! - [`TrajectoryWriter`] records frames to any `Write` sink
//! - [`TrajectoryReader`] plays back frames from any `Read` source
//! - [`compare_checkpoints`] and [`checkpoint_hash`] verify determinism
//! - All I/O uses a custom binary codec (no serde dependency)
//!
//! # Format
//!
//! ```text
//! [MAGIC "TRTR"] [VERSION u8] [BuildMetadata]
//! [Frame 1] [Frame 2] ... [Frame N]
//! ```
//!
//! Each frame starts with a one-byte tag: per-replica positions,
//! positions plus cell, or a checkpoint.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod compare;
pub mod error;
pub mod hash;
pub mod reader;
pub mod types;
pub mod writer;

pub use compare::{compare_checkpoints, DivergenceKind, DivergenceReport};
pub use error::ReplayError;
pub use hash::{checkpoint_hash, system_hash};
pub use reader::{TrajectoryReader, TrajectorySource};
pub use types::{BuildMetadata, Checkpoint, EnsembleLedger, Frame, SystemSnapshot};
pub use writer::TrajectoryWriter;

/// Magic bytes at the start of every trajectory stream.
pub const MAGIC: [u8; 4] = *b"TRTR";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
