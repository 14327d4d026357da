//! Outputs the driver feeds after every committed step.

use std::io::{self, Write};

use trotter_core::LengthUnit;
use trotter_replay::{BuildMetadata, TrajectoryWriter};

use crate::error::OutputError;
use crate::simulation::BoundSystem;

/// A sink for per-step results.
///
/// Outputs see the systems only between steps, after the step has been
/// committed.
pub trait Output: Send {
    /// Name used in errors and logs.
    fn name(&self) -> &str;

    /// Record the state after `step` steps.
    fn write(&mut self, step: u64, systems: &mut [BoundSystem]) -> Result<(), OutputError>;

    /// Flush buffered data. Called once when the run ends.
    fn finish(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Whitespace-separated property table: step, system, conserved quantity,
/// kinetic and potential energy.
pub struct PropertyLog<W: Write + Send> {
    out: W,
    stride: u64,
    header_written: bool,
}

impl<W: Write + Send> PropertyLog<W> {
    /// Log every step to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            stride: 1,
            header_written: false,
        }
    }

    /// Only log steps that are multiples of `stride` (minimum 1).
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Output for PropertyLog<W> {
    fn name(&self) -> &str {
        "properties"
    }

    fn write(&mut self, step: u64, systems: &mut [BoundSystem]) -> Result<(), OutputError> {
        if step % self.stride != 0 {
            return Ok(());
        }
        if !self.header_written {
            writeln!(self.out, "# step system econs kinetic potential")?;
            self.header_written = true;
        }
        for (i, bound) in systems.iter_mut().enumerate() {
            let parts = bound.ensemble.econs_parts(&mut bound.system)?;
            writeln!(
                self.out,
                "{step} {i} {:.16e} {:.16e} {:.16e}",
                parts.total(),
                parts.kinetic,
                parts.pot
            )?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Positions and cell of one system, one frame per bead, in the format the
/// replay ensemble reads.
pub struct TrajectoryOutput<W: Write + Send> {
    writer: TrajectoryWriter<W>,
    system: usize,
    unit: LengthUnit,
    stride: u64,
}

impl<W: Write + Send> TrajectoryOutput<W> {
    /// Write the stream header and prepare to record `system` in `unit`.
    pub fn new(
        out: W,
        metadata: &BuildMetadata,
        system: usize,
        unit: LengthUnit,
    ) -> Result<Self, OutputError> {
        Ok(Self {
            writer: TrajectoryWriter::new(out, metadata)?,
            system,
            unit,
            stride: 1,
        })
    }

    /// Only record steps that are multiples of `stride` (minimum 1).
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.writer.frames_written()
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Output for TrajectoryOutput<W> {
    fn name(&self) -> &str {
        "trajectory"
    }

    fn write(&mut self, step: u64, systems: &mut [BoundSystem]) -> Result<(), OutputError> {
        if step % self.stride != 0 {
            return Ok(());
        }
        let Some(bound) = systems.get(self.system) else {
            return Err(OutputError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no system {} to record", self.system),
            )));
        };
        self.writer
            .write_beads(self.unit, &bound.system.beads, &bound.system.cell)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}
