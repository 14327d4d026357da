//! Replay: drive the positions from a recorded trajectory.
//!
//! Each step consumes one frame per bead. Momenta are never touched, so the
//! ensemble is only useful for re-evaluating properties along an existing
//! path. A checkpoint frame ends the replay after restoring the positions and
//! cell of the first system it holds.

use tracing::{debug, info};
use trotter_core::System;
use trotter_replay::{Frame, TrajectorySource};

use crate::error::StepError;
use crate::StepOutcome;

pub(crate) struct ReplayState {
    source: Box<dyn TrajectorySource>,
    /// Frame sets consumed so far.
    rstep: u64,
    /// Frame sets to skip before the next step takes effect.
    catch_up: u64,
    finished: Option<StepOutcome>,
}

impl ReplayState {
    pub(crate) fn new(source: Box<dyn TrajectorySource>) -> Self {
        Self {
            source,
            rstep: 0,
            catch_up: 0,
            finished: None,
        }
    }

    pub(crate) fn frames_consumed(&self) -> u64 {
        self.rstep
    }

    /// Skip forward so the next step applies frame set `target + 1`.
    pub(crate) fn fast_forward(&mut self, target: u64) {
        self.catch_up = target;
    }

    pub(crate) fn step(&mut self, sys: &mut System) -> Result<StepOutcome, StepError> {
        if let Some(outcome) = self.finished {
            return Ok(outcome);
        }
        if self.catch_up > self.rstep {
            debug!(from = self.rstep, to = self.catch_up, "replay catching up");
        }
        loop {
            match self.read_set(sys)? {
                StepOutcome::Continue => {}
                outcome => {
                    info!(frames = self.rstep, ?outcome, "replay terminated");
                    self.finished = Some(outcome);
                    return Ok(outcome);
                }
            }
            self.rstep += 1;
            if self.rstep > self.catch_up {
                return Ok(StepOutcome::Continue);
            }
        }
    }

    /// Read one frame per bead, then apply them. A set cut short by the end
    /// of the stream leaves `sys` untouched.
    fn read_set(&mut self, sys: &mut System) -> Result<StepOutcome, StepError> {
        let nbeads = sys.beads.nbeads();
        let ndof = sys.beads.ndof();
        let mut set = Vec::with_capacity(nbeads);
        while set.len() < nbeads {
            let bead = set.len();
            let Some(frame) = self.source.next_frame()? else {
                if bead > 0 {
                    debug!(bead, nbeads, "trajectory ended inside a frame set");
                }
                return Ok(StepOutcome::Exhausted);
            };
            match frame {
                Frame::Checkpoint(chk) if bead == 0 => {
                    let Some(snap) = chk.systems.first() else {
                        return Err(StepError::FrameShape {
                            what: "checkpoint systems",
                            expected: 1,
                            found: 0,
                        });
                    };
                    check_len("checkpoint positions", sys.beads.q().len(), snap.q.len())?;
                    sys.beads.q_mut().copy_from_slice(&snap.q);
                    sys.cell.set_h(snap.cell);
                    return Ok(StepOutcome::Finished);
                }
                Frame::Checkpoint(_) => return Err(StepError::UnexpectedCheckpoint { bead }),
                positions => {
                    check_len("positions", ndof, positions_len(&positions))?;
                    set.push(positions);
                }
            }
        }

        for (bead, frame) in set.into_iter().enumerate() {
            let (unit, q, cell) = match frame {
                Frame::Positions { unit, q } => (unit, q, None),
                Frame::PositionsWithCell { unit, q, cell } => (unit, q, Some(cell)),
                Frame::Checkpoint(_) => continue,
            };
            let factor = unit.to_internal();
            for (dst, src) in sys.beads.bead_q_mut(bead).iter_mut().zip(&q) {
                *dst = src * factor;
            }
            if let Some(mut h) = cell {
                for x in h.iter_mut().flatten() {
                    *x *= factor;
                }
                sys.cell.set_h(h);
            }
        }
        Ok(StepOutcome::Continue)
    }
}

fn positions_len(frame: &Frame) -> usize {
    match frame {
        Frame::Positions { q, .. } | Frame::PositionsWithCell { q, .. } => q.len(),
        Frame::Checkpoint(_) => 0,
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), StepError> {
    if expected != found {
        return Err(StepError::FrameShape {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
