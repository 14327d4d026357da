//! The bound ensemble and its step schedules.
//!
//! Every ensemble is a symmetric Trotter splitting around the NVE core
//!
//! ```text
//! pstep(dt/2) → constrain → qcstep(dt) + free_qstep(dt) → pstep(dt/2) → constrain
//! ```
//!
//! with thermostat half-steps outside it (NVT), a barostat replacing the
//! momentum and centroid steps (NPT/NST), or the kick/drift core replaced by
//! a compiled [`MtsSchedule`] (MTS). Energy the collaborators and the
//! constraints exchange with the system is tallied so that
//! [`Ensemble::econs`] stays constant along an exact trajectory.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::info;
use trotter_core::{
    Barostat, BarostatBinding, ConfigError, ForceError, PressureTarget, System, Thermostat,
    ThermostatBinding,
};
use trotter_replay::EnsembleLedger;

use crate::config::{EnsembleConfig, EnsembleMode};
use crate::constraints::MomentumConstraints;
use crate::error::StepError;
use crate::replay::ReplayState;
use crate::schedule::{MtsOp, MtsSchedule};

/// Result of a successful step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The system advanced; keep going.
    Continue,
    /// The replay source ran out of frames.
    Exhausted,
    /// The replay source ended with a checkpoint.
    Finished,
}

/// The ensemble flavour, for logging and dispatch by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnsembleKind {
    /// Constant energy.
    Nve,
    /// Constant temperature.
    Nvt,
    /// Constant pressure.
    Npt,
    /// Constant stress.
    Nst,
    /// Multiple time step.
    Mts,
    /// Trajectory replay.
    Replay,
}

impl fmt::Display for EnsembleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nve => "nve",
            Self::Nvt => "nvt",
            Self::Npt => "npt",
            Self::Nst => "nst",
            Self::Mts => "mts",
            Self::Replay => "replay",
        })
    }
}

/// Wall time spent in each phase of the last step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepTimings {
    /// Momentum steps, including force evaluation.
    pub ptime: Duration,
    /// Position steps.
    pub qtime: Duration,
    /// Thermostat steps.
    pub ttime: Duration,
}

/// The terms of the conserved quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EconsParts {
    /// Ring-polymer kinetic energy.
    pub kinetic: f64,
    /// Ring-polymer spring energy.
    pub spring: f64,
    /// Physical potential energy.
    pub pot: f64,
    /// Bias potential energy.
    pub bias: f64,
    /// Energy absorbed by the momentum constraints.
    pub eens: f64,
    /// Heat exchanged with the bead thermostat.
    pub ethermo: f64,
    /// Barostat energy.
    pub ebaro: f64,
}

impl EconsParts {
    /// The conserved quantity without collaborator terms.
    pub fn base(&self) -> f64 {
        self.spring + self.kinetic + self.pot + self.bias + self.eens
    }

    /// The full conserved quantity.
    pub fn total(&self) -> f64 {
        self.base() + self.ethermo + self.ebaro
    }
}

enum Variant {
    Nve,
    Nvt {
        thermostat: Box<dyn Thermostat>,
    },
    Barostatted {
        thermostat: Box<dyn Thermostat>,
        barostat: Box<dyn Barostat>,
        stress: bool,
    },
    Mts {
        thermostat: Box<dyn Thermostat>,
        schedule: MtsSchedule,
    },
    Replay(ReplayState),
}

/// State shared by every variant.
struct Core {
    dt: f64,
    temperature: f64,
    ntemp: f64,
    constraints: MomentumConstraints,
    eens: f64,
    timings: StepTimings,
}

/// An ensemble bound to one [`System`].
///
/// Created by [`Ensemble::bind`]; the same system must be passed to every
/// subsequent call.
pub struct Ensemble {
    core: Core,
    variant: Variant,
}

impl fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ensemble")
            .field("kind", &self.kind())
            .field("dt", &self.core.dt)
            .field("temperature", &self.core.temperature)
            .field("eens", &self.core.eens)
            .finish()
    }
}

impl Ensemble {
    /// Validate `config` against `sys`, bind the collaborators, and apply
    /// the constraints once so the initial state satisfies them.
    pub fn bind(config: EnsembleConfig, sys: &mut System) -> Result<Self, ConfigError> {
        config.validate(sys.beads.natoms())?;
        let EnsembleConfig {
            dt,
            temperature,
            fixcom,
            fixatoms,
            mode,
        } = config;

        let nbeads = sys.beads.nbeads();
        let ntemp = temperature * nbeads as f64;
        sys.nm.set_temperature(ntemp);

        let constraints = MomentumConstraints::new(fixcom, fixatoms);
        let fixdof = constraints.fixdof(nbeads);
        let tbind = ThermostatBinding {
            temperature: ntemp,
            dt,
            fixdof,
            ndof: sys.beads.q().len(),
        };
        let bbind = |target| BarostatBinding {
            temperature: ntemp,
            dt,
            target,
            fixdof,
        };

        let variant = match mode {
            EnsembleMode::Nve => Variant::Nve,
            EnsembleMode::Nvt { mut thermostat } => {
                thermostat.bind(&tbind)?;
                Variant::Nvt { thermostat }
            }
            EnsembleMode::Npt {
                mut thermostat,
                mut barostat,
                pressure,
            } => {
                thermostat.bind(&tbind)?;
                barostat.bind(&bbind(PressureTarget::Pressure(pressure)), sys)?;
                Variant::Barostatted {
                    thermostat,
                    barostat,
                    stress: false,
                }
            }
            EnsembleMode::Nst {
                mut thermostat,
                mut barostat,
                stress,
            } => {
                thermostat.bind(&tbind)?;
                barostat.bind(&bbind(PressureTarget::Stress(stress)), sys)?;
                Variant::Barostatted {
                    thermostat,
                    barostat,
                    stress: true,
                }
            }
            EnsembleMode::Mts {
                mut thermostat,
                factors,
            } => {
                let nlevels = sys.forces.nmts_levels();
                let schedule = match factors {
                    Some(f) => MtsSchedule::compile(dt, &f, nlevels)?,
                    None => MtsSchedule::uniform(dt, nlevels)?,
                };
                thermostat.bind(&tbind)?;
                Variant::Mts {
                    thermostat,
                    schedule,
                }
            }
            EnsembleMode::Replay { source } => {
                let source = source.ok_or(ConfigError::MissingTrajectory)?;
                Variant::Replay(ReplayState::new(source))
            }
        };

        let mut ensemble = Self {
            core: Core {
                dt,
                temperature,
                ntemp,
                constraints,
                eens: 0.0,
                timings: StepTimings::default(),
            },
            variant,
        };
        if !matches!(ensemble.variant, Variant::Replay(_)) {
            ensemble.core.constrain(sys);
        }
        info!(
            kind = %ensemble.kind(),
            dt,
            nbeads,
            ntemp,
            fixdof,
            "ensemble bound"
        );
        Ok(ensemble)
    }

    /// The ensemble flavour.
    pub fn kind(&self) -> EnsembleKind {
        match &self.variant {
            Variant::Nve => EnsembleKind::Nve,
            Variant::Nvt { .. } => EnsembleKind::Nvt,
            Variant::Barostatted { stress: false, .. } => EnsembleKind::Npt,
            Variant::Barostatted { stress: true, .. } => EnsembleKind::Nst,
            Variant::Mts { .. } => EnsembleKind::Mts,
            Variant::Replay(_) => EnsembleKind::Replay,
        }
    }

    /// Outer timestep.
    pub fn dt(&self) -> f64 {
        self.core.dt
    }

    /// Physical temperature.
    pub fn temperature(&self) -> f64 {
        self.core.temperature
    }

    /// Path-integral temperature `P·T`.
    pub fn ntemp(&self) -> f64 {
        self.core.ntemp
    }

    /// Energy absorbed by the momentum constraints so far.
    pub fn eens(&self) -> f64 {
        self.core.eens
    }

    /// Degrees of freedom removed by the constraints.
    pub fn fixdof(&self, nbeads: usize) -> usize {
        self.core.constraints.fixdof(nbeads)
    }

    /// The compiled MTS schedule, for MTS ensembles.
    pub fn schedule(&self) -> Option<&MtsSchedule> {
        match &self.variant {
            Variant::Mts { schedule, .. } => Some(schedule),
            _ => None,
        }
    }

    /// Phase timings of the most recent step.
    pub fn last_timings(&self) -> StepTimings {
        self.core.timings
    }

    /// Advance `sys` by one outer step.
    pub fn step(&mut self, sys: &mut System) -> Result<StepOutcome, StepError> {
        let core = &mut self.core;
        core.timings = StepTimings::default();
        match &mut self.variant {
            Variant::Nve => core.nve(sys)?,
            Variant::Nvt { thermostat } => {
                core.thermostat(thermostat.as_mut(), sys);
                core.constrain(sys);
                core.nve(sys)?;
                core.thermostat(thermostat.as_mut(), sys);
                core.constrain(sys);
            }
            Variant::Barostatted {
                thermostat,
                barostat,
                ..
            } => core.barostatted(thermostat.as_mut(), barostat.as_mut(), sys)?,
            Variant::Mts {
                thermostat,
                schedule,
            } => core.mts(thermostat.as_mut(), schedule, sys)?,
            Variant::Replay(replay) => {
                let start = Instant::now();
                let outcome = replay.step(sys)?;
                core.timings.qtime += start.elapsed();
                return Ok(outcome);
            }
        }
        Ok(StepOutcome::Continue)
    }

    /// The terms of the conserved quantity at the current state.
    pub fn econs_parts(&self, sys: &mut System) -> Result<EconsParts, ForceError> {
        let mut parts = EconsParts {
            kinetic: sys.kinetic_energy(),
            spring: sys.spring_energy(),
            pot: sys.pot()?,
            bias: sys.bias_pot()?,
            eens: self.core.eens,
            ethermo: 0.0,
            ebaro: 0.0,
        };
        match &self.variant {
            Variant::Nvt { thermostat } | Variant::Mts { thermostat, .. } => {
                parts.ethermo = thermostat.ethermo();
            }
            Variant::Barostatted {
                thermostat,
                barostat,
                ..
            } => {
                parts.ethermo = thermostat.ethermo();
                parts.ebaro = barostat.ebaro(&sys.cell);
            }
            Variant::Nve | Variant::Replay(_) => {}
        }
        Ok(parts)
    }

    /// The conserved quantity.
    pub fn econs(&self, sys: &mut System) -> Result<f64, ForceError> {
        Ok(self.econs_parts(sys)?.total())
    }

    /// Bookkeeping needed to resume this ensemble exactly.
    pub fn ledger(&self) -> EnsembleLedger {
        let mut ledger = EnsembleLedger {
            eens: self.core.eens,
            ..Default::default()
        };
        match &self.variant {
            Variant::Nvt { thermostat } | Variant::Mts { thermostat, .. } => {
                ledger.thermostat = Some(thermostat.state());
            }
            Variant::Barostatted {
                thermostat,
                barostat,
                ..
            } => {
                ledger.thermostat = Some(thermostat.state());
                ledger.barostat = Some(barostat.state());
            }
            Variant::Replay(replay) => ledger.replay_frames = replay.frames_consumed(),
            Variant::Nve => {}
        }
        ledger
    }

    /// Restore bookkeeping saved by [`ledger`](Self::ledger).
    ///
    /// A replay ensemble cannot rewind its source; instead its next step
    /// skips the frame sets consumed before the ledger was taken.
    pub fn restore(&mut self, ledger: &EnsembleLedger) {
        self.core.eens = ledger.eens;
        match &mut self.variant {
            Variant::Nvt { thermostat } | Variant::Mts { thermostat, .. } => {
                if let Some(state) = &ledger.thermostat {
                    thermostat.restore(state);
                }
            }
            Variant::Barostatted {
                thermostat,
                barostat,
                ..
            } => {
                if let Some(state) = &ledger.thermostat {
                    thermostat.restore(state);
                }
                if let Some(state) = &ledger.barostat {
                    barostat.restore(state);
                }
            }
            Variant::Replay(replay) => replay.fast_forward(ledger.replay_frames),
            Variant::Nve => {}
        }
    }

    /// Make a replay ensemble's next step apply frame set `step + 1`.
    ///
    /// Used when a run resumes at `step` without a ledger. No effect on
    /// other ensembles.
    pub fn fast_forward(&mut self, step: u64) {
        if let Variant::Replay(replay) = &mut self.variant {
            replay.fast_forward(step);
        }
    }
}

impl Core {
    fn constrain(&mut self, sys: &mut System) {
        if !self.constraints.is_empty() {
            self.eens += self.constraints.apply(&mut sys.beads);
        }
    }

    fn thermostat(&mut self, thermostat: &mut dyn Thermostat, sys: &mut System) {
        let start = Instant::now();
        let (p, m3) = sys.beads.p_and_m3_mut();
        thermostat.step(p, m3);
        self.timings.ttime += start.elapsed();
    }

    fn kick(&mut self, sys: &mut System, h: f64) -> Result<(), ForceError> {
        let start = Instant::now();
        sys.kick(h)?;
        self.timings.ptime += start.elapsed();
        Ok(())
    }

    fn drift(&mut self, sys: &mut System, qc: f64, free: f64) {
        let start = Instant::now();
        sys.qcstep(qc);
        sys.free_qstep(free);
        self.timings.qtime += start.elapsed();
    }

    fn nve(&mut self, sys: &mut System) -> Result<(), ForceError> {
        let dt = self.dt;
        self.kick(sys, dt / 2.0)?;
        self.constrain(sys);
        self.drift(sys, dt, dt);
        self.kick(sys, dt / 2.0)?;
        self.constrain(sys);
        Ok(())
    }

    fn barostatted(
        &mut self,
        thermostat: &mut dyn Thermostat,
        barostat: &mut dyn Barostat,
        sys: &mut System,
    ) -> Result<(), ForceError> {
        self.thermostat(thermostat, sys);
        let start = Instant::now();
        barostat.thermostat_step();
        self.timings.ttime += start.elapsed();
        self.constrain(sys);

        let start = Instant::now();
        barostat.pstep(sys)?;
        self.timings.ptime += start.elapsed();
        self.constrain(sys);

        let start = Instant::now();
        barostat.qcstep(sys);
        sys.free_qstep(self.dt);
        self.timings.qtime += start.elapsed();

        let start = Instant::now();
        barostat.pstep(sys)?;
        self.timings.ptime += start.elapsed();
        self.constrain(sys);

        let start = Instant::now();
        barostat.thermostat_step();
        self.timings.ttime += start.elapsed();
        self.thermostat(thermostat, sys);
        self.constrain(sys);
        Ok(())
    }

    fn mts(
        &mut self,
        thermostat: &mut dyn Thermostat,
        schedule: &MtsSchedule,
        sys: &mut System,
    ) -> Result<(), ForceError> {
        let dt = self.dt;
        let deltat = schedule.deltat();

        self.thermostat(thermostat, sys);
        self.constrain(sys);
        self.bias_kick(sys, dt / 2.0)?;

        for op in schedule.ops() {
            match *op {
                MtsOp::Kick { level, h } => {
                    let start = Instant::now();
                    sys.kick_level(level, h)?;
                    self.timings.ptime += start.elapsed();
                    self.constrain(sys);
                }
                MtsOp::Drift { h } => self.drift(sys, h, deltat),
            }
        }

        self.bias_kick(sys, dt / 2.0)?;
        self.thermostat(thermostat, sys);
        self.constrain(sys);
        Ok(())
    }

    fn bias_kick(&mut self, sys: &mut System, h: f64) -> Result<(), ForceError> {
        if sys.bias.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        sys.kick_bias(h)?;
        self.timings.ptime += start.elapsed();
        Ok(())
    }
}
