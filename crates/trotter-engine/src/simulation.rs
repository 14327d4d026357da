//! The outer driving loop.
//!
//! [`Simulation`] owns one or more [`BoundSystem`]s and advances all of
//! them once per outer iteration. Each iteration:
//!
//! 1. stores an in-memory checkpoint of the committed state,
//! 2. steps every system,
//! 3. feeds the outputs,
//! 4. polls the stop conditions.
//!
//! If a step fails, every system is rolled back to the stored checkpoint,
//! that checkpoint is persisted, and the error is returned. On any clean
//! stop the post-step state is persisted instead.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use trotter_core::{ConfigError, System};
use trotter_ensemble::{Ensemble, StepOutcome};
use trotter_replay::Checkpoint;

use crate::checkpoint;
use crate::config::SimulationConfig;
use crate::error::RunError;
use crate::metrics::{MetricsWindow, StepMetrics};
use crate::output::Output;
use crate::stop::{CancellationToken, StopConditions, StopReason};

// ── BoundSystem ──────────────────────────────────────────────────

/// A system together with the ensemble bound to it.
#[derive(Debug)]
pub struct BoundSystem {
    /// The state being integrated.
    pub system: System,
    /// The integrator bound to `system`.
    pub ensemble: Ensemble,
}

impl BoundSystem {
    /// Pair a system with an ensemble already bound to it.
    pub fn new(system: System, ensemble: Ensemble) -> Self {
        Self { system, ensemble }
    }
}

// ── RunSummary ───────────────────────────────────────────────────

/// What a call to [`Simulation::run`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    /// Step index when the run ended.
    pub final_step: u64,
    /// Steps committed during this call.
    pub steps_taken: u64,
    /// Why the loop ended.
    pub reason: StopReason,
    /// Wall-clock time spent in the loop.
    pub elapsed: Duration,
}

// ── Simulation ───────────────────────────────────────────────────

/// Single-threaded driver over a set of bound systems.
pub struct Simulation {
    config: SimulationConfig,
    systems: Vec<BoundSystem>,
    outputs: Vec<Box<dyn Output>>,
    step: u64,
    token: CancellationToken,
    rollback: Option<Checkpoint>,
    last_metrics: StepMetrics,
    window: MetricsWindow,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("step", &self.step)
            .field("systems", &self.systems.len())
            .field(
                "outputs",
                &self.outputs.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Simulation {
    /// Validate `config` and take ownership of the systems.
    pub fn new(config: SimulationConfig, systems: Vec<BoundSystem>) -> Result<Self, ConfigError> {
        config.validate()?;
        if systems.is_empty() {
            return Err(ConfigError::EmptySystem);
        }
        Ok(Self {
            config,
            systems,
            outputs: Vec::new(),
            step: 0,
            token: CancellationToken::new(),
            rollback: None,
            last_metrics: StepMetrics::default(),
            window: MetricsWindow::default(),
        })
    }

    /// Append an output. Outputs are fed in insertion order.
    pub fn with_output(mut self, output: Box<dyn Output>) -> Self {
        self.outputs.push(output);
        self
    }

    /// Token that stops [`run`](Self::run) after the step in flight.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of committed steps.
    pub fn step_index(&self) -> u64 {
        self.step
    }

    /// The driven systems.
    pub fn systems(&self) -> &[BoundSystem] {
        &self.systems
    }

    /// Mutable access between runs.
    pub fn systems_mut(&mut self) -> &mut [BoundSystem] {
        &mut self.systems
    }

    /// Timing of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The pre-step checkpoint stored before the most recent step.
    pub fn rollback_checkpoint(&self) -> Option<&Checkpoint> {
        self.rollback.as_ref()
    }

    /// Checkpoint of the current committed state.
    pub fn checkpoint(&self) -> Checkpoint {
        checkpoint::capture(self.step, &self.systems)
    }

    /// Replace the state of every system and the step counter.
    pub fn restore(&mut self, chk: &Checkpoint) -> Result<(), RunError> {
        checkpoint::restore(chk, &mut self.systems)?;
        self.step = chk.step;
        info!(step = chk.step, "simulation restored from checkpoint");
        Ok(())
    }

    /// Step until a stop condition holds.
    ///
    /// Force components are started before the first step and stopped on
    /// the way out, whatever the outcome.
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        for bound in &mut self.systems {
            bound.system.forces.start().map_err(RunError::Start)?;
            bound.system.bias.start().map_err(RunError::Start)?;
        }
        let result = self.run_loop();
        for bound in &mut self.systems {
            bound.system.forces.stop();
            bound.system.bias.stop();
        }
        result
    }

    fn run_loop(&mut self) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let first_step = self.step;
        let stop = StopConditions {
            token: self.token.clone(),
            sentinel: self.config.sentinel.clone(),
            budget: self.config.max_wall_time,
        };
        info!(
            systems = self.systems.len(),
            from = self.step,
            to = self.config.total_steps,
            "simulation starting"
        );

        if self.step == 0 {
            self.write_outputs()?;
        }

        let reason = loop {
            if self.step >= self.config.total_steps {
                break StopReason::Completed;
            }
            match self.advance() {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Exhausted) => break StopReason::Exhausted,
                Ok(StepOutcome::Finished) => break StopReason::Finished,
                Err(e) => return Err(self.fail(e)),
            }
            if let Some(reason) = stop.poll(started) {
                break reason;
            }
        };

        for output in &mut self.outputs {
            output.finish().map_err(|source| RunError::Output {
                name: output.name().to_string(),
                source,
            })?;
        }
        if let Some(path) = &self.config.checkpoint_path {
            checkpoint::write(path, &self.checkpoint(), &self.config.label)?;
        }
        let summary = RunSummary {
            final_step: self.step,
            steps_taken: self.step - first_step,
            reason,
            elapsed: started.elapsed(),
        };
        info!(
            step = self.step,
            %reason,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "simulation stopped"
        );
        Ok(summary)
    }

    /// One outer iteration. `Exhausted` leaves the step counter and every
    /// system as they were before the iteration.
    fn advance(&mut self) -> Result<StepOutcome, RunError> {
        let step_start = Instant::now();

        // 1. Store the committed state.
        self.rollback = Some(self.checkpoint());

        // 2. Step every system.
        let mut metrics = StepMetrics::default();
        let mut outcome = StepOutcome::Continue;
        for (i, bound) in self.systems.iter_mut().enumerate() {
            let o = bound
                .ensemble
                .step(&mut bound.system)
                .map_err(|source| RunError::Step {
                    step: self.step,
                    system: i,
                    source,
                })?;
            metrics.add_timings(&bound.ensemble.last_timings());
            if outcome == StepOutcome::Continue {
                outcome = o;
            }
        }
        if outcome == StepOutcome::Exhausted {
            // Systems stepped alongside the exhausted one are undone, so the
            // committed state stays a whole iteration.
            if let Some(chk) = &self.rollback {
                checkpoint::restore(chk, &mut self.systems)?;
            }
            debug!(step = self.step, "trajectory exhausted, iteration discarded");
            return Ok(outcome);
        }
        self.step += 1;

        // 3. Outputs see the committed step.
        let output_start = Instant::now();
        self.write_outputs()?;
        metrics.output_us = output_start.elapsed().as_micros() as u64;
        metrics.total_us = step_start.elapsed().as_micros() as u64;

        // 4. Timing summary.
        self.window.record(&metrics);
        self.last_metrics = metrics;
        if self.window.len() >= self.config.log_interval {
            let avg = self.window.drain();
            debug!(
                step = self.step,
                total_us = avg.total_us,
                ptime_us = avg.ptime_us,
                qtime_us = avg.qtime_us,
                ttime_us = avg.ttime_us,
                output_us = avg.output_us,
                "average step timings"
            );
        }
        Ok(outcome)
    }

    fn write_outputs(&mut self) -> Result<(), RunError> {
        for output in &mut self.outputs {
            output
                .write(self.step, &mut self.systems)
                .map_err(|source| RunError::Output {
                    name: output.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Roll back to the pre-step checkpoint and persist it.
    fn fail(&mut self, err: RunError) -> RunError {
        let Some(chk) = self.rollback.take() else {
            return err;
        };
        if let Err(e) = checkpoint::restore(&chk, &mut self.systems) {
            warn!(error = %e, "rollback failed");
        }
        self.step = chk.step;
        warn!(step = chk.step, error = %err, "step failed, rolled back");
        if let Some(path) = &self.config.checkpoint_path {
            if let Err(e) = checkpoint::write(path, &chk, &self.config.label) {
                warn!(error = %e, "best-effort checkpoint failed");
            }
        }
        self.rollback = Some(chk);
        err
    }
}
