//! Reference thermostats.
//!
//! [`LangevinThermostat`] applies the exact Ornstein–Uhlenbeck update to
//! every momentum component, drawing noise from a seeded `ChaCha8Rng` whose
//! stream position is part of the checkpointed state. [`NullThermostat`]
//! does nothing and is what a bare MTS ensemble carries.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use trotter_core::{ConfigError, Thermostat, ThermostatBinding, ThermostatState};

/// A thermostat that never touches the momenta.
#[derive(Clone, Debug, Default)]
pub struct NullThermostat;

impl Thermostat for NullThermostat {
    fn name(&self) -> &str {
        "null"
    }

    fn bind(&mut self, _binding: &ThermostatBinding) -> Result<(), ConfigError> {
        Ok(())
    }

    fn step(&mut self, _p: &mut [f64], _m: &[f64]) {}

    fn ethermo(&self) -> f64 {
        0.0
    }

    fn state(&self) -> ThermostatState {
        ThermostatState::default()
    }

    fn restore(&mut self, _state: &ThermostatState) {}
}

/// White-noise Langevin thermostat with relaxation time `tau`.
///
/// Each half-step maps `p → c₁ p + c₂ √(m T) ξ` with `c₁ = exp(−dt/(2τ))`
/// and `c₂ = √(1 − c₁²)`. The kinetic energy removed is added to
/// [`ethermo`](Thermostat::ethermo).
#[derive(Clone, Debug)]
pub struct LangevinThermostat {
    tau: f64,
    seed: u64,
    rng: ChaCha8Rng,
    temperature: f64,
    c1: f64,
    c2: f64,
    ethermo: f64,
}

/// Builder for [`LangevinThermostat`].
///
/// Required field: `tau`.
#[derive(Clone, Debug, Default)]
pub struct LangevinThermostatBuilder {
    tau: Option<f64>,
    seed: u64,
}

impl LangevinThermostat {
    /// Create a new builder.
    pub fn builder() -> LangevinThermostatBuilder {
        LangevinThermostatBuilder::default()
    }

    /// Relaxation time.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Seed of the noise stream.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Gaussian sample using the Box–Muller transform.
    fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
        let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
        let u2: f64 = rng.random();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

impl LangevinThermostatBuilder {
    /// Set the relaxation time. Must be finite and positive.
    pub fn tau(mut self, tau: f64) -> Self {
        self.tau = Some(tau);
        self
    }

    /// Set the RNG seed (default: 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the thermostat.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `tau` is missing, NaN, infinite, or not positive.
    pub fn build(self) -> Result<LangevinThermostat, ConfigError> {
        let tau = self.tau.ok_or_else(|| ConfigError::InvalidParameter {
            name: "tau",
            reason: "tau is required".to_string(),
        })?;
        if !tau.is_finite() || tau <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "tau",
                reason: format!("must be finite and positive, got {tau}"),
            });
        }
        Ok(LangevinThermostat {
            tau,
            seed: self.seed,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            temperature: 0.0,
            c1: 1.0,
            c2: 0.0,
            ethermo: 0.0,
        })
    }
}

impl Thermostat for LangevinThermostat {
    fn name(&self) -> &str {
        "langevin"
    }

    fn bind(&mut self, binding: &ThermostatBinding) -> Result<(), ConfigError> {
        self.temperature = binding.temperature;
        self.c1 = (-0.5 * binding.dt / self.tau).exp();
        self.c2 = (1.0 - self.c1 * self.c1).sqrt();
        Ok(())
    }

    fn step(&mut self, p: &mut [f64], m: &[f64]) {
        if m.is_empty() {
            return;
        }
        let mut heat = 0.0;
        for (i, pi) in p.iter_mut().enumerate() {
            let mi = m[i % m.len()];
            let before = 0.5 * *pi * *pi / mi;
            let xi = Self::box_muller(&mut self.rng);
            *pi = self.c1 * *pi + self.c2 * (mi * self.temperature).sqrt() * xi;
            heat += before - 0.5 * *pi * *pi / mi;
        }
        self.ethermo += heat;
    }

    fn ethermo(&self) -> f64 {
        self.ethermo
    }

    fn state(&self) -> ThermostatState {
        ThermostatState {
            ethermo: self.ethermo,
            rng_word_pos: self.rng.get_word_pos(),
        }
    }

    fn restore(&mut self, state: &ThermostatState) {
        self.ethermo = state.ethermo;
        self.rng.set_word_pos(state.rng_word_pos);
    }
}
