//! Trotter: ring-polymer molecular dynamics integrators.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! trotter sub-crates. For most users, adding `trotter` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use trotter::prelude::*;
//! use trotter::models::HarmonicTrap;
//!
//! // One atom, four beads, in a harmonic well.
//! let beads = Beads::replicated(4, vec![1.0], &[0.1, 0.0, 0.0], &[0.0; 3]).unwrap();
//! let cell = Cell::orthorhombic(50.0, 50.0, 50.0).unwrap();
//! let trap = HarmonicTrap::new(1.0).unwrap();
//! let forces = Forces::new()
//!     .with(ForceComponent::new("trap", Box::new(trap)))
//!     .unwrap();
//! let mut system = System::new(beads, cell, forces);
//!
//! let thermostat = LangevinThermostat::builder().tau(10.0).seed(42).build().unwrap();
//! let config = EnsembleConfig {
//!     dt: 0.05,
//!     temperature: 0.5,
//!     mode: EnsembleMode::Nvt { thermostat: Box::new(thermostat) },
//!     ..Default::default()
//! };
//! let ensemble = Ensemble::bind(config, &mut system).unwrap();
//!
//! let run = SimulationConfig { total_steps: 20, sentinel: None, ..Default::default() };
//! let mut sim = Simulation::new(run, vec![BoundSystem::new(system, ensemble)]).unwrap();
//! let summary = sim.run().unwrap();
//! assert_eq!(summary.final_step, 20);
//! assert_eq!(summary.reason, StopReason::Completed);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Crate | Contents |
//! |---|---|---|
//! | [`core`] | `trotter-core` | beads, cell, forces, normal modes, collaborator traits |
//! | [`ensemble`] | `trotter-ensemble` | NVE/NVT/NPT/NST/MTS/replay integrators |
//! | [`engine`] | `trotter-engine` | simulation driver, outputs, checkpoints |
//! | [`models`] | `trotter-models` | reference thermostats, barostat, force fields |
//! | [`replay`] | `trotter-replay` | trajectory and checkpoint streams |

#![deny(missing_docs)]
#![forbid(unsafe_code)]

/// Replica state, force aggregation and collaborator traits (`trotter-core`).
///
/// The [`core::ForceField`], [`core::Thermostat`] and [`core::Barostat`]
/// traits are the extension points for user-defined physics.
pub use trotter_core as core;

/// Ensemble integrators (`trotter-ensemble`).
///
/// [`ensemble::Ensemble::bind`] turns an [`ensemble::EnsembleConfig`] into a
/// stepping integrator bound to one system.
pub use trotter_ensemble as ensemble;

/// Simulation driver (`trotter-engine`).
///
/// [`engine::Simulation`] steps bound systems with rollback on failure and
/// soft-exit conditions.
pub use trotter_engine as engine;

/// Reference collaborators (`trotter-models`).
pub use trotter_models as models;

/// Trajectory and checkpoint I/O (`trotter-replay`).
///
/// Record positions with [`replay::TrajectoryWriter`], read them back with
/// [`replay::TrajectoryReader`].
pub use trotter_replay as replay;

/// Common imports for typical trotter usage.
///
/// ```rust
/// use trotter::prelude::*;
/// ```
pub mod prelude {
    // System state
    pub use trotter_core::{
        Beads, Cell, ForceComponent, ForceField, ForceOutput, Forces, LengthUnit, Matrix3,
        System,
    };

    // Collaborators
    pub use trotter_core::{Barostat, PressureTarget, Thermostat};

    // Errors
    pub use trotter_core::{ConfigError, ForceError};
    pub use trotter_ensemble::StepError;
    pub use trotter_engine::RunError;

    // Ensembles
    pub use trotter_ensemble::{Ensemble, EnsembleConfig, EnsembleMode, StepOutcome};

    // Driver
    pub use trotter_engine::{
        BoundSystem, CancellationToken, Simulation, SimulationConfig, StopReason,
    };

    // Reference models
    pub use trotter_models::{BzpBarostat, LangevinThermostat, NullThermostat};
}
