//! Reference collaborators for the trotter integrators.
//!
//! Provides the thermostats, barostat, and force fields the ensembles are
//! exercised against:
//!
//! | Collaborator | Kind |
//! |---|---|
//! | [`NullThermostat`] | thermostat, no-op |
//! | [`LangevinThermostat`] | thermostat, white-noise Langevin |
//! | [`BzpBarostat`] | barostat, isotropic BZP |
//! | [`HarmonicTrap`] | force field, external well |
//! | [`HarmonicBonds`] | force field, pair bonds |
//! | [`LennardJones`] | force field, truncated and shifted LJ |

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod barostat;
pub mod harmonic;
pub mod lennard_jones;
pub mod thermostat;

pub use barostat::BzpBarostat;
pub use harmonic::{HarmonicBonds, HarmonicTrap};
pub use lennard_jones::LennardJones;
pub use thermostat::{LangevinThermostat, LangevinThermostatBuilder, NullThermostat};
