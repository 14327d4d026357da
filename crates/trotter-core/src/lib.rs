//! Core types and traits for the trotter integrator framework.
//!
//! This is the leaf crate of the workspace. It defines the ring-polymer
//! state ([`Beads`], [`Cell`], [`NormalModes`], [`System`]), the force
//! aggregation layer ([`Forces`]), the collaborator traits consumed by the
//! ensembles ([`ForceField`], [`Thermostat`], [`Barostat`]), unit handling,
//! and the error types shared across the workspace.
//!
//! All quantities are in atomic units (`ħ = k_B = 1`).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod beads;
pub mod cell;
pub mod error;
pub mod forces;
pub mod normal_modes;
pub mod system;
pub mod traits;
pub mod units;

pub use beads::Beads;
pub use cell::{Cell, Matrix3};
pub use error::{ConfigError, ForceError};
pub use forces::{ForceComponent, ForceField, ForceOutput, Forces};
pub use normal_modes::NormalModes;
pub use system::System;
pub use traits::{
    Barostat, BarostatBinding, BarostatState, PressureTarget, Thermostat, ThermostatBinding,
    ThermostatState,
};
pub use units::LengthUnit;
