//! Benchmark profiles for the trotter integrators.
//!
//! Provides pre-built systems and ensemble configurations:
//!
//! - [`lj_crystal`]: Lennard-Jones atoms on a simple cubic lattice
//! - [`tethered_crystal`]: the same lattice with a stiff site tether on a
//!   fast MTS level
//! - [`nvt_config`]: Langevin NVT at a fixed step

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use trotter_core::{Beads, Cell, ConfigError, ForceComponent, Forces, System};
use trotter_ensemble::{EnsembleConfig, EnsembleMode};
use trotter_models::{HarmonicTrap, LangevinThermostat, LennardJones};

/// Lattice spacing in units of sigma, close to the LJ minimum.
const SPACING: f64 = 1.12;

/// Sites of a `side`³ simple cubic lattice, flattened.
fn lattice(side: usize) -> Vec<f64> {
    let mut q = Vec::with_capacity(3 * side * side * side);
    for i in 0..side {
        for j in 0..side {
            for k in 0..side {
                q.extend([i as f64, j as f64, k as f64].map(|x| (x + 0.5) * SPACING));
            }
        }
    }
    q
}

fn lennard_jones(l: f64) -> Result<LennardJones, ConfigError> {
    LennardJones::new(1.0, 1.0, 2.5f64.min(0.49 * l))
}

fn replicas(nbeads: usize, sites: &[f64], seed: u64) -> Result<Beads, ConfigError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let natoms = sites.len() / 3;
    let mut q = Vec::with_capacity(nbeads * sites.len());
    for _ in 0..nbeads {
        q.extend(sites.iter().map(|x| x + rng.random_range(-0.02..0.02)));
    }
    let p = (0..q.len()).map(|_| rng.random_range(-0.3..0.3)).collect();
    Beads::from_parts(nbeads, vec![1.0; natoms], q, p)
}

/// `side`³ unit-mass LJ atoms (epsilon = sigma = 1) with `nbeads` slightly
/// jittered replicas each. The cutoff is 2.5 or just under half the box,
/// whichever is shorter.
pub fn lj_crystal(nbeads: usize, side: usize, seed: u64) -> Result<System, ConfigError> {
    let sites = lattice(side);
    let beads = replicas(nbeads, &sites, seed)?;
    let l = side as f64 * SPACING;
    let forces = Forces::new().with(ForceComponent::new(
        "lj",
        Box::new(lennard_jones(l)?),
    ))?;
    Ok(System::new(beads, Cell::orthorhombic(l, l, l)?, forces))
}

/// [`lj_crystal`] plus a stiff harmonic tether to the lattice sites. The LJ
/// term sits on MTS level 0 and the tether on level 1.
pub fn tethered_crystal(nbeads: usize, side: usize, seed: u64) -> Result<System, ConfigError> {
    let sites = lattice(side);
    let beads = replicas(nbeads, &sites, seed)?;
    let l = side as f64 * SPACING;
    let tether = HarmonicTrap::new(50.0)?.centered_at(sites);
    let forces = Forces::new()
        .with(ForceComponent::new(
            "lj",
            Box::new(lennard_jones(l)?),
        ))?
        .with(ForceComponent::new("tether", Box::new(tether)).with_mts_level(1))?;
    Ok(System::new(beads, Cell::orthorhombic(l, l, l)?, forces))
}

/// Langevin NVT at `dt` = 0.002 and a reduced temperature of 0.7.
pub fn nvt_config(seed: u64) -> Result<EnsembleConfig, ConfigError> {
    let thermostat = LangevinThermostat::builder().tau(1.0).seed(seed).build()?;
    Ok(EnsembleConfig {
        dt: 0.002,
        temperature: 0.7,
        mode: EnsembleMode::Nvt {
            thermostat: Box::new(thermostat),
        },
        ..Default::default()
    })
}
