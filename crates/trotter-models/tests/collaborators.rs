//! Reference collaborators driven through the ensembles.

use proptest::prelude::*;
use trotter_core::{Beads, Cell, ForceComponent, ForceField, ForceOutput, Forces, System};
use trotter_ensemble::{Ensemble, EnsembleConfig, EnsembleMode, StepOutcome};
use trotter_models::{HarmonicBonds, LangevinThermostat, LennardJones, NullThermostat};

fn cell(l: f64) -> Cell {
    Cell::orthorhombic(l, l, l).unwrap()
}

/// Two LJ atoms near the minimum plus a bonded third atom. The stiff pair
/// repulsion sits on the fast MTS level.
fn molecule(nbeads: usize) -> System {
    let q0 = [0.0, 0.0, 0.0, 1.2, 0.0, 0.0, 1.2, 1.0, 0.0];
    let p0 = [0.05, 0.0, -0.02, -0.05, 0.01, 0.0, 0.0, 0.0, 0.02];
    let beads = Beads::replicated(nbeads, vec![1.0, 1.0, 2.0], &q0, &p0).unwrap();
    let forces = Forces::new()
        .with(ForceComponent::new(
            "bond",
            Box::new(HarmonicBonds::new(vec![(1, 2)], 20.0, 1.0).unwrap()),
        ))
        .unwrap()
        .with(
            ForceComponent::new(
                "lj",
                Box::new(LennardJones::new(1.0, 1.0, 2.5).unwrap()),
            )
            .with_mts_level(1),
        )
        .unwrap();
    System::new(beads, cell(10.0), forces)
}

fn relative_drift(ens: &mut Ensemble, sys: &mut System, steps: usize) -> f64 {
    let e0 = ens.econs(sys).unwrap();
    let mut worst = 0.0f64;
    for _ in 0..steps {
        assert_eq!(ens.step(sys).unwrap(), StepOutcome::Continue);
        let e = ens.econs(sys).unwrap();
        worst = worst.max(((e - e0) / e0).abs());
    }
    worst
}

#[test]
fn molecule_conserves_energy_under_nve() {
    let mut sys = molecule(4);
    let cfg = EnsembleConfig {
        dt: 0.002,
        temperature: 0.1,
        ..Default::default()
    };
    let mut ens = Ensemble::bind(cfg, &mut sys).unwrap();
    let drift = relative_drift(&mut ens, &mut sys, 2000);
    assert!(drift < 1e-4, "relative drift {drift}");
}

#[test]
fn mts_with_fast_pair_forces_conserves_energy() {
    let mut sys = molecule(2);
    let cfg = EnsembleConfig {
        dt: 0.004,
        temperature: 0.1,
        mode: EnsembleMode::Mts {
            thermostat: Box::new(NullThermostat),
            factors: Some(vec![1, 2]),
        },
        ..Default::default()
    };
    let mut ens = Ensemble::bind(cfg, &mut sys).unwrap();
    let drift = relative_drift(&mut ens, &mut sys, 500);
    assert!(drift < 1e-3, "relative drift {drift}");
}

#[test]
fn langevin_nvt_conserved_quantity_absorbs_the_heat() {
    let mut sys = molecule(4);
    let thermostat = LangevinThermostat::builder()
        .tau(2.0)
        .seed(77)
        .build()
        .unwrap();
    let cfg = EnsembleConfig {
        dt: 0.002,
        temperature: 0.1,
        mode: EnsembleMode::Nvt {
            thermostat: Box::new(thermostat),
        },
        ..Default::default()
    };
    let mut ens = Ensemble::bind(cfg, &mut sys).unwrap();
    let drift = relative_drift(&mut ens, &mut sys, 1000);
    assert!(drift < 1e-3, "relative drift {drift}");
}

fn net_force(field: &mut dyn ForceField, q: &[f64]) -> [f64; 3] {
    let mut out = ForceOutput::zeroed(q.len());
    field.compute(q, &cell(10.0), &mut out).unwrap();
    let mut total = [0.0; 3];
    for atom in out.f.chunks_exact(3) {
        for d in 0..3 {
            total[d] += atom[d];
        }
    }
    total
}

proptest! {
    #[test]
    fn bonds_exert_no_net_force(q in prop::collection::vec(-4.0f64..4.0, 12)) {
        let mut bonds = HarmonicBonds::new(vec![(0, 1), (1, 2), (2, 3)], 3.0, 1.0).unwrap();
        for c in net_force(&mut bonds, &q) {
            prop_assert!(c.abs() < 1e-9);
        }
    }

    #[test]
    fn lennard_jones_exerts_no_net_force(q in prop::collection::vec(-4.0f64..4.0, 9)) {
        let mut lj = LennardJones::new(1.0, 1.0, 2.5).unwrap();
        let total = net_force(&mut lj, &q);
        let mut out = ForceOutput::zeroed(q.len());
        lj.compute(&q, &cell(10.0), &mut out).unwrap();
        let scale = out.f.iter().fold(1.0f64, |m, f| m.max(f.abs()));
        for c in total {
            prop_assert!(c.abs() <= 1e-9 * scale);
        }
    }
}
