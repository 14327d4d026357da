//! Force fields and the per-system force aggregate.
//!
//! A [`ForceField`] evaluates one replica at a time. [`Forces`] owns a set
//! of named [`ForceComponent`]s, each scaling its field by a `weight` and
//! assigning it to an MTS level. Results are cached against the positions
//! and cell they were computed at, so asking for the same forces twice
//! without moving atoms never re-evaluates a component.

use indexmap::IndexMap;

use crate::beads::Beads;
use crate::cell::{Cell, Matrix3};
use crate::error::{ConfigError, ForceError};

/// Output buffer for one replica's evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForceOutput {
    /// Potential energy.
    pub pot: f64,
    /// Forces, `3N` entries.
    pub f: Vec<f64>,
    /// Virial tensor `Σ r ⊗ f`.
    pub virial: Matrix3,
}

impl ForceOutput {
    /// Zeroed buffer for `ndof` degrees of freedom.
    pub fn zeroed(ndof: usize) -> Self {
        Self {
            pot: 0.0,
            f: vec![0.0; ndof],
            virial: [[0.0; 3]; 3],
        }
    }

    fn reset(&mut self) {
        self.pot = 0.0;
        self.f.iter_mut().for_each(|v| *v = 0.0);
        self.virial = [[0.0; 3]; 3];
    }
}

/// A potential-energy surface evaluated one replica at a time.
///
/// # Contract
///
/// - `compute()` MUST be deterministic given `q` and `cell`.
/// - `out` arrives zeroed; implementations accumulate into it.
/// - A call blocks until the result is available. Hung engines are the
///   implementation's problem; the integrators never retry.
pub trait ForceField: Send {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Acquire external resources before the first evaluation.
    fn start(&mut self) -> Result<(), ForceError> {
        Ok(())
    }

    /// Evaluate energy, forces and virial of one replica.
    fn compute(&mut self, q: &[f64], cell: &Cell, out: &mut ForceOutput)
        -> Result<(), ForceError>;

    /// Release external resources. Called once at teardown.
    fn stop(&mut self) {}
}

/// A force field registered with a weight and MTS level.
pub struct ForceComponent {
    name: String,
    field: Box<dyn ForceField>,
    weight: f64,
    mts_level: usize,
    cache: ComponentCache,
}

#[derive(Default)]
struct ComponentCache {
    valid: bool,
    q: Vec<f64>,
    h: Matrix3,
    pot: f64,
    f: Vec<f64>,
    virial: Matrix3,
    scratch: ForceOutput,
}

impl ForceComponent {
    /// Wrap a force field with weight 1 at MTS level 0.
    pub fn new(name: impl Into<String>, field: Box<dyn ForceField>) -> Self {
        Self {
            name: name.into(),
            field,
            weight: 1.0,
            mts_level: 0,
            cache: ComponentCache::default(),
        }
    }

    /// Scale this component's contribution.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Assign this component to an MTS level (0 = outermost).
    pub fn with_mts_level(mut self, level: usize) -> Self {
        self.mts_level = level;
        self
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contribution weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// MTS level.
    pub fn mts_level(&self) -> usize {
        self.mts_level
    }

    fn refresh(&mut self, beads: &Beads, cell: &Cell) -> Result<(), ForceError> {
        let cache = &mut self.cache;
        if cache.valid && cache.q.as_slice() == beads.q() && cache.h == *cell.h() {
            return Ok(());
        }
        // A failure below leaves partial sums behind; they must never be
        // served for the old positions.
        cache.valid = false;
        let ndof = beads.ndof();
        if cache.scratch.f.len() != ndof {
            cache.scratch = ForceOutput::zeroed(ndof);
        }
        cache.f.resize(beads.q().len(), 0.0);
        cache.pot = 0.0;
        cache.virial = [[0.0; 3]; 3];
        for b in 0..beads.nbeads() {
            cache.scratch.reset();
            self.field.compute(beads.bead_q(b), cell, &mut cache.scratch)?;
            if cache.scratch.f.len() != ndof {
                return Err(ForceError::ShapeMismatch {
                    component: self.name.clone(),
                    expected: ndof,
                    found: cache.scratch.f.len(),
                });
            }
            cache.f[b * ndof..(b + 1) * ndof].copy_from_slice(&cache.scratch.f);
            cache.pot += cache.scratch.pot;
            for (acc, row) in cache.virial.iter_mut().zip(&cache.scratch.virial) {
                for (a, v) in acc.iter_mut().zip(row) {
                    *a += v;
                }
            }
        }
        cache.q.clear();
        cache.q.extend_from_slice(beads.q());
        cache.h = *cell.h();
        cache.valid = true;
        Ok(())
    }
}

impl std::fmt::Debug for ForceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceComponent")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("mts_level", &self.mts_level)
            .finish()
    }
}

/// Weighted sum of force components acting on one system.
///
/// An empty aggregate is valid and produces zero force and energy; the
/// bias of a system without a bias potential is an empty `Forces`.
#[derive(Debug, Default)]
pub struct Forces {
    components: IndexMap<String, ForceComponent>,
    total: Vec<f64>,
    level: Vec<f64>,
}

impl Forces {
    /// An aggregate with no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component. Names must be unique.
    pub fn add(&mut self, component: ForceComponent) -> Result<(), ConfigError> {
        if self.components.contains_key(&component.name) {
            return Err(ConfigError::DuplicateComponent {
                name: component.name,
            });
        }
        self.components.insert(component.name.clone(), component);
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, component: ForceComponent) -> Result<Self, ConfigError> {
        self.add(component)?;
        Ok(self)
    }

    /// Whether no components are registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Registered components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = &ForceComponent> {
        self.components.values()
    }

    /// Number of MTS levels: highest component level + 1, or 1 if empty.
    pub fn nmts_levels(&self) -> usize {
        self.components
            .values()
            .map(|c| c.mts_level + 1)
            .max()
            .unwrap_or(1)
    }

    /// Call `start()` on every component.
    pub fn start(&mut self) -> Result<(), ForceError> {
        for c in self.components.values_mut() {
            c.field.start().map_err(|e| match e {
                ForceError::StartFailed { .. } => e,
                other => ForceError::StartFailed {
                    component: c.name.clone(),
                    reason: other.to_string(),
                },
            })?;
        }
        Ok(())
    }

    /// Call `stop()` on every component.
    pub fn stop(&mut self) {
        for c in self.components.values_mut() {
            c.field.stop();
        }
    }

    /// Weighted forces from every component, bead-major.
    pub fn forces(&mut self, beads: &Beads, cell: &Cell) -> Result<&[f64], ForceError> {
        Self::accumulate(&mut self.components, &mut self.total, beads, cell, None)?;
        Ok(&self.total)
    }

    /// Weighted forces from the components at `level` only.
    pub fn level_forces(
        &mut self,
        level: usize,
        beads: &Beads,
        cell: &Cell,
    ) -> Result<&[f64], ForceError> {
        Self::accumulate(&mut self.components, &mut self.level, beads, cell, Some(level))?;
        Ok(&self.level)
    }

    fn accumulate(
        components: &mut IndexMap<String, ForceComponent>,
        out: &mut Vec<f64>,
        beads: &Beads,
        cell: &Cell,
        level: Option<usize>,
    ) -> Result<(), ForceError> {
        out.clear();
        out.resize(beads.q().len(), 0.0);
        for c in components.values_mut() {
            if level.is_some_and(|l| l != c.mts_level) {
                continue;
            }
            c.refresh(beads, cell)?;
            let w = c.weight;
            for (o, f) in out.iter_mut().zip(&c.cache.f) {
                *o += w * f;
            }
        }
        Ok(())
    }

    /// Weighted potential energy summed over replicas.
    pub fn pot(&mut self, beads: &Beads, cell: &Cell) -> Result<f64, ForceError> {
        let mut pot = 0.0;
        for c in self.components.values_mut() {
            c.refresh(beads, cell)?;
            pot += c.weight * c.cache.pot;
        }
        Ok(pot)
    }

    /// Weighted virial tensor summed over replicas.
    pub fn virial(&mut self, beads: &Beads, cell: &Cell) -> Result<Matrix3, ForceError> {
        let mut vir = [[0.0; 3]; 3];
        for c in self.components.values_mut() {
            c.refresh(beads, cell)?;
            for (acc, row) in vir.iter_mut().zip(&c.cache.virial) {
                for (a, v) in acc.iter_mut().zip(row) {
                    *a += c.weight * v;
                }
            }
        }
        Ok(vir)
    }
}
