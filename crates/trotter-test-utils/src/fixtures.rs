//! Reusable force-field fixtures.
//!
//! - [`ConstantForce`]: the same force on every degree of freedom.
//! - [`SpringForce`]: harmonic well about the origin, with a call counter.
//! - [`FailingForce`]: errors once a budget of evaluations is spent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trotter_core::{Cell, ForceError, ForceField, ForceOutput};

/// Uniform force `f` on every coordinate, `V = −f Σ q`.
pub struct ConstantForce {
    pub name: String,
    pub force: f64,
}

impl ConstantForce {
    pub fn new(name: impl Into<String>, force: f64) -> Self {
        Self {
            name: name.into(),
            force,
        }
    }
}

impl ForceField for ConstantForce {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(
        &mut self,
        q: &[f64],
        _cell: &Cell,
        out: &mut ForceOutput,
    ) -> Result<(), ForceError> {
        out.f.fill(self.force);
        out.pot = -self.force * q.iter().sum::<f64>();
        Ok(())
    }
}

/// `V = ½ k Σ q²`, counting how often it is evaluated.
///
/// The counter is shared, so a clone of [`calls`](Self::calls) taken before
/// the field is boxed keeps reporting after the field is moved away.
pub struct SpringForce {
    pub name: String,
    pub k: f64,
    calls: Arc<AtomicUsize>,
}

impl SpringForce {
    pub fn new(name: impl Into<String>, k: f64) -> Self {
        Self {
            name: name.into(),
            k,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the evaluation counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ForceField for SpringForce {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(
        &mut self,
        q: &[f64],
        _cell: &Cell,
        out: &mut ForceOutput,
    ) -> Result<(), ForceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        for (f, x) in out.f.iter_mut().zip(q) {
            *f = -self.k * x;
            out.pot += 0.5 * self.k * x * x;
        }
        for (atom, fa) in out.f.chunks_exact(3).enumerate() {
            for i in 0..3 {
                for j in 0..3 {
                    out.virial[i][j] += q[3 * atom + i] * fa[j];
                }
            }
        }
        Ok(())
    }
}

/// Zero force for the first `succeed_count` bead evaluations, then an
/// [`ForceError::EvaluationFailed`] on every call after that.
pub struct FailingForce {
    pub name: String,
    pub succeed_count: usize,
    calls: Arc<AtomicUsize>,
}

impl FailingForce {
    pub fn new(name: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ForceField for FailingForce {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(
        &mut self,
        _q: &[f64],
        _cell: &Cell,
        out: &mut ForceOutput,
    ) -> Result<(), ForceError> {
        let evaluated = self.calls.fetch_add(1, Ordering::Relaxed);
        if evaluated >= self.succeed_count {
            return Err(ForceError::EvaluationFailed {
                component: self.name.clone(),
                reason: format!("bead evaluation {} past the limit", evaluated + 1),
            });
        }
        out.f.fill(0.0);
        Ok(())
    }
}
