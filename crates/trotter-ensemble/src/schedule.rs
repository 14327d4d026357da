//! Multiple-time-step schedule.
//!
//! The nested MTS splitting is compiled once, at bind time, into a flat list
//! of [`MtsOp`]s. Level 0 is the outermost (slowest) force level; each level
//! `l` is subdivided `factors[l]` times inside the level above it. With
//! `α_l = Π_{i≤l} factors[i]`, one pass at level `l` is
//!
//! ```text
//! kick_l(dt / 2α_l)  [level l+1 pass | drift(dt / α_l)]  kick_l(dt / 2α_l)
//! ```
//!
//! repeated `factors[l]` times. The innermost level drifts.

use trotter_core::ConfigError;

/// One operation of a compiled MTS step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MtsOp {
    /// Momentum kick by the forces of one level, followed by the constraints.
    Kick {
        /// Force level.
        level: usize,
        /// Kick duration.
        h: f64,
    },
    /// Centroid drift plus exact free ring-polymer propagation.
    Drift {
        /// Drift duration.
        h: f64,
    },
}

/// A validated and flattened MTS step.
#[derive(Clone, Debug, PartialEq)]
pub struct MtsSchedule {
    factors: Vec<usize>,
    inmts: usize,
    dt: f64,
    ops: Vec<MtsOp>,
}

impl MtsSchedule {
    /// Validate `factors` against `nlevels` force levels and flatten the
    /// splitting for an outer step of `dt`.
    pub fn compile(dt: f64, factors: &[usize], nlevels: usize) -> Result<Self, ConfigError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidTimestep { value: dt });
        }
        if factors.is_empty() {
            return Err(ConfigError::MalformedMtsFactors {
                reason: "no factors given".to_string(),
            });
        }
        if let Some(level) = factors.iter().position(|&f| f == 0) {
            return Err(ConfigError::MalformedMtsFactors {
                reason: format!("factor for level {level} is zero"),
            });
        }
        if factors.len() != nlevels {
            return Err(ConfigError::MtsLevelMismatch {
                factors: factors.len(),
                levels: nlevels,
            });
        }

        let inmts = factors.iter().try_fold(1usize, |acc, &f| acc.checked_mul(f));
        let inmts = inmts.ok_or_else(|| ConfigError::MalformedMtsFactors {
            reason: "product of factors overflows".to_string(),
        })?;

        let mut ops = Vec::new();
        flatten(dt, factors, 0, 1, &mut ops);
        Ok(Self {
            factors: factors.to_vec(),
            inmts,
            dt,
            ops,
        })
    }

    /// The all-ones schedule for `nlevels` levels.
    pub fn uniform(dt: f64, nlevels: usize) -> Result<Self, ConfigError> {
        Self::compile(dt, &vec![1; nlevels.max(1)], nlevels.max(1))
    }

    /// Per-level subdivision factors.
    pub fn factors(&self) -> &[usize] {
        &self.factors
    }

    /// Product of all factors: the number of innermost drifts per step.
    pub fn inmts(&self) -> usize {
        self.inmts
    }

    /// Duration of one innermost drift, `dt / inmts`.
    pub fn deltat(&self) -> f64 {
        self.dt / self.inmts as f64
    }

    /// The flattened operation list for one outer step.
    pub fn ops(&self) -> &[MtsOp] {
        &self.ops
    }
}

fn flatten(dt: f64, factors: &[usize], level: usize, alpha: usize, ops: &mut Vec<MtsOp>) {
    let alpha = alpha * factors[level];
    let a = alpha as f64;
    for _ in 0..factors[level] {
        ops.push(MtsOp::Kick {
            level,
            h: dt / (2.0 * a),
        });
        if level + 1 == factors.len() {
            ops.push(MtsOp::Drift { h: dt / a });
        } else {
            flatten(dt, factors, level + 1, alpha, ops);
        }
        ops.push(MtsOp::Kick {
            level,
            h: dt / (2.0 * a),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drifts(s: &MtsSchedule) -> Vec<f64> {
        s.ops()
            .iter()
            .filter_map(|op| match op {
                MtsOp::Drift { h } => Some(*h),
                MtsOp::Kick { .. } => None,
            })
            .collect()
    }

    #[test]
    fn single_level_is_velocity_verlet() {
        let s = MtsSchedule::compile(0.5, &[1], 1).unwrap();
        assert_eq!(
            s.ops(),
            &[
                MtsOp::Kick { level: 0, h: 0.25 },
                MtsOp::Drift { h: 0.5 },
                MtsOp::Kick { level: 0, h: 0.25 },
            ]
        );
        assert_eq!(s.inmts(), 1);
        assert_eq!(s.deltat(), 0.5);
    }

    #[test]
    fn two_levels_nest() {
        let s = MtsSchedule::compile(1.0, &[1, 2], 2).unwrap();
        assert_eq!(
            s.ops(),
            &[
                MtsOp::Kick { level: 0, h: 0.5 },
                MtsOp::Kick { level: 1, h: 0.25 },
                MtsOp::Drift { h: 0.5 },
                MtsOp::Kick { level: 1, h: 0.25 },
                MtsOp::Kick { level: 1, h: 0.25 },
                MtsOp::Drift { h: 0.5 },
                MtsOp::Kick { level: 1, h: 0.25 },
                MtsOp::Kick { level: 0, h: 0.5 },
            ]
        );
    }

    #[test]
    fn drift_count_and_length() {
        let s = MtsSchedule::compile(3.0, &[2, 3], 2).unwrap();
        let d = drifts(&s);
        assert_eq!(d.len(), 6);
        assert!(d.iter().all(|&h| h == 0.5));
        assert_eq!(s.deltat(), 0.5);
        let total: f64 = d.iter().sum();
        assert!((total - 3.0).abs() < 1e-12);
    }

    #[test]
    fn kicks_per_level_cover_the_step() {
        let s = MtsSchedule::compile(1.0, &[2, 2, 3], 3).unwrap();
        for level in 0..3 {
            let total: f64 = s
                .ops()
                .iter()
                .filter_map(|op| match op {
                    MtsOp::Kick { level: l, h } if *l == level => Some(*h),
                    _ => None,
                })
                .sum();
            assert!((total - 1.0).abs() < 1e-12, "level {level}: {total}");
        }
    }

    #[test]
    fn rejects_malformed_factors() {
        assert!(matches!(
            MtsSchedule::compile(1.0, &[], 1),
            Err(ConfigError::MalformedMtsFactors { .. })
        ));
        assert!(matches!(
            MtsSchedule::compile(1.0, &[1, 0], 2),
            Err(ConfigError::MalformedMtsFactors { .. })
        ));
        assert!(matches!(
            MtsSchedule::compile(1.0, &[1, 2], 3),
            Err(ConfigError::MtsLevelMismatch {
                factors: 2,
                levels: 3
            })
        ));
    }

    #[test]
    fn uniform_has_one_drift() {
        let s = MtsSchedule::uniform(2.0, 3).unwrap();
        assert_eq!(s.factors(), &[1, 1, 1]);
        assert_eq!(drifts(&s), vec![2.0]);
    }
}
