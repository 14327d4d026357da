//! Simulation cell.
//!
//! The cell is an upper-triangular box matrix `h` whose columns are the
//! lattice vectors. Barostat-bearing ensembles propagate it together with
//! the centroid; every other ensemble leaves it alone.

use crate::error::ConfigError;

/// Row-major 3×3 matrix.
pub type Matrix3 = [[f64; 3]; 3];

/// Identity matrix.
pub const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Periodic simulation box.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    h: Matrix3,
}

impl Cell {
    /// Build a cell from an upper-triangular matrix with positive volume.
    pub fn new(h: Matrix3) -> Result<Self, ConfigError> {
        if h[1][0] != 0.0 || h[2][0] != 0.0 || h[2][1] != 0.0 {
            return Err(ConfigError::InvalidCell {
                reason: "box matrix must be upper-triangular".to_string(),
            });
        }
        if h.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidCell {
                reason: "box matrix has non-finite entries".to_string(),
            });
        }
        let cell = Self { h };
        if cell.volume() <= 0.0 {
            return Err(ConfigError::InvalidCell {
                reason: format!("volume must be positive, got {}", cell.volume()),
            });
        }
        Ok(cell)
    }

    /// Orthorhombic box with side lengths `a`, `b`, `c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, ConfigError> {
        Self::new([[a, 0.0, 0.0], [0.0, b, 0.0], [0.0, 0.0, c]])
    }

    /// The box matrix.
    pub fn h(&self) -> &Matrix3 {
        &self.h
    }

    /// Overwrite the box matrix without validation.
    ///
    /// Used by integrators and replay, which only ever produce matrices
    /// derived from a valid one.
    pub fn set_h(&mut self, h: Matrix3) {
        self.h = h;
    }

    /// Multiply every entry of the box matrix by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for row in self.h.iter_mut() {
            for v in row.iter_mut() {
                *v *= factor;
            }
        }
    }

    /// Cell volume (product of the diagonal for an upper-triangular box).
    pub fn volume(&self) -> f64 {
        self.h[0][0] * self.h[1][1] * self.h[2][2]
    }

    /// Minimum-image displacement for a separation vector `d`.
    pub fn minimum_image(&self, d: [f64; 3]) -> [f64; 3] {
        let h = &self.h;
        // Back-substitution: s = h⁻¹ d for upper-triangular h.
        let mut s = [0.0; 3];
        s[2] = d[2] / h[2][2];
        s[1] = (d[1] - h[1][2] * s[2]) / h[1][1];
        s[0] = (d[0] - h[0][1] * s[1] - h[0][2] * s[2]) / h[0][0];
        for v in s.iter_mut() {
            *v -= v.round();
        }
        [
            h[0][0] * s[0] + h[0][1] * s[1] + h[0][2] * s[2],
            h[1][1] * s[1] + h[1][2] * s[2],
            h[2][2] * s[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthorhombic_volume() {
        let cell = Cell::orthorhombic(2.0, 3.0, 4.0).unwrap();
        assert_eq!(cell.volume(), 24.0);
    }

    #[test]
    fn lower_triangle_rejected() {
        let h = [[1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(Cell::new(h), Err(ConfigError::InvalidCell { .. })));
    }

    #[test]
    fn negative_volume_rejected() {
        assert!(Cell::orthorhombic(-1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn scale_scales_volume_cubically() {
        let mut cell = Cell::orthorhombic(1.0, 1.0, 1.0).unwrap();
        cell.scale(2.0);
        assert_eq!(cell.volume(), 8.0);
    }

    #[test]
    fn minimum_image_wraps_into_box() {
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let d = cell.minimum_image([9.0, -6.0, 4.0]);
        assert!((d[0] + 1.0).abs() < 1e-12);
        assert!((d[1] - 4.0).abs() < 1e-12);
        assert!((d[2] - 4.0).abs() < 1e-12);
    }
}
