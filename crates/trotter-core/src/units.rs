//! Length units accepted from external trajectory sources.
//!
//! Internally everything is in atomic units (bohr). Sources tag their
//! frames with a [`LengthUnit`]; the replay ensemble multiplies by
//! [`LengthUnit::to_internal`] before writing positions.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Bohr radius in angstrom.
const BOHR_IN_ANGSTROM: f64 = 0.52917721;

/// A length unit understood by the trajectory readers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    /// Bohr (the internal unit).
    #[default]
    AtomicUnit,
    /// 1e-10 m.
    Angstrom,
    /// 1e-9 m.
    Nanometer,
    /// 1e-12 m.
    Picometer,
}

impl LengthUnit {
    /// Multiplicative factor converting a length in `self` to bohr.
    pub fn to_internal(self) -> f64 {
        match self {
            Self::AtomicUnit => 1.0,
            Self::Angstrom => 1.0 / BOHR_IN_ANGSTROM,
            Self::Nanometer => 10.0 / BOHR_IN_ANGSTROM,
            Self::Picometer => 0.01 / BOHR_IN_ANGSTROM,
        }
    }

    /// Stable one-byte tag used by the binary trajectory codec.
    pub fn tag(self) -> u8 {
        match self {
            Self::AtomicUnit => 0,
            Self::Angstrom => 1,
            Self::Nanometer => 2,
            Self::Picometer => 3,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::AtomicUnit),
            1 => Some(Self::Angstrom),
            2 => Some(Self::Nanometer),
            3 => Some(Self::Picometer),
            _ => None,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AtomicUnit => "atomic_unit",
            Self::Angstrom => "angstrom",
            Self::Nanometer => "nanometer",
            Self::Picometer => "picometer",
        };
        f.write_str(name)
    }
}

impl FromStr for LengthUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "atomic_unit" | "bohr" => Ok(Self::AtomicUnit),
            "angstrom" => Ok(Self::Angstrom),
            "nanometer" => Ok(Self::Nanometer),
            "picometer" => Ok(Self::Picometer),
            other => Err(ConfigError::InvalidParameter {
                name: "units",
                reason: format!("unknown length unit '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_unit_is_identity() {
        assert_eq!(LengthUnit::AtomicUnit.to_internal(), 1.0);
    }

    #[test]
    fn angstrom_converts_to_bohr() {
        let f = LengthUnit::Angstrom.to_internal();
        assert!((f - 1.8897261).abs() < 1e-6);
    }

    #[test]
    fn nanometer_is_ten_angstrom() {
        let ratio = LengthUnit::Nanometer.to_internal() / LengthUnit::Angstrom.to_internal();
        assert!((ratio - 10.0).abs() < 1e-12);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("bohr".parse::<LengthUnit>(), Ok(LengthUnit::AtomicUnit));
        assert_eq!("Angstrom".parse::<LengthUnit>(), Ok(LengthUnit::Angstrom));
        assert!("furlong".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn tags_roundtrip() {
        for unit in [
            LengthUnit::AtomicUnit,
            LengthUnit::Angstrom,
            LengthUnit::Nanometer,
            LengthUnit::Picometer,
        ] {
            assert_eq!(LengthUnit::from_tag(unit.tag()), Some(unit));
        }
        assert_eq!(LengthUnit::from_tag(9), None);
    }
}
