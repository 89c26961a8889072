use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Four-component native library version (`arch.major.minor.fix`).
///
/// Ordering is lexicographic over the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeVersion(pub u32, pub u32, pub u32, pub u32);

impl NativeVersion {
    /// First release whose procedural nodes may be instanced and destroyed
    /// independently of their instances.
    pub const INSTANCEABLE_PROCEDURALS: NativeVersion = NativeVersion(5, 0, 1, 4);

    #[must_use]
    pub const fn new(arch: u32, major: u32, minor: u32, fix: u32) -> Self {
        Self(arch, major, minor, fix)
    }
}

impl Default for NativeVersion {
    fn default() -> Self {
        Self(7, 1, 0, 0)
    }
}

impl fmt::Display for NativeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0, self.1, self.2, self.3)
    }
}

impl FromStr for NativeVersion {
    type Err = std::num::ParseIntError;

    /// Missing trailing components read as zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0_u32; 4];
        for (slot, token) in parts.iter_mut().zip(s.trim().split('.')) {
            *slot = token.parse()?;
        }
        Ok(Self(parts[0], parts[1], parts[2], parts[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_is_lexicographic() {
        assert!(NativeVersion::new(5, 0, 1, 3) < NativeVersion::INSTANCEABLE_PROCEDURALS);
        assert!(NativeVersion::new(5, 0, 2, 0) > NativeVersion::INSTANCEABLE_PROCEDURALS);
        assert!(NativeVersion::new(4, 9, 9, 9) < NativeVersion::INSTANCEABLE_PROCEDURALS);
    }

    #[test]
    fn parses_partial_versions() {
        assert_eq!("5.0.1.4".parse(), Ok(NativeVersion::new(5, 0, 1, 4)));
        assert_eq!("6.2".parse(), Ok(NativeVersion::new(6, 2, 0, 0)));
        assert!("x.1".parse::<NativeVersion>().is_err());
    }
}
