//! Package version parsing and ordering.
//!
//! Package authors write versions like `1.0`, `v3.5.1` or `2.0.0-beta`.
//! These are normalised into [`semver::Version`] for ordering while the
//! original spelling is kept for display and persistence.

use crate::{PackageError, Result};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A comparable package version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    raw: String,
    parsed: Version,
}

impl PackageVersion {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || PackageError::InvalidVersion {
            version: raw.to_string(),
        };

        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let (core, postfix) = match trimmed.split_once('-') {
            Some((core, postfix)) => (core, Some(postfix)),
            None => (trimmed, None),
        };

        let mut parts = core
            .split('.')
            .map(|p| p.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }
        parts.resize(3, 0);

        let mut normalized = format!("{}.{}.{}", parts[0], parts[1], parts[2]);
        if let Some(postfix) = postfix {
            normalized.push('-');
            normalized.push_str(postfix);
        }

        let parsed = Version::parse(&normalized).map_err(|_| invalid())?;
        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    /// Original spelling.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn semver(&self) -> &Version {
        &self.parsed
    }
}

impl FromStr for PackageVersion {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn test_short_versions_are_zero_filled() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("2"), v("2.0.0"));
        assert_eq!(v("1.0").as_str(), "1.0");
    }

    #[test]
    fn test_ordering() {
        assert!(v("2.0.0") > v("1.9.9"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("v3.5.1") > v("3.5.0"));
        assert!(v("2.0.0-beta") < v("2.0.0"));
    }

    #[test]
    fn test_invalid_versions() {
        for bad in ["", "v", "abc", "1.2.3.4", "1..2", "1.x"] {
            assert!(
                matches!(
                    PackageVersion::parse(bad),
                    Err(PackageError::InvalidVersion { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
