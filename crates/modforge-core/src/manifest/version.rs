use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::manifest::error::RangeError;

/// Comparison operator of a single range comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl RangeOp {
    /// Whether `candidate` satisfies this operator against `bound`.
    ///
    /// Ordering comes from `semver::Version`, so a version without a
    /// pre-release tag compares greater than the same version with one.
    pub fn holds(self, candidate: &Version, bound: &Version) -> bool {
        match self {
            RangeOp::Eq => candidate == bound,
            RangeOp::Gt => candidate > bound,
            RangeOp::Ge => candidate >= bound,
            RangeOp::Lt => candidate < bound,
            RangeOp::Le => candidate <= bound,
        }
    }

}

/// A conjunction of version comparators, e.g. `">=1.0.0 <2.0.0"`.
///
/// Every comparator must hold for a version to satisfy the range. The empty
/// range is satisfied by any version. Contradictory bounds (`">=2.0.0
/// <1.0.0"`) are not a parse error; the range simply never matches, which
/// surfaces later as a missing-dependency diagnostic.
#[derive(Debug, Clone)]
pub struct VersionRange {
    /// The original constraint string, kept for display.
    constraint: String,
    comparators: Vec<(RangeOp, Version)>,
}

impl VersionRange {
    /// The range satisfied by any version.
    pub fn any() -> Self {
        Self {
            constraint: String::new(),
            comparators: Vec::new(),
        }
    }

    /// Parses a constraint string. Comparators are separated by whitespace
    /// and/or commas; a bare version is shorthand for `=version`.
    pub fn parse(constraint: &str) -> Result<Self, RangeError> {
        let mut comparators = Vec::new();
        for token in constraint
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            comparators.push(parse_comparator(token)?);
        }
        Ok(Self {
            constraint: constraint.trim().to_string(),
            comparators,
        })
    }

    /// Checks whether `version` satisfies every comparator of this range.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.comparators
            .iter()
            .all(|(op, bound)| op.holds(version, bound))
    }

    pub fn is_any(&self) -> bool {
        self.comparators.is_empty()
    }

    /// The original constraint string.
    pub fn constraint_str(&self) -> &str {
        &self.constraint
    }

    pub fn comparators(&self) -> &[(RangeOp, Version)] {
        &self.comparators
    }
}

fn parse_comparator(token: &str) -> Result<(RangeOp, Version), RangeError> {
    let (op, rest) = if let Some(rest) = token.strip_prefix(">=") {
        (RangeOp::Ge, rest)
    } else if let Some(rest) = token.strip_prefix("<=") {
        (RangeOp::Le, rest)
    } else if let Some(rest) = token.strip_prefix('>') {
        (RangeOp::Gt, rest)
    } else if let Some(rest) = token.strip_prefix('<') {
        (RangeOp::Lt, rest)
    } else if let Some(rest) = token.strip_prefix('=') {
        (RangeOp::Eq, rest)
    } else {
        (RangeOp::Eq, token)
    };

    if rest.is_empty() {
        return Err(RangeError::MissingVersion {
            token: token.to_string(),
        });
    }

    let version = Version::parse(rest).map_err(|source| RangeError::InvalidVersion {
        token: token.to_string(),
        source,
    })?;
    Ok((op, version))
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        // Whitespace and comma placement do not matter, only the comparators.
        self.comparators == other.comparators
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comparators.is_empty() {
            write!(f, "*")
        } else {
            write!(f, "{}", self.constraint)
        }
    }
}

impl FromStr for VersionRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.constraint)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionRange::parse(&raw).map_err(serde::de::Error::custom)
    }
}
